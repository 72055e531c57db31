use axum::{
	Json, Router,
	extract::{Query, State, rejection::QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state::AppState;
use bhub_service::{
	Error as ServiceError, ListRequest, ListResponse, RankedSearchRequest, RankedSearchResponse,
	RebuildReport, SearchStats, SuggestionsRequest, time_serde,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/articles", get(list_articles))
		.route("/v1/search/ranked", get(ranked_search))
		.route("/v1/search/suggestions", get(suggestions))
		.route("/v1/search/stats", get(search_stats))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/v1/admin/search/rebuild", post(rebuild_index)).with_state(state)
}

/// Query string of `GET /v1/articles`. `category_id` takes a comma-separated list.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArticlesQuery {
	search: Option<String>,
	category_id: Option<String>,
	feed_id: Option<i64>,
	highlighted: Option<bool>,
	has_pdf: Option<bool>,
	date_from: Option<String>,
	date_to: Option<String>,
	author: Option<String>,
	source_category: Option<String>,
	page: Option<u32>,
	page_size: Option<u32>,
	sort_by: Option<String>,
	sort_order: Option<String>,
	strategy: Option<String>,
}
impl ArticlesQuery {
	fn into_request(self) -> Result<ListRequest, ApiError> {
		Ok(ListRequest {
			search: self.search,
			category_ids: parse_id_list(self.category_id.as_deref())?,
			feed_id: self.feed_id,
			highlighted: self.highlighted,
			has_pdf: self.has_pdf,
			date_from: parse_date("date_from", self.date_from.as_deref())?,
			date_to: parse_date("date_to", self.date_to.as_deref())?,
			author: self.author,
			source_category: self.source_category,
			page: self.page,
			page_size: self.page_size,
			sort_by: self.sort_by,
			sort_order: self.sort_order,
			strategy: self.strategy,
		})
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_articles(
	State(state): State<AppState>,
	query: Result<Query<ArticlesQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
	let Query(query) = query.map_err(query_rejection)?;
	let response = state.service.list(query.into_request()?).await?;

	Ok(Json(response))
}

async fn ranked_search(
	State(state): State<AppState>,
	query: Result<Query<RankedSearchRequest>, QueryRejection>,
) -> Result<Json<RankedSearchResponse>, ApiError> {
	let Query(query) = query.map_err(query_rejection)?;
	let response = state.service.ranked_search(query).await?;

	Ok(Json(response))
}

async fn suggestions(
	State(state): State<AppState>,
	query: Result<Query<SuggestionsRequest>, QueryRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
	let Query(query) = query.map_err(query_rejection)?;
	let response = state.service.suggestions(query).await?;

	Ok(Json(response.suggestions))
}

async fn search_stats(State(state): State<AppState>) -> Json<SearchStats> {
	Json(state.service.search_stats().await)
}

async fn rebuild_index(State(state): State<AppState>) -> Result<Json<RebuildReport>, ApiError> {
	let response = state.service.rebuild_index().await?;

	Ok(Json(response))
}

fn parse_id_list(raw: Option<&str>) -> Result<Vec<i64>, ApiError> {
	let Some(raw) = raw else { return Ok(Vec::new()) };

	raw.split(',')
		.map(str::trim)
		.filter(|part| !part.is_empty())
		.map(|part| {
			part.parse::<i64>().map_err(|_| {
				json_error(
					StatusCode::BAD_REQUEST,
					"invalid_request",
					format!("category_id must be a comma-separated list of integers, got {part:?}."),
					Some(vec!["category_id".to_string()]),
				)
			})
		})
		.collect()
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<OffsetDateTime>, ApiError> {
	match raw.map(str::trim) {
		None | Some("") => Ok(None),
		Some(raw) => time_serde::parse(raw).map(Some).map_err(|message| {
			json_error(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				message,
				Some(vec![field.to_string()]),
			)
		}),
	}
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text(), None)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::Timeout { operation } => json_error(
				StatusCode::GATEWAY_TIMEOUT,
				"timeout",
				format!("Timed out waiting for {operation}."),
				None,
			),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage request failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"storage_error",
					"Internal storage error.",
					None,
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
