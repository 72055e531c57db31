//! Text-search gateway.
//!
//! The FTS5 index is an optional accelerator. Its failures are reported as
//! [`IndexOutcome::Unavailable`] so callers branch on them explicitly; only an expired deadline
//! surfaces as an error, and it never triggers a fallback.

pub mod ranking;

use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
	BhubService, BoxFuture, Error, ListItem, Result,
	list::Pagination,
	search::ranking::score::{self, Boosts, ScoredResult},
};
use bhub_domain::query::SanitizedQuery;
use bhub_storage::{
	models::IndexHit,
	queries::{ArticleFilter, ArticleOrder},
};

#[derive(Debug, Clone, PartialEq)]
pub enum IndexOutcome {
	/// Best match first.
	Matched(Vec<IndexHit>),
	Empty,
	Unavailable { reason: String },
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RankedSearchRequest {
	pub q: String,
	pub category_id: Option<i64>,
	pub boost_recent: Option<bool>,
	pub boost_impact: Option<bool>,
	pub page: Option<u32>,
	pub page_size: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RankedItem {
	pub final_score: f64,
	#[serde(flatten)]
	pub article: ListItem,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RankedSearchResponse {
	pub items: Vec<RankedItem>,
	/// Scored candidates, capped by `search.candidate_limit`.
	pub total: u64,
	pub page: u32,
	pub page_size: u32,
	pub total_pages: u64,
}

impl BhubService {
	/// Queries the index in native relevance order. An empty query never reaches the index.
	pub async fn search(
		&self,
		sanitized: &SanitizedQuery,
		limit: u32,
		offset: u64,
	) -> Result<IndexOutcome> {
		if sanitized.is_empty() {
			return Ok(IndexOutcome::Empty);
		}

		let expression = sanitized.expression();
		let result = self
			.bounded("text index query", self.backends.index.query(&expression, limit, offset))
			.await?;

		match result {
			Ok(hits) if hits.is_empty() => Ok(IndexOutcome::Empty),
			Ok(hits) => Ok(IndexOutcome::Matched(hits)),
			Err(err) => {
				warn!(error = %err, "Text index query failed.");

				Ok(IndexOutcome::Unavailable { reason: err.to_string() })
			},
		}
	}

	/// Blended relevance over at most `search.candidate_limit` published matches.
	///
	/// `category_id` is a hard predicate. An unavailable index yields no results.
	pub async fn search_ranked(
		&self,
		sanitized: &SanitizedQuery,
		limit: u32,
		offset: u64,
		category_id: Option<i64>,
		boosts: Boosts,
		now: OffsetDateTime,
	) -> Result<Vec<ScoredResult>> {
		let ranked = self.rank_candidates(sanitized, category_id, boosts, now).await?;

		Ok(page_of(ranked, limit, offset))
	}

	/// Conjunctive substring match against the record store. Record-store errors are fatal.
	pub async fn search_fallback(
		&self,
		raw_terms: &[String],
		limit: u32,
		offset: u64,
		category_id: Option<i64>,
	) -> Result<Vec<i64>> {
		if raw_terms.is_empty() {
			return Ok(Vec::new());
		}

		let ids = self
			.backends
			.records
			.search_substring(raw_terms, category_id, limit, offset)
			.await?;

		debug!(terms = raw_terms.len(), matches = ids.len(), "Substring fallback finished.");

		Ok(ids)
	}

	pub async fn ranked_search(&self, req: RankedSearchRequest) -> Result<RankedSearchResponse> {
		self.ranked_search_at(req, OffsetDateTime::now_utc()).await
	}

	pub async fn ranked_search_at(
		&self,
		req: RankedSearchRequest,
		now: OffsetDateTime,
	) -> Result<RankedSearchResponse> {
		let pagination = Pagination::resolve(&self.cfg.listing, req.page, req.page_size)?;

		if req.q.trim().is_empty() {
			return Err(Error::invalid("q must not be empty."));
		}

		let boosts = Boosts {
			recent: req.boost_recent.unwrap_or(true),
			impact: req.boost_impact.unwrap_or(true),
		};
		let sanitized = self.sanitizer.sanitize(&req.q);
		let ranked = self.rank_candidates(&sanitized, req.category_id, boosts, now).await?;
		let total = ranked.len() as u64;
		let page = page_of(ranked, pagination.page_size, pagination.offset());
		let items = if page.is_empty() { Vec::new() } else { self.hydrate(&page).await? };

		Ok(RankedSearchResponse {
			items,
			total,
			page: pagination.page,
			page_size: pagination.page_size,
			total_pages: pagination.total_pages(total),
		})
	}

	async fn rank_candidates(
		&self,
		sanitized: &SanitizedQuery,
		category_id: Option<i64>,
		boosts: Boosts,
		now: OffsetDateTime,
	) -> Result<Vec<ScoredResult>> {
		if sanitized.is_empty() {
			return Ok(Vec::new());
		}

		let expression = sanitized.expression();
		let result = self
			.bounded(
				"ranked text index query",
				self.backends.index.ranking_candidates(
					&expression,
					category_id,
					self.cfg.search.candidate_limit,
				),
			)
			.await?;
		let candidates = match result {
			Ok(candidates) => candidates,
			Err(err) => {
				warn!(error = %err, "Ranked text index query failed.");

				return Ok(Vec::new());
			},
		};

		debug!(candidates = candidates.len(), ?boosts, "Scoring ranked candidates.");

		Ok(score::rank(&candidates, boosts, now))
	}

	async fn hydrate(&self, page: &[ScoredResult]) -> Result<Vec<RankedItem>> {
		let ids = page.iter().map(|item| item.article_id).collect::<Vec<_>>();
		let scores =
			page.iter().map(|item| (item.article_id, item.final_score)).collect::<HashMap<_, _>>();
		let filter = ArticleFilter { ids: Some(ids.clone()), ..Default::default() };
		let order = ArticleOrder::Relevance(ids);
		let limit = u32::try_from(page.len()).unwrap_or(u32::MAX);
		let records = self.backends.records.fetch(&filter, &order, limit, 0).await?;

		Ok(records
			.into_iter()
			.filter_map(|record| {
				let final_score = *scores.get(&record.id)?;

				Some(RankedItem { final_score, article: ListItem::from(record) })
			})
			.collect())
	}

	async fn bounded<T>(
		&self,
		operation: &'static str,
		fut: BoxFuture<'_, bhub_storage::Result<T>>,
	) -> Result<bhub_storage::Result<T>> {
		let timeout = self.index_timeout();

		tokio::time::timeout(timeout, fut).await.map_err(|_| {
			warn!(operation, timeout_ms = timeout.as_millis() as u64, "Text index deadline expired.");

			Error::Timeout { operation }
		})
	}
}

fn page_of(ranked: Vec<ScoredResult>, limit: u32, offset: u64) -> Vec<ScoredResult> {
	let skip = usize::try_from(offset).unwrap_or(usize::MAX);

	ranked.into_iter().skip(skip).take(limit as usize).collect()
}
