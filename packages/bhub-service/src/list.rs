use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
	BhubService, Error, IndexOutcome, Result,
	search::ranking::interleave::{SourceKey, interleave},
};
use bhub_domain::query;
use bhub_storage::{
	models::{ArticleRecord, SortField, SourceCategory},
	queries::{ArticleFilter, ArticleOrder},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListStrategy {
	#[default]
	Default,
	/// Over-fetches and caps same-source runs within the page.
	Interleaved,
}
impl ListStrategy {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"default" => Some(Self::Default),
			"interleaved" => Some(Self::Interleaved),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ListRequest {
	pub search: Option<String>,
	pub category_ids: Vec<i64>,
	pub feed_id: Option<i64>,
	pub highlighted: Option<bool>,
	pub has_pdf: Option<bool>,
	#[serde(with = "crate::time_serde::option")]
	pub date_from: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde::option")]
	pub date_to: Option<OffsetDateTime>,
	pub author: Option<String>,
	pub source_category: Option<String>,
	pub page: Option<u32>,
	pub page_size: Option<u32>,
	pub sort_by: Option<String>,
	pub sort_order: Option<String>,
	pub strategy: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ListItem {
	pub id: i64,
	pub title: String,
	pub r#abstract: Option<String>,
	pub keywords: Option<String>,
	#[serde(with = "crate::time_serde::option")]
	pub publication_date: Option<OffsetDateTime>,
	pub journal_name: Option<String>,
	pub category_id: Option<i64>,
	pub feed_id: Option<i64>,
	pub source_type: String,
	pub source_category: String,
	pub impact_score: f64,
	pub highlighted: bool,
	pub has_pdf: bool,
	pub view_count: i64,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<ArticleRecord> for ListItem {
	fn from(record: ArticleRecord) -> Self {
		let has_pdf = record.has_pdf();
		let source_category = record.source_category().as_str().to_string();

		Self {
			id: record.id,
			title: record.title,
			r#abstract: record.r#abstract,
			keywords: record.keywords,
			publication_date: record.publication_date,
			journal_name: record.journal_name,
			category_id: record.category_id,
			feed_id: record.feed_id,
			source_type: record.source_type,
			source_category,
			impact_score: record.impact_score,
			highlighted: record.highlighted,
			has_pdf,
			view_count: record.view_count,
			created_at: record.created_at,
		}
	}
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ListResponse {
	pub items: Vec<ListItem>,
	pub total: u64,
	pub page: u32,
	pub page_size: u32,
	pub total_pages: u64,
}
impl ListResponse {
	fn new(items: Vec<ListItem>, total: u64, page: &Pagination) -> Self {
		Self {
			items,
			total,
			page: page.page,
			page_size: page.page_size,
			total_pages: page.total_pages(total),
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pagination {
	pub(crate) page: u32,
	pub(crate) page_size: u32,
}
impl Pagination {
	pub(crate) fn resolve(
		cfg: &bhub_config::Listing,
		page: Option<u32>,
		page_size: Option<u32>,
	) -> Result<Self> {
		let page = page.unwrap_or(1);
		let page_size = page_size.unwrap_or(cfg.default_page_size);

		if page == 0 {
			return Err(Error::invalid("page must be at least 1."));
		}
		if page_size == 0 || page_size > cfg.max_page_size {
			return Err(Error::invalid(format!(
				"page_size must be between 1 and {}.",
				cfg.max_page_size
			)));
		}

		Ok(Self { page, page_size })
	}

	pub(crate) fn offset(&self) -> u64 {
		u64::from(self.page - 1) * u64::from(self.page_size)
	}

	pub(crate) fn total_pages(&self, total: u64) -> u64 {
		total.div_ceil(u64::from(self.page_size))
	}
}

struct ListPlan {
	filter: ArticleFilter,
	search: Option<String>,
	order: ArticleOrder,
	strategy: ListStrategy,
	pagination: Pagination,
}

impl BhubService {
	pub async fn list(&self, req: ListRequest) -> Result<ListResponse> {
		let mut plan = self.plan_list(req)?;

		if let Some(raw) = plan.search.take() {
			let ids = self.resolve_search_ids(&raw).await?;

			if ids.is_empty() {
				return Ok(ListResponse::new(Vec::new(), 0, &plan.pagination));
			}

			plan.filter.ids = Some(ids.clone());
			plan.order = ArticleOrder::Relevance(ids);
		}

		let records = &self.backends.records;
		let total = records.count(&plan.filter).await?;
		let page_size = plan.pagination.page_size;
		let fetch_limit = match plan.strategy {
			ListStrategy::Default => page_size,
			ListStrategy::Interleaved =>
				page_size.saturating_mul(self.cfg.listing.interleave.overfetch_factor),
		};
		let mut rows = records
			.fetch(&plan.filter, &plan.order, fetch_limit, plan.pagination.offset())
			.await?;

		if plan.strategy == ListStrategy::Interleaved {
			rows = interleave(
				rows,
				self.cfg.listing.interleave.max_consecutive as usize,
				page_size as usize,
				SourceKey::of_article,
			);
		}

		let items = rows.into_iter().map(ListItem::from).collect();

		Ok(ListResponse::new(items, total, &plan.pagination))
	}

	/// Text index first, substring fallback when it has nothing to offer.
	async fn resolve_search_ids(&self, raw: &str) -> Result<Vec<i64>> {
		let limit = self.cfg.search.candidate_limit;
		let sanitized = self.sanitizer.sanitize(raw);

		match self.search(&sanitized, limit, 0).await? {
			IndexOutcome::Matched(hits) =>
				return Ok(hits.into_iter().map(|hit| hit.article_id).collect()),
			IndexOutcome::Empty => {
				debug!(terms = sanitized.len(), "Text index returned no matches.");
			},
			IndexOutcome::Unavailable { reason } => {
				warn!(%reason, "Falling back to substring search.");
			},
		}

		self.search_fallback(&query::fallback_terms(raw), limit, 0, None).await
	}

	fn plan_list(&self, req: ListRequest) -> Result<ListPlan> {
		let pagination = Pagination::resolve(&self.cfg.listing, req.page, req.page_size)?;
		let field = match req.sort_by.as_deref().map(str::trim) {
			None | Some("") => SortField::PublicationDate,
			Some(raw) => SortField::parse(raw).ok_or_else(|| {
				Error::invalid(
					"sort_by must be one of publication_date, title, impact_score, view_count, created_at.",
				)
			})?,
		};
		let descending = match req.sort_order.as_deref().map(str::trim) {
			None | Some("") | Some("desc") => true,
			Some("asc") => false,
			Some(_) => return Err(Error::invalid("sort_order must be asc or desc.")),
		};
		let strategy = match req.strategy.as_deref().map(str::trim) {
			None | Some("") => ListStrategy::Default,
			Some(raw) => ListStrategy::parse(raw)
				.ok_or_else(|| Error::invalid("strategy must be default or interleaved."))?,
		};
		let source_category = match req.source_category.as_deref().map(str::trim) {
			None | Some("") => None,
			Some(raw) => Some(
				SourceCategory::parse(raw)
					.ok_or_else(|| Error::invalid("source_category must be journal or portal."))?,
			),
		};

		let search = non_blank(req.search);

		if search.as_ref().is_some_and(|search| search.chars().count() < query::MIN_TERM_CHARS) {
			return Err(Error::invalid(format!(
				"search must be at least {} characters.",
				query::MIN_TERM_CHARS
			)));
		}
		if let (Some(from), Some(to)) = (req.date_from, req.date_to)
			&& from > to
		{
			return Err(Error::invalid("date_from must not be after date_to."));
		}

		let filter = ArticleFilter {
			ids: None,
			category_ids: req.category_ids,
			feed_id: req.feed_id,
			highlighted: req.highlighted,
			has_pdf: req.has_pdf,
			date_from: req.date_from,
			date_to: req.date_to,
			author: non_blank(req.author),
			source_category,
		};

		Ok(ListPlan {
			filter,
			search,
			order: ArticleOrder::Field { field, descending },
			strategy,
			pagination,
		})
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
	use super::Pagination;

	#[test]
	fn pagination_bounds_and_offsets() {
		let cfg = bhub_config::Listing::default();
		let page = Pagination::resolve(&cfg, Some(3), Some(20)).expect("Valid pagination.");

		assert_eq!(page.offset(), 40);
		assert_eq!(page.total_pages(41), 3);
		assert_eq!(page.total_pages(0), 0);
		assert!(Pagination::resolve(&cfg, Some(0), None).is_err());
		assert!(Pagination::resolve(&cfg, None, Some(0)).is_err());
		assert!(Pagination::resolve(&cfg, None, Some(cfg.max_page_size + 1)).is_err());
		assert_eq!(
			Pagination::resolve(&cfg, None, None).expect("Defaults are valid.").page_size,
			cfg.default_page_size
		);
	}
}
