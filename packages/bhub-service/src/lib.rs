pub mod admin;
pub mod list;
pub mod search;
pub mod suggestions;
pub mod time_serde;

mod error;

pub use admin::{RebuildReport, SearchStats};
pub use error::{Error, Result};
pub use list::{ListItem, ListRequest, ListResponse, ListStrategy};
pub use search::{
	IndexOutcome, RankedItem, RankedSearchRequest, RankedSearchResponse,
	ranking::{
		interleave::{SourceKey, interleave},
		score::{Boosts, ScoredResult},
	},
};
pub use suggestions::{SuggestionsRequest, SuggestionsResponse};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use bhub_config::Config;
use bhub_domain::query::QuerySanitizer;
use bhub_storage::{
	db::Db,
	fts,
	models::{ArticleRecord, IndexHit, RankingCandidate},
	queries::{self, ArticleFilter, ArticleOrder},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The full-text index. Implementations receive sanitized expressions only.
pub trait TextIndex
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		expression: &'a str,
		limit: u32,
		offset: u64,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<IndexHit>>>;

	fn ranking_candidates<'a>(
		&'a self,
		expression: &'a str,
		category_id: Option<i64>,
		limit: u32,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<RankingCandidate>>>;

	fn rebuild(&self) -> BoxFuture<'_, bhub_storage::Result<()>>;

	fn indexed_count(&self) -> BoxFuture<'_, bhub_storage::Result<u64>>;
}

/// The persisted article records. Only published records are ever returned.
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		filter: &'a ArticleFilter,
		order: &'a ArticleOrder,
		limit: u32,
		offset: u64,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<ArticleRecord>>>;

	fn count<'a>(&'a self, filter: &'a ArticleFilter) -> BoxFuture<'a, bhub_storage::Result<u64>>;

	fn search_substring<'a>(
		&'a self,
		terms: &'a [String],
		category_id: Option<i64>,
		limit: u32,
		offset: u64,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<i64>>>;

	fn titles_containing<'a>(
		&'a self,
		fragment: &'a str,
		limit: u32,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<String>>>;

	fn category_names_containing<'a>(
		&'a self,
		fragment: &'a str,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<String>>>;
}

#[derive(Clone)]
pub struct Backends {
	pub index: Arc<dyn TextIndex>,
	pub records: Arc<dyn RecordStore>,
}
impl Backends {
	pub fn new(index: Arc<dyn TextIndex>, records: Arc<dyn RecordStore>) -> Self {
		Self { index, records }
	}

	/// Both collaborators served by one SQLite database.
	pub fn sqlite(db: Db) -> Self {
		let backend = Arc::new(SqliteBackend { db });

		Self { index: backend.clone(), records: backend }
	}
}

pub struct BhubService {
	pub cfg: Config,
	pub sanitizer: QuerySanitizer,
	pub backends: Backends,
}
impl BhubService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_backends(cfg, Backends::sqlite(db))
	}

	pub fn with_backends(cfg: Config, backends: Backends) -> Self {
		let sanitizer = QuerySanitizer::from_config(&cfg.search);

		Self { cfg, sanitizer, backends }
	}

	pub(crate) fn index_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.search.index_timeout_ms)
	}
}

struct SqliteBackend {
	db: Db,
}

impl TextIndex for SqliteBackend {
	fn query<'a>(
		&'a self,
		expression: &'a str,
		limit: u32,
		offset: u64,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<IndexHit>>> {
		Box::pin(fts::query(&self.db, expression, limit, offset))
	}

	fn ranking_candidates<'a>(
		&'a self,
		expression: &'a str,
		category_id: Option<i64>,
		limit: u32,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<RankingCandidate>>> {
		Box::pin(fts::ranking_candidates(&self.db, expression, category_id, limit))
	}

	fn rebuild(&self) -> BoxFuture<'_, bhub_storage::Result<()>> {
		Box::pin(fts::rebuild(&self.db))
	}

	fn indexed_count(&self) -> BoxFuture<'_, bhub_storage::Result<u64>> {
		Box::pin(fts::indexed_count(&self.db))
	}
}

impl RecordStore for SqliteBackend {
	fn fetch<'a>(
		&'a self,
		filter: &'a ArticleFilter,
		order: &'a ArticleOrder,
		limit: u32,
		offset: u64,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<ArticleRecord>>> {
		Box::pin(queries::fetch_articles(&self.db, filter, order, limit, offset))
	}

	fn count<'a>(&'a self, filter: &'a ArticleFilter) -> BoxFuture<'a, bhub_storage::Result<u64>> {
		Box::pin(queries::count_articles(&self.db, filter))
	}

	fn search_substring<'a>(
		&'a self,
		terms: &'a [String],
		category_id: Option<i64>,
		limit: u32,
		offset: u64,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<i64>>> {
		Box::pin(queries::search_substring(&self.db, terms, category_id, limit, offset))
	}

	fn titles_containing<'a>(
		&'a self,
		fragment: &'a str,
		limit: u32,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<String>>> {
		Box::pin(queries::titles_containing(&self.db, fragment, limit))
	}

	fn category_names_containing<'a>(
		&'a self,
		fragment: &'a str,
	) -> BoxFuture<'a, bhub_storage::Result<Vec<String>>> {
		Box::pin(queries::category_names_containing(&self.db, fragment))
	}
}
