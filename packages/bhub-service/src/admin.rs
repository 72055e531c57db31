use tracing::{info, warn};

use crate::{BhubService, Result};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchStats {
	pub indexed_articles: u64,
	pub fts_available: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RebuildReport {
	pub indexed_articles: u64,
}

impl BhubService {
	/// Reports on the index without ever failing; an unreachable index reads as unavailable.
	pub async fn search_stats(&self) -> SearchStats {
		let counted =
			tokio::time::timeout(self.index_timeout(), self.backends.index.indexed_count()).await;

		match counted {
			Ok(Ok(indexed_articles)) => SearchStats { indexed_articles, fts_available: true },
			Ok(Err(err)) => {
				warn!(error = %err, "Text index is unavailable.");

				SearchStats { indexed_articles: 0, fts_available: false }
			},
			Err(_) => {
				warn!("Text index did not answer within the deadline.");

				SearchStats { indexed_articles: 0, fts_available: false }
			},
		}
	}

	/// Rebuilds the index from the record store. Only reachable from the admin surface.
	pub async fn rebuild_index(&self) -> Result<RebuildReport> {
		self.backends.index.rebuild().await?;

		let indexed_articles = self.backends.index.indexed_count().await?;

		info!(indexed_articles, "Text index rebuilt.");

		Ok(RebuildReport { indexed_articles })
	}
}
