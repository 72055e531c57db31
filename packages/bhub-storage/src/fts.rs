//! FTS5 index access. Expressions passed here must already be sanitized.

use crate::{
	Error, Result,
	db::Db,
	models::{IndexHit, RankingCandidate},
};

/// Matches `expression` in native bm25 order, best match first.
pub async fn query(db: &Db, expression: &str, limit: u32, offset: u64) -> Result<Vec<IndexHit>> {
	let offset = i64::try_from(offset)
		.map_err(|_| Error::InvalidArgument("offset is too large.".to_string()))?;
	let hits = sqlx::query_as::<_, IndexHit>(
		"\
SELECT rowid AS article_id, bm25(articles_fts) AS relevance
FROM articles_fts
WHERE articles_fts MATCH $1
ORDER BY relevance, rowid
LIMIT $2 OFFSET $3",
	)
	.bind(expression)
	.bind(i64::from(limit))
	.bind(offset)
	.fetch_all(&db.pool)
	.await?;

	Ok(hits)
}

/// Published matches joined with the attributes the ranking boosts read.
///
/// Column weights favor the title over the abstract over the keywords.
pub async fn ranking_candidates(
	db: &Db,
	expression: &str,
	category_id: Option<i64>,
	limit: u32,
) -> Result<Vec<RankingCandidate>> {
	let candidates = sqlx::query_as::<_, RankingCandidate>(
		"\
SELECT
	a.id AS article_id,
	bm25(articles_fts, 2.0, 1.0, 0.5) AS relevance,
	a.highlighted,
	a.publication_date,
	a.impact_score
FROM articles_fts
JOIN articles a ON a.id = articles_fts.rowid
WHERE articles_fts MATCH $1
	AND a.is_published = 1
	AND ($2 IS NULL OR a.category_id = $2)
ORDER BY relevance, a.id
LIMIT $3",
	)
	.bind(expression)
	.bind(category_id)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(candidates)
}

/// Rebuilds the external-content index from `articles`.
pub async fn rebuild(db: &Db) -> Result<()> {
	sqlx::query("INSERT INTO articles_fts(articles_fts) VALUES('rebuild')")
		.execute(&db.pool)
		.await?;

	Ok(())
}

/// Documents present in the index itself, which can lag `articles` until a rebuild.
pub async fn indexed_count(db: &Db) -> Result<u64> {
	let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles_fts_docsize")
		.fetch_one(&db.pool)
		.await?;

	Ok(u64::try_from(count).unwrap_or(0))
}
