use sqlx::{QueryBuilder, Sqlite};
use time::{OffsetDateTime, UtcOffset};

use crate::{
	Error, Result,
	db::Db,
	models::{ArticleRecord, NewArticle, SortField, SourceCategory},
};

const ARTICLE_COLUMNS: &str = "\
a.id, a.title, a.abstract, a.keywords, a.publication_date, a.journal_name, a.category_id, \
a.feed_id, a.source_type, a.impact_score, a.highlighted, a.is_published, a.pdf_file_path, \
a.view_count, a.created_at";

/// Record-store predicate. Unpublished articles are never visible regardless of the fields set.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
	/// Restricts the result to this id-set when present.
	pub ids: Option<Vec<i64>>,
	pub category_ids: Vec<i64>,
	pub feed_id: Option<i64>,
	pub highlighted: Option<bool>,
	pub has_pdf: Option<bool>,
	pub date_from: Option<OffsetDateTime>,
	pub date_to: Option<OffsetDateTime>,
	/// Case-insensitive substring over linked author names.
	pub author: Option<String>,
	pub source_category: Option<SourceCategory>,
}

#[derive(Debug, Clone)]
pub enum ArticleOrder {
	/// Keeps the given id order, typically a text-search relevance order.
	Relevance(Vec<i64>),
	Field { field: SortField, descending: bool },
}

pub async fn fetch_articles(
	db: &Db,
	filter: &ArticleFilter,
	order: &ArticleOrder,
	limit: u32,
	offset: u64,
) -> Result<Vec<ArticleRecord>> {
	let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");

	builder.push(ARTICLE_COLUMNS);
	builder.push(" FROM articles a WHERE a.is_published = 1");

	push_filter(&mut builder, filter);
	push_order(&mut builder, order);

	builder.push(" LIMIT ");
	builder.push_bind(i64::from(limit));
	builder.push(" OFFSET ");
	builder.push_bind(offset_to_i64(offset)?);

	let rows = builder.build_query_as::<ArticleRecord>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn count_articles(db: &Db, filter: &ArticleFilter) -> Result<u64> {
	let mut builder =
		QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles a WHERE a.is_published = 1");

	push_filter(&mut builder, filter);

	let total = builder.build_query_scalar::<i64>().fetch_one(&db.pool).await?;

	Ok(u64::try_from(total).unwrap_or(0))
}

/// Conjunctive, case-insensitive substring match over title, abstract and keywords.
///
/// Matching runs against `folded_text`, so case folding covers every letter `str::to_lowercase`
/// folds and not only ASCII.
///
/// Ordered by `highlighted DESC, publication_date DESC, id DESC` so that pages are stable for
/// identical inputs.
pub async fn search_substring(
	db: &Db,
	terms: &[String],
	category_id: Option<i64>,
	limit: u32,
	offset: u64,
) -> Result<Vec<i64>> {
	let mut builder =
		QueryBuilder::<Sqlite>::new("SELECT a.id FROM articles a WHERE a.is_published = 1");

	for term in terms {
		builder.push(" AND a.folded_text LIKE ");
		builder.push_bind(like_pattern(&fold_case(term)));
		builder.push(" ESCAPE '\\'");
	}

	if let Some(category_id) = category_id {
		builder.push(" AND a.category_id = ");
		builder.push_bind(category_id);
	}

	builder.push(
		" ORDER BY a.highlighted DESC, julianday(a.publication_date) DESC, a.id DESC LIMIT ",
	);
	builder.push_bind(i64::from(limit));
	builder.push(" OFFSET ");
	builder.push_bind(offset_to_i64(offset)?);

	let ids = builder.build_query_scalar::<i64>().fetch_all(&db.pool).await?;

	Ok(ids)
}

pub async fn titles_containing(db: &Db, fragment: &str, limit: u32) -> Result<Vec<String>> {
	let titles = sqlx::query_scalar::<_, String>(
		"\
SELECT DISTINCT title
FROM articles
WHERE is_published = 1
	AND folded_title LIKE $1 ESCAPE '\\'
ORDER BY title
LIMIT $2",
	)
	.bind(like_pattern(&fold_case(fragment)))
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(titles)
}

pub async fn category_names_containing(db: &Db, fragment: &str) -> Result<Vec<String>> {
	let names = sqlx::query_scalar::<_, String>(
		"\
SELECT name
FROM categories
WHERE folded_name LIKE $1 ESCAPE '\\'
ORDER BY name",
	)
	.bind(like_pattern(&fold_case(fragment)))
	.fetch_all(&db.pool)
	.await?;

	Ok(names)
}

pub async fn insert_category(db: &Db, name: &str, slug: &str) -> Result<i64> {
	let id = sqlx::query_scalar::<_, i64>(
		"INSERT INTO categories (name, slug, folded_name) VALUES ($1, $2, $3) RETURNING id",
	)
	.bind(name)
	.bind(slug)
	.bind(fold_case(name))
	.fetch_one(&db.pool)
	.await?;

	Ok(id)
}

pub async fn insert_feed(db: &Db, name: &str, url: &str) -> Result<i64> {
	let id =
		sqlx::query_scalar::<_, i64>("INSERT INTO feeds (name, url) VALUES ($1, $2) RETURNING id")
			.bind(name)
			.bind(url)
			.fetch_one(&db.pool)
			.await?;

	Ok(id)
}

pub async fn insert_article(db: &Db, article: &NewArticle) -> Result<i64> {
	if !(1.0..=10.0).contains(&article.impact_score) {
		return Err(Error::InvalidArgument(
			"impact_score must be in the range 1.0-10.0.".to_string(),
		));
	}

	let id = sqlx::query_scalar::<_, i64>(
		"\
INSERT INTO articles (
	title,
	abstract,
	keywords,
	publication_date,
	journal_name,
	category_id,
	feed_id,
	source_type,
	impact_score,
	highlighted,
	is_published,
	pdf_file_path,
	created_at,
	folded_title,
	folded_text
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
RETURNING id",
	)
	.bind(article.title.as_str())
	.bind(article.r#abstract.as_deref())
	.bind(article.keywords.as_deref())
	.bind(article.publication_date.map(to_utc))
	.bind(article.journal_name.as_deref())
	.bind(article.category_id)
	.bind(article.feed_id)
	.bind(article.source_type.as_str())
	.bind(article.impact_score)
	.bind(article.highlighted)
	.bind(article.is_published)
	.bind(article.pdf_file_path.as_deref())
	.bind(to_utc(article.created_at))
	.bind(fold_case(&article.title))
	.bind(folded_text(article))
	.fetch_one(&db.pool)
	.await?;

	Ok(id)
}

pub async fn attach_author(db: &Db, article_id: i64, name: &str) -> Result<()> {
	let mut tx = db.pool.begin().await?;

	sqlx::query(
		"INSERT INTO authors (name, folded_name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
	)
	.bind(name)
	.bind(fold_case(name))
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"\
INSERT INTO article_authors (article_id, author_id)
SELECT $1, id FROM authors WHERE name = $2
ON CONFLICT DO NOTHING",
	)
	.bind(article_id)
	.bind(name)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

/// Unicode lowercase, applied to stored shadow columns and to the patterns matched against them.
pub fn fold_case(text: &str) -> String {
	text.to_lowercase()
}

/// Wraps a raw term in `%` after escaping `LIKE` metacharacters for `ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
	let mut out = String::with_capacity(term.len() + 2);

	out.push('%');

	for ch in term.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('%');

	out
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ArticleFilter) {
	if let Some(ids) = filter.ids.as_ref() {
		if ids.is_empty() {
			builder.push(" AND 0");
		} else {
			builder.push(" AND a.id IN (");

			let mut separated = builder.separated(", ");

			for id in ids {
				separated.push_bind(*id);
			}

			separated.push_unseparated(")");
		}
	}
	if !filter.category_ids.is_empty() {
		builder.push(" AND a.category_id IN (");

		let mut separated = builder.separated(", ");

		for id in &filter.category_ids {
			separated.push_bind(*id);
		}

		separated.push_unseparated(")");
	}
	if let Some(feed_id) = filter.feed_id {
		builder.push(" AND a.feed_id = ");
		builder.push_bind(feed_id);
	}
	if let Some(highlighted) = filter.highlighted {
		builder.push(" AND a.highlighted = ");
		builder.push_bind(highlighted);
	}

	match filter.has_pdf {
		Some(true) => {
			builder.push(" AND a.pdf_file_path IS NOT NULL AND a.pdf_file_path != ''");
		},
		Some(false) => {
			builder.push(" AND (a.pdf_file_path IS NULL OR a.pdf_file_path = '')");
		},
		None => {},
	}

	if let Some(date_from) = filter.date_from {
		builder.push(" AND julianday(a.publication_date) >= julianday(");
		builder.push_bind(to_utc(date_from));
		builder.push(")");
	}
	if let Some(date_to) = filter.date_to {
		builder.push(" AND julianday(a.publication_date) <= julianday(");
		builder.push_bind(to_utc(date_to));
		builder.push(")");
	}
	if let Some(author) = filter.author.as_ref() {
		builder.push(
			" AND EXISTS (SELECT 1 FROM article_authors aa JOIN authors au ON au.id = aa.author_id \
			 WHERE aa.article_id = a.id AND au.folded_name LIKE ",
		);
		builder.push_bind(like_pattern(&fold_case(author)));
		builder.push(" ESCAPE '\\')");
	}

	match filter.source_category {
		Some(SourceCategory::Journal) => {
			builder.push(
				" AND (a.source_type IN ('PDF', 'MANUAL') OR a.journal_name IS NOT NULL)",
			);
		},
		Some(SourceCategory::Portal) => {
			builder.push(
				" AND a.source_type IN ('RSS', 'SCRAPING') AND a.journal_name IS NULL",
			);
		},
		None => {},
	}
}

fn push_order(builder: &mut QueryBuilder<'_, Sqlite>, order: &ArticleOrder) {
	match order {
		ArticleOrder::Relevance(ids) => {
			// Position of ",<id>," inside ",id1,id2,...," grows with the id's rank.
			let mut positions = String::from(",");

			for id in ids {
				positions.push_str(&id.to_string());
				positions.push(',');
			}

			builder.push(" ORDER BY instr(");
			builder.push_bind(positions);
			builder.push(", ',' || a.id || ','), a.id");
		},
		ArticleOrder::Field { field, descending } => {
			let direction = if *descending { "DESC" } else { "ASC" };

			builder.push(" ORDER BY a.highlighted DESC, ");
			builder.push(field.sort_expression());
			builder.push(" ");
			builder.push(direction);
			builder.push(", a.id DESC");
		},
	}
}

/// Title, abstract and keywords joined by `\n`, which whitespace-split search terms never contain.
fn folded_text(article: &NewArticle) -> String {
	[Some(article.title.as_str()), article.r#abstract.as_deref(), article.keywords.as_deref()]
		.into_iter()
		.flatten()
		.map(fold_case)
		.collect::<Vec<_>>()
		.join("\n")
}

fn offset_to_i64(offset: u64) -> Result<i64> {
	i64::try_from(offset).map_err(|_| Error::InvalidArgument("offset is too large.".to_string()))
}

fn to_utc(value: OffsetDateTime) -> OffsetDateTime {
	value.to_offset(UtcOffset::UTC)
}
