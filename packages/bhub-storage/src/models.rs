use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRecord {
	pub id: i64,
	pub title: String,
	pub r#abstract: Option<String>,
	pub keywords: Option<String>,
	pub publication_date: Option<OffsetDateTime>,
	pub journal_name: Option<String>,
	pub category_id: Option<i64>,
	pub feed_id: Option<i64>,
	pub source_type: String,
	pub impact_score: f64,
	pub highlighted: bool,
	pub is_published: bool,
	pub pdf_file_path: Option<String>,
	pub view_count: i64,
	pub created_at: OffsetDateTime,
}
impl ArticleRecord {
	pub fn has_pdf(&self) -> bool {
		self.pdf_file_path.as_deref().map(|path| !path.is_empty()).unwrap_or(false)
	}

	pub fn source_category(&self) -> SourceCategory {
		if matches!(self.source_type.as_str(), "PDF" | "MANUAL") || self.journal_name.is_some() {
			SourceCategory::Journal
		} else {
			SourceCategory::Portal
		}
	}
}

#[derive(Debug, Clone)]
pub struct NewArticle {
	pub title: String,
	pub r#abstract: Option<String>,
	pub keywords: Option<String>,
	pub publication_date: Option<OffsetDateTime>,
	pub journal_name: Option<String>,
	pub category_id: Option<i64>,
	pub feed_id: Option<i64>,
	pub source_type: String,
	pub impact_score: f64,
	pub highlighted: bool,
	pub is_published: bool,
	pub pdf_file_path: Option<String>,
	pub created_at: OffsetDateTime,
}

/// One FTS5 match in native bm25 order. Lower `relevance` is a better match.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct IndexHit {
	pub article_id: i64,
	pub relevance: f64,
}

/// An FTS5 match joined with the record attributes the ranking boosts read.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankingCandidate {
	pub article_id: i64,
	pub relevance: f64,
	pub highlighted: bool,
	pub publication_date: Option<OffsetDateTime>,
	pub impact_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCategory {
	/// PDF or manual uploads, or anything attributed to a journal.
	Journal,
	/// RSS or scraped portal content without a journal.
	Portal,
}
impl SourceCategory {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Journal => "journal",
			Self::Portal => "portal",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"journal" => Some(Self::Journal),
			"portal" => Some(Self::Portal),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
	PublicationDate,
	Title,
	ImpactScore,
	ViewCount,
	CreatedAt,
}
impl SortField {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"publication_date" => Some(Self::PublicationDate),
			"title" => Some(Self::Title),
			"impact_score" => Some(Self::ImpactScore),
			"view_count" => Some(Self::ViewCount),
			"created_at" => Some(Self::CreatedAt),
			_ => None,
		}
	}

	/// Timestamps are stored as RFC 3339 text with a variable-length fraction, so they sort by
	/// `julianday` rather than lexically.
	pub fn sort_expression(self) -> &'static str {
		match self {
			Self::PublicationDate => "julianday(a.publication_date)",
			Self::Title => "a.title",
			Self::ImpactScore => "a.impact_score",
			Self::ViewCount => "a.view_count",
			Self::CreatedAt => "julianday(a.created_at)",
		}
	}
}
