use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub listing: Listing,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub sqlite: Sqlite,
}

#[derive(Debug, Deserialize)]
pub struct Sqlite {
	/// A `sqlite://` URL. `?mode=rwc` creates the file when it does not exist.
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Upper bound on the id-set pulled from the text index or the substring fallback.
	pub candidate_limit: u32,
	pub index_timeout_ms: u64,
	/// Extra terms dropped by the query sanitizer on top of the built-in FTS5 operators.
	pub extra_reserved_terms: Vec<String>,
}
impl Default for Search {
	fn default() -> Self {
		Self { candidate_limit: 1_000, index_timeout_ms: 2_000, extra_reserved_terms: Vec::new() }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Listing {
	pub default_page_size: u32,
	pub max_page_size: u32,
	pub interleave: ListingInterleave,
}
impl Default for Listing {
	fn default() -> Self {
		Self { default_page_size: 20, max_page_size: 100, interleave: ListingInterleave::default() }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListingInterleave {
	pub max_consecutive: u32,
	pub overfetch_factor: u32,
}
impl Default for ListingInterleave {
	fn default() -> Self {
		Self { max_consecutive: 2, overfetch_factor: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}
