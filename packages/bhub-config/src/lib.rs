mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Listing, ListingInterleave, Search, Security, Service, Sqlite, Storage};

use std::{fs, net::SocketAddr, path::Path};

/// Search id-sets become bound `IN (...)` lists, which SQLite caps at 32766 variables.
pub const MAX_CANDIDATE_LIMIT: u32 = 10_000;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("service.log_level", &cfg.service.log_level),
		("storage.sqlite.dsn", &cfg.storage.sqlite.dsn),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if let Ok(admin_addr) = cfg.service.admin_bind.parse::<SocketAddr>()
		&& !admin_addr.ip().is_loopback()
	{
		return Err(Error::Validation {
			message: "service.admin_bind must be a loopback address.".to_string(),
		});
	}
	if cfg.storage.sqlite.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.sqlite.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.search.candidate_limit == 0 || cfg.search.candidate_limit > MAX_CANDIDATE_LIMIT {
		return Err(Error::Validation {
			message: format!("search.candidate_limit must be between 1 and {MAX_CANDIDATE_LIMIT}."),
		});
	}
	if cfg.search.index_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.index_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.extra_reserved_terms.iter().any(|term| term.trim().is_empty()) {
		return Err(Error::Validation {
			message: "search.extra_reserved_terms must not contain blank entries.".to_string(),
		});
	}
	if cfg.listing.default_page_size == 0 {
		return Err(Error::Validation {
			message: "listing.default_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.listing.default_page_size > cfg.listing.max_page_size {
		return Err(Error::Validation {
			message: "listing.default_page_size must not exceed listing.max_page_size.".to_string(),
		});
	}
	if cfg.listing.interleave.max_consecutive == 0 {
		return Err(Error::Validation {
			message: "listing.interleave.max_consecutive must be greater than zero.".to_string(),
		});
	}
	if cfg.listing.interleave.overfetch_factor == 0 {
		return Err(Error::Validation {
			message: "listing.interleave.overfetch_factor must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	for term in &mut cfg.search.extra_reserved_terms {
		*term = term.trim().to_uppercase();
	}

	cfg.search.extra_reserved_terms.sort();
	cfg.search.extra_reserved_terms.dedup();
}
