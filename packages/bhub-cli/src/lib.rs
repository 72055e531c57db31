//! Command-line scaffolding shared by the binaries.

use std::path::PathBuf;

use clap::{
	Args,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

const FALLBACK_FILTER: &str = "info";

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
	/// TOML configuration file.
	#[arg(long, short = 'c', value_name = "FILE", env = "BHUB_CONFIG")]
	pub config: PathBuf,
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Builds the log filter from a configured level or directive list, falling back to `info`.
pub fn log_filter(level: &str) -> EnvFilter {
	EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

pub fn init_tracing(level: &str) -> color_eyre::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(log_filter(level))
		.try_init()
		.map_err(|err| eyre::eyre!("Failed to install the tracing subscriber: {err}."))
}
