//! Query sanitation for the FTS5 text index.
//!
//! Raw user input never reaches the index as query syntax. It is reduced to a bounded list of
//! whitelisted terms and each term is emitted as a quoted prefix literal.

use std::collections::HashSet;

pub const MAX_QUERY_CHARS: usize = 200;
pub const MAX_QUERY_TERMS: usize = 10;
pub const MIN_TERM_CHARS: usize = 2;
pub const MAX_TERM_CHARS: usize = 50;
pub const MIN_SUGGESTION_CHARS: usize = 2;

/// FTS5 boolean operators plus the administrative commands of an FTS5 table.
pub const DEFAULT_RESERVED_TERMS: [&str; 7] =
	["AND", "OR", "NOT", "MATCH", "NEAR", "REBUILD", "DELETE"];

/// Ordered, conjunctive list of validated terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedQuery {
	terms: Vec<String>,
}
impl SanitizedQuery {
	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	pub fn len(&self) -> usize {
		self.terms.len()
	}

	/// Unquoted term text, in input order.
	pub fn terms(&self) -> &[String] {
		&self.terms
	}

	/// FTS5 expression: every term quoted, prefix-marked and joined by the implicit AND.
	pub fn expression(&self) -> String {
		let mut out = String::new();

		for (idx, term) in self.terms.iter().enumerate() {
			if idx > 0 {
				out.push(' ');
			}

			out.push('"');
			out.push_str(&term.replace('"', "\"\""));
			out.push_str("\"*");
		}

		out
	}
}

#[derive(Debug, Clone)]
pub struct QuerySanitizer {
	reserved: HashSet<String>,
}
impl QuerySanitizer {
	/// Builds a sanitizer that drops every term in `reserved`, compared case-insensitively.
	pub fn new<I, S>(reserved: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let reserved = reserved
			.into_iter()
			.map(|term| term.as_ref().trim().to_uppercase())
			.filter(|term| !term.is_empty())
			.collect();

		Self { reserved }
	}

	pub fn from_config(cfg: &bhub_config::Search) -> Self {
		Self::new(
			DEFAULT_RESERVED_TERMS
				.iter()
				.copied()
				.chain(cfg.extra_reserved_terms.iter().map(String::as_str)),
		)
	}

	pub fn is_reserved(&self, term: &str) -> bool {
		self.reserved.contains(&term.to_uppercase())
	}

	pub fn sanitize(&self, raw: &str) -> SanitizedQuery {
		let cleaned = collapse_whitespace(&whitelist(truncate_chars(raw, MAX_QUERY_CHARS)));
		let mut terms = Vec::new();

		for token in cleaned
			.split(' ')
			.filter(|token| !token.is_empty() && !self.is_reserved(token))
			.take(MAX_QUERY_TERMS)
		{
			let term: String = token.chars().filter(|ch| is_term_char(*ch)).collect();
			let len = term.chars().count();

			if (MIN_TERM_CHARS..=MAX_TERM_CHARS).contains(&len) {
				terms.push(term);
			}
		}

		SanitizedQuery { terms }
	}
}
impl Default for QuerySanitizer {
	fn default() -> Self {
		Self::new(DEFAULT_RESERVED_TERMS)
	}
}

/// Whitespace-separated terms for the substring fallback, bounded like the FTS5 path.
pub fn fallback_terms(raw: &str) -> Vec<String> {
	truncate_chars(raw, MAX_QUERY_CHARS)
		.split_whitespace()
		.take(MAX_QUERY_TERMS)
		.map(str::to_string)
		.collect()
}

/// Cleans a partial suggestion term. Returns `None` when fewer than two characters survive.
pub fn suggestion_fragment(raw: &str) -> Option<String> {
	let cleaned = collapse_whitespace(&whitelist(truncate_chars(raw, MAX_QUERY_CHARS)));

	(cleaned.chars().count() >= MIN_SUGGESTION_CHARS).then_some(cleaned)
}

pub fn is_term_char(ch: char) -> bool {
	ch.is_ascii_alphanumeric() || is_accented_latin(ch)
}

fn is_accented_latin(ch: char) -> bool {
	matches!(ch, '\u{00C0}'..='\u{017F}') && !matches!(ch, '\u{00D7}' | '\u{00F7}')
}

fn truncate_chars(raw: &str, max_chars: usize) -> &str {
	match raw.char_indices().nth(max_chars) {
		Some((byte_idx, _)) => &raw[..byte_idx],
		None => raw,
	}
}

fn whitelist(raw: &str) -> String {
	raw.chars().filter(|ch| is_term_char(*ch) || ch.is_whitespace()).collect()
}

fn collapse_whitespace(raw: &str) -> String {
	raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	use super::truncate_chars;

	#[test]
	fn truncation_counts_characters_not_bytes() {
		let raw = "é".repeat(5);

		assert_eq!(truncate_chars(&raw, 3), "ééé");
		assert_eq!(truncate_chars("ab", 3), "ab");
	}
}
