use crate::{BhubService, Error, Result};
use bhub_domain::query;

pub const DEFAULT_SUGGESTION_LIMIT: u32 = 10;
pub const MAX_SUGGESTION_LIMIT: u32 = 20;

/// Title words must be longer than this to be suggested.
const MIN_WORD_CHARS: usize = 3;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SuggestionsRequest {
	pub q: String,
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SuggestionsResponse {
	pub suggestions: Vec<String>,
}

impl BhubService {
	/// Title words and category names containing the cleaned term, first seen first.
	pub async fn suggestions(&self, req: SuggestionsRequest) -> Result<SuggestionsResponse> {
		let limit = req.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);

		if !(1..=MAX_SUGGESTION_LIMIT).contains(&limit) {
			return Err(Error::invalid(format!(
				"limit must be between 1 and {MAX_SUGGESTION_LIMIT}."
			)));
		}

		let Some(fragment) = query::suggestion_fragment(&req.q) else {
			return Ok(SuggestionsResponse { suggestions: Vec::new() });
		};
		let records = &self.backends.records;
		let titles = records.titles_containing(&fragment, limit).await?;
		let categories = records.category_names_containing(&fragment).await?;
		let needle = fragment.to_lowercase();
		let mut suggestions = Vec::new();

		for word in titles.iter().flat_map(|title| title.split_whitespace()) {
			if word.chars().count() > MIN_WORD_CHARS && word.to_lowercase().contains(&needle) {
				push_unique(&mut suggestions, word);
			}
		}
		for name in &categories {
			push_unique(&mut suggestions, name);
		}

		suggestions.truncate(limit as usize);

		Ok(SuggestionsResponse { suggestions })
	}
}

fn push_unique(out: &mut Vec<String>, value: &str) {
	if !out.iter().any(|existing| existing == value) {
		out.push(value.to_string());
	}
}
