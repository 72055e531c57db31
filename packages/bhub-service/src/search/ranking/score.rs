//! Additive relevance blending over native bm25 scores.

use time::{Duration, OffsetDateTime};

use bhub_storage::models::RankingCandidate;

pub const HIGHLIGHT_BOOST: f64 = 5.0;
pub const RECENCY_BOOST: f64 = 2.0;
pub const RECENT_WINDOW: Duration = Duration::days(30);
pub const IMPACT_BASELINE: f64 = 5.0;
pub const IMPACT_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Boosts {
	pub recent: bool,
	pub impact: bool,
}
impl Default for Boosts {
	fn default() -> Self {
		Self { recent: true, impact: true }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoredResult {
	pub article_id: i64,
	pub final_score: f64,
}

/// bm25 is lower-is-better; the blended score is higher-is-better.
pub fn normalize(base_score: f64) -> f64 {
	-base_score
}

pub fn is_recent(publication_date: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
	publication_date.is_some_and(|date| date > now - RECENT_WINDOW)
}

pub fn final_score(candidate: &RankingCandidate, boosts: Boosts, now: OffsetDateTime) -> f64 {
	let mut score = normalize(candidate.relevance);

	if candidate.highlighted {
		score += HIGHLIGHT_BOOST;
	}
	if boosts.recent && is_recent(candidate.publication_date, now) {
		score += RECENCY_BOOST;
	}
	if boosts.impact {
		score += (candidate.impact_score - IMPACT_BASELINE) * IMPACT_WEIGHT;
	}

	score
}

/// Scores and orders candidates best first. Equal scores keep their incoming order.
pub fn rank(
	candidates: &[RankingCandidate],
	boosts: Boosts,
	now: OffsetDateTime,
) -> Vec<ScoredResult> {
	let mut scored = candidates
		.iter()
		.map(|candidate| ScoredResult {
			article_id: candidate.article_id,
			final_score: final_score(candidate, boosts, now),
		})
		.collect::<Vec<_>>();

	scored.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

	scored
}
