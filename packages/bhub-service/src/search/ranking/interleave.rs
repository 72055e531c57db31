//! Source-diversity reordering of an over-fetched page.

use bhub_storage::models::ArticleRecord;

/// Grouping identity for run detection. A feed id and a journal name that render to the same text
/// group together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
	Named(String),
	Unattributed,
}
impl SourceKey {
	pub fn of(feed_id: Option<i64>, journal_name: Option<&str>) -> Self {
		match (feed_id, journal_name) {
			(Some(feed_id), _) => Self::Named(feed_id.to_string()),
			(None, Some(journal_name)) => Self::Named(journal_name.to_string()),
			(None, None) => Self::Unattributed,
		}
	}

	pub fn of_article(article: &ArticleRecord) -> Self {
		Self::of(article.feed_id, article.journal_name.as_deref())
	}
}

/// Caps same-source runs in one forward pass.
///
/// Items past `max_consecutive` in a run are deferred and appended, in their original order, after
/// the primary pass; the result is then cut to `target_size`. Deferred items are not re-checked
/// against each other, so the tail can still hold long runs when the input lacks diversity.
pub fn interleave<T, F>(
	items: Vec<T>,
	max_consecutive: usize,
	target_size: usize,
	key_of: F,
) -> Vec<T>
where
	F: Fn(&T) -> SourceKey,
{
	let mut primary = Vec::with_capacity(items.len());
	let mut deferred = Vec::new();
	let mut last_key: Option<SourceKey> = None;
	let mut consecutive = 0_usize;

	for item in items {
		let key = key_of(&item);

		if last_key.as_ref() == Some(&key) {
			consecutive += 1;
		} else {
			consecutive = 1;
			last_key = Some(key);
		}

		if consecutive > max_consecutive {
			deferred.push(item);
		} else {
			primary.push(item);
		}
	}

	if !deferred.is_empty() {
		tracing::debug!(
			primary = primary.len(),
			deferred = deferred.len(),
			"Deferred same-source items during interleaving."
		);
	}

	primary.extend(deferred);
	primary.truncate(target_size);

	primary
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Clone, PartialEq)]
	struct Item {
		id: u32,
		key: SourceKey,
	}

	fn item(id: u32, source: &str) -> Item {
		Item { id, key: SourceKey::Named(source.to_string()) }
	}

	fn ids(items: &[Item]) -> Vec<u32> {
		items.iter().map(|item| item.id).collect()
	}

	fn run(items: Vec<Item>, max_consecutive: usize, target_size: usize) -> Vec<Item> {
		interleave(items, max_consecutive, target_size, |item| item.key.clone())
	}

	fn longest_run(items: &[Item]) -> usize {
		let mut longest = 0;
		let mut current = 0;

		for (idx, item) in items.iter().enumerate() {
			if idx > 0 && items[idx - 1].key == item.key {
				current += 1;
			} else {
				current = 1;
			}

			longest = longest.max(current);
		}

		longest
	}

	#[test]
	fn two_blocks_of_ten_are_capped_and_truncated() {
		let input = (1..=10).map(|id| item(id, "A")).chain((11..=20).map(|id| item(id, "B")));
		let output = run(input.collect(), 2, 12);

		assert_eq!(ids(&output), vec![1, 2, 11, 12, 3, 4, 5, 6, 7, 8, 9, 10]);
	}

	#[test]
	fn primary_pass_respects_the_run_cap() {
		let sources = ["A", "A", "A", "B", "A", "A", "A", "A", "C", "C", "C", "B"];
		let input =
			sources.iter().enumerate().map(|(idx, source)| item(idx as u32, source)).collect();
		let output = run(input, 2, usize::MAX);
		let primary_len = output.len() - 4;

		assert!(longest_run(&output[..primary_len]) <= 2);
		assert_eq!(ids(&output[primary_len..]), vec![2, 6, 7, 10]);
	}

	#[test]
	fn nothing_is_lost_when_the_target_covers_the_input() {
		let input = (0..15)
			.map(|id| item(id, if id % 4 == 0 { "B" } else { "A" }))
			.collect::<Vec<_>>();
		let output = run(input.clone(), 1, 100);
		let mut sorted = ids(&output);

		sorted.sort_unstable();

		assert_eq!(sorted, ids(&input));
	}

	#[test]
	fn output_length_is_bounded_by_target_and_input() {
		for (len, target) in [(0, 5), (3, 5), (9, 5), (9, 9), (9, 0)] {
			let input = (0..len).map(|id| item(id, "A")).collect::<Vec<_>>();

			assert_eq!(run(input, 2, target as usize).len(), (len as usize).min(target as usize));
		}
	}

	#[test]
	fn unattributed_items_group_together() {
		let mut input =
			(0..3).map(|id| Item { id, key: SourceKey::Unattributed }).collect::<Vec<_>>();

		input.push(item(3, "A"));

		assert_eq!(ids(&run(input, 2, 4)), vec![0, 1, 3, 2]);
		assert_eq!(SourceKey::of(None, None), SourceKey::Unattributed);
	}

	#[test]
	fn feed_id_takes_precedence_over_journal_name() {
		assert_eq!(SourceKey::of(Some(7), Some("Cell")), SourceKey::Named("7".to_string()));
		assert_eq!(SourceKey::of(None, Some("Cell")), SourceKey::Named("Cell".to_string()));
		assert_eq!(SourceKey::of(Some(42), None), SourceKey::of(None, Some("42")));
	}

	#[test]
	fn single_source_input_degrades_to_the_original_order() {
		let input = (0..9).map(|id| item(id, "A")).collect();

		assert_eq!(ids(&run(input, 2, 6)), vec![0, 1, 2, 3, 4, 5]);
	}
}
