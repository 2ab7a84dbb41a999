//! Deterministic top-k selection over a raw score vector.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

/// One selected entry: its index in the score vector and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
	pub id: usize,
	pub score: f32,
}

/// Orders entries from worst to best: higher score wins, then lower id.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ByRank(Ranked);

impl Eq for ByRank {}

impl Ord for ByRank {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.score.total_cmp(&other.0.score).then_with(|| other.0.id.cmp(&self.0.id))
	}
}

impl PartialOrd for ByRank {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Selects the `k` highest-scoring entries not in `excluded`.
///
/// See [`select_top_by`].
pub fn select_top(scores: &[f32], k: usize, excluded: &HashSet<usize>) -> Vec<Ranked> {
	select_top_by(scores, k, |id| !excluded.contains(&id))
}

/// Selects the `k` highest-scoring entries for which `eligible` holds.
///
/// - Strict descending score order; equal scores are ordered by ascending id
/// - Ineligible entries and NaN scores are removed before ranking
/// - Returns every eligible entry, sorted, when fewer than `k` exist
/// - Returns an empty list when `k == 0` or `scores` is empty
///
/// Runs in `O(n log k)` with a bounded min-heap.
pub fn select_top_by<F>(scores: &[f32], k: usize, mut eligible: F) -> Vec<Ranked>
where
	F: FnMut(usize) -> bool,
{
	if k == 0 || scores.is_empty() {
		return Vec::new();
	}

	let mut heap: BinaryHeap<Reverse<ByRank>> = BinaryHeap::with_capacity(k.min(scores.len()) + 1);
	for (id, &score) in scores.iter().enumerate() {
		if score.is_nan() || !eligible(id) {
			continue;
		}
		let entry = ByRank(Ranked { id, score });
		if heap.len() < k {
			heap.push(Reverse(entry));
		} else if heap.peek().is_some_and(|Reverse(worst)| entry > *worst) {
			heap.pop();
			heap.push(Reverse(entry));
		}
	}

	// Ascending Reverse order is descending rank
	heap.into_sorted_vec().into_iter().map(|Reverse(ByRank(r))| r).collect()
}
