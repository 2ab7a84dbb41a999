use std::collections::HashSet;

use log::debug;

use super::merger::merge_unique;
use super::normalizer::normalize;
use crate::engine::PredictionEngine;

/// What one engine call contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
	/// Entries appended to the holder
	pub added: usize,
	/// The engine returned at least one raw candidate
	pub had_raw: bool,
	/// At least one candidate survived normalization
	pub had_normalized: bool,
}

/// Runs `engine` on `context` and merges its cleaned candidates into `holder`.
///
/// Does not call the engine when `limit == 0` or `context` is empty. The
/// engine is asked for `min(limit, desired_count)` candidates; at most
/// `limit` are appended, never duplicating an entry already in `holder`.
///
/// Running several engines in priority order against the same holder lets
/// earlier engines take the first slots.
pub fn predict_and_merge(engine: &dyn PredictionEngine, context: &[String], desired_count: usize, holder: &mut Vec<String>, limit: usize) -> MergeOutcome {
	if limit == 0 || context.is_empty() {
		return MergeOutcome::default();
	}

	let result = engine.predict(context, limit.min(desired_count));
	let raw = result.candidates();
	debug!("Engine {} raw candidates={raw:?} ctx={context:?}", engine.engine_type());

	let had_raw = !raw.is_empty();
	let predictions = normalize(raw, &HashSet::new());
	if predictions.is_empty() {
		return MergeOutcome { added: 0, had_raw, had_normalized: false };
	}

	let added = merge_unique(holder, &predictions, limit);
	MergeOutcome { added, had_raw, had_normalized: true }
}

/// Builds a fresh candidate list from `engines`, in priority order.
///
/// Each engine only fills the capacity left by the previous ones; the list
/// never holds more than `limit` entries.
pub fn compose<E>(engines: &[E], context: &[String], desired_count: usize, limit: usize) -> Vec<String>
where
	E: AsRef<dyn PredictionEngine>,
{
	let mut suggestions = Vec::with_capacity(limit);
	for engine in engines {
		let remaining = limit - suggestions.len();
		if remaining == 0 {
			break;
		}
		predict_and_merge(engine.as_ref(), context, desired_count, &mut suggestions, remaining);
	}
	suggestions
}
