use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Continuations observed after one word prefix.
///
/// A `State` is a node of the word-level Markov chain: `key` is the
/// space-joined (n-1)-word prefix and `transitions` counts every word seen
/// right after it.
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct State {
	key: String,
	/// Example: { "cat" => 42, "dog" => 3 }
	transitions: HashMap<String, usize>,
}

impl State {
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			transitions: HashMap::new(),
		}
	}

	/// Records one occurrence of `next_word` after this prefix.
	pub fn add_transition(&mut self, next_word: &str) {
		if let Some(occurrence) = self.transitions.get_mut(next_word) {
			*occurrence += 1;
		} else {
			self.transitions.insert(next_word.to_owned(), 1);
		}
	}

	pub fn count(&self, word: &str) -> usize {
		self.transitions.get(word).copied().unwrap_or(0)
	}

	/// Total number of observed transitions.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Continuations, most frequent first; ties in alphabetical order.
	pub fn ranked(&self) -> Vec<(&str, usize)> {
		let mut ranked: Vec<(&str, usize)> = self.transitions.iter().map(|(w, c)| (w.as_str(), *c)).collect();
		ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
		ranked
	}

	/// Merges another state with the same key; counts are summed.
	///
	/// # Errors
	/// [`ModelError::KeyMismatch`] if the keys differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.key != other.key {
			return Err(ModelError::KeyMismatch(self.key.clone(), other.key.clone()));
		}

		for (next_word, occurrence) in &other.transitions {
			*self.transitions.entry(next_word.clone()).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}
