use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::state::State;
use crate::error::ModelError;

/// Word n-gram counts of a single order `n`.
///
/// Stores one [`State`] per observed (n-1)-word prefix.
///
/// # Invariants
/// - `n` is always >= 2
/// - Keys are lowercase words joined by a single space
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramModel {
	n: usize,
	states: HashMap<String, State>,
}

impl NGramModel {
	/// # Errors
	/// [`ModelError::InvalidOrder`] if `n < 2`.
	pub fn new(n: usize) -> Result<Self, ModelError> {
		if n < 2 {
			return Err(ModelError::InvalidOrder(n));
		}
		Ok(Self { n, states: HashMap::new() })
	}

	pub fn order(&self) -> usize {
		self.n
	}

	/// Number of distinct prefixes.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Counts every n-word window of an already tokenized sentence.
	///
	/// Sentences shorter than `n` words are ignored.
	pub fn add_sentence(&mut self, words: &[String]) {
		if words.len() < self.n {
			return;
		}

		for window in words.windows(self.n) {
			let (prefix, next) = window.split_at(self.n - 1);
			let key = prefix.join(" ");
			self.states
				.entry(key)
				.or_insert_with_key(|key| State::new(key))
				.add_transition(&next[0]);
		}
	}

	/// State for the given (n-1)-word prefix.
	pub fn state(&self, prefix: &[String]) -> Option<&State> {
		if prefix.len() + 1 != self.n {
			return None;
		}
		self.states.get(&prefix.join(" "))
	}

	/// # Errors
	/// [`ModelError::OrderMismatch`] if the orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.n != other.n {
			return Err(ModelError::OrderMismatch(self.n, other.n));
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(s: &str) -> Vec<String> {
		s.split_whitespace().map(str::to_owned).collect()
	}

	#[test]
	fn test_order_below_two_is_rejected() {
		assert!(matches!(NGramModel::new(1), Err(ModelError::InvalidOrder(1))));
	}

	#[test]
	fn test_trigram_windows() {
		let mut model = NGramModel::new(3).unwrap();
		model.add_sentence(&words("the cat sat on the cat mat"));
		let state = model.state(&words("the cat")).unwrap();
		assert_eq!(state.count("sat"), 1);
		assert_eq!(state.count("mat"), 1);
		assert!(model.state(&words("the")).is_none());
	}

	#[test]
	fn test_short_sentence_ignored() {
		let mut model = NGramModel::new(3).unwrap();
		model.add_sentence(&words("hello world"));
		assert!(model.is_empty());
	}

	#[test]
	fn test_merge_requires_same_order() {
		let mut a = NGramModel::new(2).unwrap();
		let b = NGramModel::new(3).unwrap();
		assert!(matches!(a.merge(&b), Err(ModelError::OrderMismatch(2, 3))));
	}
}
