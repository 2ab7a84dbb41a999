//! Context tracking for next-word prediction.

use std::collections::VecDeque;

/// Tracks the words committed so far in the current input field.
pub trait PredictionSession {
	/// Records a committed word.
	fn record_token(&mut self, token: &str);

	/// Current context, oldest first.
	fn context_tokens(&self) -> Vec<String>;

	/// Clears the context (focus or field change).
	fn reset(&mut self);
}

/// Bounded FIFO of the most recent words.
///
/// Once `max_len` words are held, recording a new one evicts the oldest.
/// Tokens that are empty after trimming are not recorded.
#[derive(Debug, Clone)]
pub struct ContextWindow {
	tokens: VecDeque<String>,
	max_len: usize,
}

impl ContextWindow {
	/// `max_len` is clamped to at least 1.
	pub fn new(max_len: usize) -> Self {
		let max_len = max_len.max(1);
		Self { tokens: VecDeque::with_capacity(max_len), max_len }
	}

	pub fn max_len(&self) -> usize {
		self.max_len
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.tokens.iter().map(String::as_str)
	}
}

impl PredictionSession for ContextWindow {
	fn record_token(&mut self, token: &str) {
		let token = token.trim();
		if token.is_empty() {
			return;
		}
		if self.tokens.len() == self.max_len {
			self.tokens.pop_front();
		}
		self.tokens.push_back(token.to_owned());
	}

	fn context_tokens(&self) -> Vec<String> {
		self.tokens.iter().cloned().collect()
	}

	fn reset(&mut self) {
		self.tokens.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_evicts_oldest_first() {
		let mut window = ContextWindow::new(3);
		for word in ["a", "b", "c", "d", "e"] {
			window.record_token(word);
		}
		assert_eq!(window.context_tokens(), vec!["c", "d", "e"]);
		assert_eq!(window.len(), 3);
	}

	#[test]
	fn test_snapshot_is_detached() {
		let mut window = ContextWindow::new(2);
		window.record_token("hello");
		let snapshot = window.context_tokens();
		window.record_token("world");
		assert_eq!(snapshot, vec!["hello"]);
	}

	#[test]
	fn test_reset_and_blank_tokens() {
		let mut window = ContextWindow::new(4);
		window.record_token("  ");
		window.record_token(" the ");
		assert_eq!(window.context_tokens(), vec!["the"]);
		window.reset();
		assert!(window.is_empty());
	}

	#[test]
	fn test_zero_bound_is_clamped() {
		let mut window = ContextWindow::new(0);
		window.record_token("a");
		window.record_token("b");
		assert_eq!(window.context_tokens(), vec!["b"]);
	}
}
