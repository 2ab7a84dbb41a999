//! Prediction engines.
//!
//! Every backend is wrapped in an adapter implementing [`PredictionEngine`].
//! Adapters share one lifecycle:
//!
//! ```text
//! NotActive --activate ok--> Ready --deactivate--> NotActive
//! NotActive --activate err-> Error --activate----> Ready | Error
//! ```
//!
//! No adapter method panics or returns an error: failures end up in
//! [`PredictionEngine::last_error`] and an empty result or `false`.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::error::{EngineError, panic_message};

/// Statistical n-gram adapter over an opaque scorer.
pub mod ngram;

/// Neural adapter: tokenizer + opaque model scorer + ranker.
pub mod neural;

/// Engine family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineType {
	None,
	Ngram,
	Neural,
	Hybrid,
}

impl fmt::Display for EngineType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			EngineType::None => "NONE",
			EngineType::Ngram => "NGRAM",
			EngineType::Neural => "NEURAL",
			EngineType::Hybrid => "HYBRID",
		};
		f.write_str(name)
	}
}

/// Activation state of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
	NotActive,
	Ready,
	Error,
}

/// Ranked candidates produced by one `predict` call, best first.
///
/// Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionResult {
	candidates: Vec<String>,
}

impl PredictionResult {
	pub fn new(candidates: Vec<String>) -> Self {
		Self { candidates }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn candidates(&self) -> &[String] {
		&self.candidates
	}

	pub fn into_candidates(self) -> Vec<String> {
		self.candidates
	}

	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty()
	}

	pub fn len(&self) -> usize {
		self.candidates.len()
	}
}

/// Common interface of all prediction backends.
///
/// Implementations serialize lifecycle calls per instance, so every method
/// takes `&self` and an engine can be shared behind an `Arc`.
pub trait PredictionEngine: Send + Sync {
	/// Engine family.
	fn engine_type(&self) -> EngineType;

	/// Current activation state.
	fn state(&self) -> EngineState;

	/// True only in [`EngineState::Ready`].
	fn is_ready(&self) -> bool {
		self.state() == EngineState::Ready
	}

	/// Acquires backend resources.
	///
	/// Returns `true` immediately, without re-acquiring, when already ready.
	/// On failure moves to [`EngineState::Error`], records a message and
	/// returns `false`.
	fn activate(&self) -> bool;

	/// Releases backend resources. A no-op when not active.
	fn deactivate(&self);

	/// Message recorded by the last failure, if any.
	fn last_error(&self) -> Option<String>;

	/// Computes up to `max_results` next-word candidates for `context`.
	///
	/// Returns an empty result without calling the backend when
	/// `max_results == 0`, `context` is empty, or the engine is not ready.
	fn predict(&self, context: &[String], max_results: usize) -> PredictionResult;
}

/// State plus last error, the part of the lifecycle every adapter shares.
#[derive(Debug, Clone)]
pub(crate) struct EngineStatus {
	state: EngineState,
	last_error: Option<String>,
}

impl EngineStatus {
	pub(crate) fn new() -> Self {
		Self { state: EngineState::NotActive, last_error: None }
	}

	pub(crate) fn state(&self) -> EngineState {
		self.state
	}

	pub(crate) fn last_error(&self) -> Option<String> {
		self.last_error.clone()
	}

	/// Starting an activation attempt clears the previous error.
	pub(crate) fn begin_activation(&mut self) {
		self.last_error = None;
	}

	pub(crate) fn set_ready(&mut self) {
		self.state = EngineState::Ready;
	}

	pub(crate) fn set_not_active(&mut self) {
		self.state = EngineState::NotActive;
	}

	pub(crate) fn fail(&mut self, error: &EngineError) {
		self.state = EngineState::Error;
		self.last_error = Some(error.to_string());
	}

	/// Records an error without leaving the current state.
	pub(crate) fn record(&mut self, error: &EngineError) {
		self.last_error = Some(error.to_string());
	}
}

/// Runs a backend call, turning a panic into [`EngineError::Panicked`].
pub(crate) fn guarded<T, F>(call: F) -> Result<T, EngineError>
where
	F: FnOnce() -> Result<T, EngineError>,
{
	panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(payload.as_ref()))))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_guarded_catches_panics() {
		let result: Result<(), EngineError> = guarded(|| panic!("native crash"));
		assert_eq!(result, Err(EngineError::Panicked("native crash".to_owned())));
	}

	#[test]
	fn test_guarded_passes_values() {
		assert_eq!(guarded(|| Ok(3)), Ok(3));
		assert_eq!(guarded::<(), _>(|| Err(EngineError::Backend("x".into()))), Err(EngineError::Backend("x".into())));
	}

	#[test]
	fn test_status_transitions() {
		let mut status = EngineStatus::new();
		assert_eq!(status.state(), EngineState::NotActive);
		status.fail(&EngineError::Unavailable("missing".into()));
		assert_eq!(status.state(), EngineState::Error);
		assert_eq!(status.last_error().as_deref(), Some("missing"));
		status.begin_activation();
		status.set_ready();
		assert_eq!(status.state(), EngineState::Ready);
		assert_eq!(status.last_error(), None);
	}

	#[test]
	fn test_engine_type_display() {
		assert_eq!(EngineType::Ngram.to_string(), "NGRAM");
		assert_eq!(EngineType::Hybrid.to_string(), "HYBRID");
	}
}
