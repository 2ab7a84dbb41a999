use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use super::{EngineState, EngineStatus, EngineType, PredictionEngine, PredictionResult, guarded};
use crate::error::EngineError;

/// Opaque handle returned by a [`ScoringBackend`]. `0` is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScorerHandle(pub u64);

impl ScorerHandle {
	pub const INVALID: ScorerHandle = ScorerHandle(0);

	pub fn is_valid(self) -> bool {
		self != Self::INVALID
	}
}

/// Interface of an n-gram scoring library.
///
/// Mirrors a C-style API: failures are signalled by sentinel values
/// (invalid handle, `0.0`, empty list) and every call on an invalid handle
/// must be a harmless no-op.
pub trait ScoringBackend: Send + Sync {
	/// Opens a model. Returns [`ScorerHandle::INVALID`] on failure.
	fn open(&self, model_path: &Path) -> ScorerHandle;

	fn close(&self, handle: ScorerHandle);

	/// Score of `candidate` following `context`; `0.0` when unavailable.
	fn score_sequence(&self, handle: ScorerHandle, context: &[String], candidate: &str) -> f32;

	/// Up to `k` next words, best first.
	///
	/// Entries may be `None`, the way a native array may carry nulls.
	fn predict_next(&self, handle: ScorerHandle, context: &[String], k: usize) -> Vec<Option<String>>;
}

struct NgramInner {
	handle: ScorerHandle,
	status: EngineStatus,
}

/// [`PredictionEngine`] over a [`ScoringBackend`].
///
/// All calls, `predict` included, are serialized by one mutex since the
/// backend is not assumed to be reentrant.
pub struct NgramAdapter {
	backend: Box<dyn ScoringBackend>,
	model_path: PathBuf,
	inner: Mutex<NgramInner>,
}

impl NgramAdapter {
	pub fn new<P: Into<PathBuf>>(backend: Box<dyn ScoringBackend>, model_path: P) -> Self {
		Self {
			backend,
			model_path: model_path.into(),
			inner: Mutex::new(NgramInner { handle: ScorerHandle::INVALID, status: EngineStatus::new() }),
		}
	}

	pub fn model_path(&self) -> &Path {
		&self.model_path
	}

	fn lock(&self) -> MutexGuard<'_, NgramInner> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Scores one candidate after `context`. `0.0` when not ready or on failure.
	pub fn score_candidate(&self, context: &[String], candidate: &str) -> f32 {
		let mut inner = self.lock();
		if inner.status.state() != EngineState::Ready {
			return 0.0;
		}
		let handle = inner.handle;
		match guarded(|| Ok(self.backend.score_sequence(handle, context, candidate))) {
			Ok(score) => score,
			Err(e) => {
				warn!("N-gram scoring failed: {e}");
				inner.status.record(&e);
				0.0
			}
		}
	}
}

impl PredictionEngine for NgramAdapter {
	fn engine_type(&self) -> EngineType {
		EngineType::Ngram
	}

	fn state(&self) -> EngineState {
		self.lock().status.state()
	}

	fn activate(&self) -> bool {
		let mut inner = self.lock();
		if inner.status.state() == EngineState::Ready {
			return true;
		}
		inner.status.begin_activation();

		let opened = guarded(|| {
			let handle = self.backend.open(&self.model_path);
			if handle.is_valid() {
				Ok(handle)
			} else {
				Err(EngineError::Unavailable("N-gram backend unavailable.".to_owned()))
			}
		});
		match opened {
			Ok(handle) => {
				inner.handle = handle;
				inner.status.set_ready();
				info!("N-gram engine activated with model {}", self.model_path.display());
				true
			}
			Err(e) => {
				warn!("N-gram engine activation failed: {e}");
				inner.handle = ScorerHandle::INVALID;
				inner.status.fail(&e);
				false
			}
		}
	}

	fn deactivate(&self) {
		let mut inner = self.lock();
		if inner.status.state() == EngineState::NotActive {
			return;
		}
		let handle = inner.handle;
		if handle.is_valid() {
			if let Err(e) = guarded(|| {
				self.backend.close(handle);
				Ok(())
			}) {
				warn!("N-gram backend close failed: {e}");
				inner.status.record(&e);
			}
		}
		inner.handle = ScorerHandle::INVALID;
		inner.status.set_not_active();
		info!("N-gram engine deactivated");
	}

	fn last_error(&self) -> Option<String> {
		self.lock().status.last_error()
	}

	fn predict(&self, context: &[String], max_results: usize) -> PredictionResult {
		if max_results == 0 || context.is_empty() {
			return PredictionResult::empty();
		}
		let mut inner = self.lock();
		if inner.status.state() != EngineState::Ready {
			return PredictionResult::empty();
		}

		let handle = inner.handle;
		match guarded(|| Ok(self.backend.predict_next(handle, context, max_results))) {
			Ok(raw) => PredictionResult::new(raw.into_iter().flatten().take(max_results).collect()),
			Err(e) => {
				warn!("N-gram prediction failed: {e}");
				inner.status.record(&e);
				PredictionResult::empty()
			}
		}
	}
}
