use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::warn;

use super::word_model::WordNGramModel;
use crate::engine::ngram::{ScorerHandle, ScoringBackend};

/// In-process [`ScoringBackend`] over [`WordNGramModel`]s.
///
/// `open` takes a corpus path and loads (or builds and caches) its model.
/// Each open model gets its own handle; calls on unknown handles return
/// `0.0` or an empty list.
pub struct LocalNgramBackend {
	max_order: usize,
	models: RwLock<HashMap<u64, Arc<WordNGramModel>>>,
	next_handle: AtomicU64,
}

impl LocalNgramBackend {
	pub fn new(max_order: usize) -> Self {
		Self {
			max_order,
			models: RwLock::new(HashMap::new()),
			next_handle: AtomicU64::new(1),
		}
	}

	/// Registers an already built model and returns its handle.
	pub fn insert(&self, model: WordNGramModel) -> ScorerHandle {
		let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
		self.models.write().unwrap_or_else(PoisonError::into_inner).insert(id, Arc::new(model));
		ScorerHandle(id)
	}

	/// Number of open handles.
	pub fn open_handles(&self) -> usize {
		self.models.read().unwrap_or_else(PoisonError::into_inner).len()
	}

	fn model(&self, handle: ScorerHandle) -> Option<Arc<WordNGramModel>> {
		self.models.read().unwrap_or_else(PoisonError::into_inner).get(&handle.0).cloned()
	}
}

impl ScoringBackend for LocalNgramBackend {
	fn open(&self, model_path: &Path) -> ScorerHandle {
		match WordNGramModel::load_or_build(model_path, self.max_order) {
			Ok(model) => self.insert(model),
			Err(e) => {
				warn!("Cannot open word n-gram model {}: {e}", model_path.display());
				ScorerHandle::INVALID
			}
		}
	}

	fn close(&self, handle: ScorerHandle) {
		self.models.write().unwrap_or_else(PoisonError::into_inner).remove(&handle.0);
	}

	fn score_sequence(&self, handle: ScorerHandle, context: &[String], candidate: &str) -> f32 {
		self.model(handle).map_or(0.0, |model| model.score(context, candidate))
	}

	fn predict_next(&self, handle: ScorerHandle, context: &[String], k: usize) -> Vec<Option<String>> {
		self.model(handle)
			.map(|model| model.predict_next(context, k).into_iter().map(Some).collect())
			.unwrap_or_default()
	}
}
