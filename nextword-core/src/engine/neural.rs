use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use super::{EngineState, EngineStatus, EngineType, PredictionEngine, PredictionResult, guarded};
use crate::config::NeuralConfig;
use crate::error::EngineError;
use crate::pipeline::normalizer::has_word_character;
use crate::ranker::select_top_by;
use crate::tokenizer::BpeTokenizer;

/// A loaded model: token ids in, one score per vocabulary id out.
pub trait LogitScorer: Send {
	fn score(&mut self, ids: &[u32]) -> Result<Vec<f32>, EngineError>;
}

impl<F> LogitScorer for F
where
	F: FnMut(&[u32]) -> Result<Vec<f32>, EngineError> + Send,
{
	fn score(&mut self, ids: &[u32]) -> Result<Vec<f32>, EngineError> {
		self(ids)
	}
}

/// Loads model scorers; called on activation.
pub trait NeuralBackend: Send + Sync {
	fn load(&self) -> Result<Box<dyn LogitScorer>, EngineError>;
}

struct NeuralInner {
	scorer: Option<Box<dyn LogitScorer>>,
	status: EngineStatus,
}

/// [`PredictionEngine`] composing a tokenizer, a model scorer and the ranker.
pub struct NeuralAdapter {
	tokenizer: Arc<BpeTokenizer>,
	backend: Box<dyn NeuralBackend>,
	config: NeuralConfig,
	/// Indexed by id: decoded token has no letter or digit
	non_word: Vec<bool>,
	inner: Mutex<NeuralInner>,
}

impl NeuralAdapter {
	pub fn new(tokenizer: Arc<BpeTokenizer>, backend: Box<dyn NeuralBackend>, config: NeuralConfig) -> Self {
		let non_word = (0..tokenizer.vocab_size() as u32)
			.map(|id| !has_word_character(&tokenizer.decode(id)))
			.collect();
		Self {
			tokenizer,
			backend,
			config,
			non_word,
			inner: Mutex::new(NeuralInner { scorer: None, status: EngineStatus::new() }),
		}
	}

	fn lock(&self) -> MutexGuard<'_, NeuralInner> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Joins context words into the text handed to the tokenizer.
	fn context_text(&self, context: &[String]) -> String {
		let separator = &self.config.separator;
		let joined = context.join(separator);
		if self.config.leading_separator {
			format!("{separator}{joined}")
		} else {
			joined
		}
	}

	fn rank(&self, scores: &[f32], max_results: usize) -> Vec<String> {
		select_top_by(scores, max_results, |id| !self.non_word[id])
			.into_iter()
			.map(|r| self.tokenizer.decode(r.id as u32).trim().to_owned())
			.collect()
	}
}

impl PredictionEngine for NeuralAdapter {
	fn engine_type(&self) -> EngineType {
		EngineType::Neural
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

		match guarded(|| self.backend.load()) {
			Ok(scorer) => {
				inner.scorer = Some(scorer);
				inner.status.set_ready();
				info!("Neural engine activated (vocabulary of {} tokens)", self.tokenizer.vocab_size());
				true
			}
			Err(e) => {
				warn!("Neural engine activation failed: {e}");
				inner.scorer = None;
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
		inner.scorer = None;
		inner.status.set_not_active();
		info!("Neural engine deactivated");
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

		let text = self.context_text(context);
		if text.trim().is_empty() {
			return PredictionResult::empty();
		}
		let mut ids = self.tokenizer.encode(&text);
		if ids.is_empty() {
			return PredictionResult::empty();
		}
		if ids.len() > self.config.max_context_tokens {
			ids.drain(..ids.len() - self.config.max_context_tokens);
		}
		debug!("neural predict ctx={text:?} ids={ids:?}");

		let NeuralInner { scorer: slot, status } = &mut *inner;
		let Some(scorer) = slot.as_mut() else {
			return PredictionResult::empty();
		};

		match guarded(|| scorer.score(&ids)) {
			Ok(scores) if scores.len() == self.non_word.len() => PredictionResult::new(self.rank(&scores, max_results)),
			Ok(scores) => {
				let e = EngineError::ScoreLength { expected: self.non_word.len(), actual: scores.len() };
				warn!("Neural prediction rejected: {e}");
				status.record(&e);
				PredictionResult::empty()
			}
			Err(e) => {
				// Runtime state is unknown after a failure; a new activation reloads it
				warn!("Neural prediction failed: {e}");
				*slot = None;
				status.fail(&e);
				PredictionResult::empty()
			}
		}
	}
}
