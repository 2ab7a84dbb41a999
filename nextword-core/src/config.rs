use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tokenizer tuning.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TokenizerConfig {
	/// Maximum number of memoized words. `0` disables the cache.
	pub cache_capacity: usize,
}

impl Default for TokenizerConfig {
	fn default() -> Self {
		Self { cache_capacity: 4096 }
	}
}

/// Neural adapter settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NeuralConfig {
	/// String placed between context words before encoding.
	pub separator: String,

	/// Whether the context text starts with the separator.
	///
	/// With the default `" "` this gives the first word the same
	/// leading-space form as the following ones (" the" rather than "the").
	pub leading_separator: bool,

	/// Only the most recent ids are passed to the model.
	pub max_context_tokens: usize,
}

impl Default for NeuralConfig {
	fn default() -> Self {
		Self {
			separator: " ".to_owned(),
			leading_separator: true,
			max_context_tokens: 64,
		}
	}
}

/// Built-in word n-gram scorer settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NgramConfig {
	/// Highest n-gram order learned from the corpus.
	pub max_order: usize,
}

impl Default for NgramConfig {
	fn default() -> Self {
		Self { max_order: 3 }
	}
}

/// Top-level configuration of the prediction pipeline.
///
/// # Invariants (checked by [`PipelineConfig::validate`])
/// - `max_context_words >= 1`
/// - `neural.max_context_tokens >= 1`
/// - `neural.separator` is not empty
/// - `ngram.max_order >= 2`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
	/// Bound of the session's context window (in words).
	pub max_context_words: usize,

	/// Number of candidates requested from each engine.
	pub desired_count: usize,

	/// Capacity of the merged candidate list.
	pub suggestion_limit: usize,

	pub tokenizer: TokenizerConfig,

	pub neural: NeuralConfig,

	pub ngram: NgramConfig,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			max_context_words: 8,
			desired_count: 5,
			suggestion_limit: 5,
			tokenizer: TokenizerConfig::default(),
			neural: NeuralConfig::default(),
			ngram: NgramConfig::default(),
		}
	}
}

impl PipelineConfig {
	/// Loads a configuration from a JSON file.
	///
	/// Missing fields take their default value. The result is validated.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let json = fs::read_to_string(path)?;
		Self::from_json(&json)
	}

	/// Parses and validates a configuration from a JSON string.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the invariants listed on the type.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_context_words == 0 {
			return Err(ConfigError::Invalid {
				field: "max_context_words",
				reason: "must be >= 1".to_owned(),
			});
		}
		if self.neural.max_context_tokens == 0 {
			return Err(ConfigError::Invalid {
				field: "neural.max_context_tokens",
				reason: "must be >= 1".to_owned(),
			});
		}
		if self.neural.separator.is_empty() {
			return Err(ConfigError::Invalid {
				field: "neural.separator",
				reason: "must not be empty".to_owned(),
			});
		}
		if self.ngram.max_order < 2 {
			return Err(ConfigError::Invalid {
				field: "ngram.max_order",
				reason: "must be >= 2".to_owned(),
			});
		}
		Ok(())
	}
}
