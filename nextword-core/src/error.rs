//! Error types for the prediction pipeline.
//!
//! Two classes exist:
//! - setup errors ([`TokenizerError`], [`ConfigError`]) are returned from
//!   constructors and loaders and are not recoverable at call time;
//! - backend errors ([`EngineError`]) never cross the engine boundary. Engines
//!   record them as their last error and return `false` or an empty result.

use thiserror::Error;

/// Errors raised while loading or validating tokenizer data.
#[derive(Error, Debug)]
pub enum TokenizerError {
	/// Reading a vocabulary or merge file failed
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// The vocabulary file is not a JSON object of token -> id
	#[error("Invalid vocabulary JSON: {0}")]
	Json(#[from] serde_json::Error),

	/// The vocabulary contains no entries
	#[error("Vocabulary is empty")]
	EmptyVocabulary,

	/// Two tokens share the same id
	#[error("Id {id} is assigned to both {first:?} and {second:?}")]
	DuplicateId { id: u32, first: String, second: String },

	/// The same token is listed under two ids
	#[error("Token {token:?} is assigned to both id {first_id} and id {second_id}")]
	DuplicateToken { token: String, first_id: u32, second_id: u32 },

	/// Ids do not cover `[0, size)` without gaps
	#[error("Vocabulary ids are not dense: id {missing} is missing (size {size})")]
	NonDenseVocabulary { missing: u32, size: usize },

	/// A merge line does not hold exactly two symbols
	#[error("Malformed merge rule at line {line}: {content:?}")]
	MalformedMerge { line: usize, content: String },

	/// The same pair appears at two ranks
	#[error("Merge rule {left:?} {right:?} is repeated at rank {rank}")]
	DuplicateMerge { left: String, right: String, rank: usize },

	/// A merge rule references a symbol the vocabulary does not know
	#[error("Merge rule at rank {rank} references unknown symbol {symbol:?}")]
	MissingSymbol { symbol: String, rank: usize },

	/// The pretokenization pattern failed to compile
	#[error("Pretokenizer regex error: {0}")]
	Regex(#[from] fancy_regex::Error),
}

/// Errors raised by prediction backends.
///
/// These are converted into an engine's last-error message; they are never
/// returned from [`crate::engine::PredictionEngine`] methods.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
	/// The backend could not be opened or loaded
	#[error("{0}")]
	Unavailable(String),

	/// The model returned a score vector that does not match the vocabulary
	#[error("Score vector has {actual} entries, expected {expected}")]
	ScoreLength { expected: usize, actual: usize },

	/// The backend reported a failure while scoring
	#[error("Backend failure: {0}")]
	Backend(String),

	/// The backend panicked; the panic was caught at the engine boundary
	#[error("Backend panicked: {0}")]
	Panicked(String),
}

/// Errors raised while loading or validating the pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Invalid configuration JSON: {0}")]
	Json(#[from] serde_json::Error),

	/// A field holds a value outside its valid range
	#[error("Invalid value for {field}: {reason}")]
	Invalid { field: &'static str, reason: String },
}

/// Errors raised while building or loading the built-in word n-gram model.
#[derive(Error, Debug)]
pub enum ModelError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Postcard(#[from] postcard::Error),

	/// Model order must be at least 2
	#[error("Order must be >= 2, got {0}")]
	InvalidOrder(usize),

	/// Two models of different orders cannot be merged
	#[error("Order mismatch: {0} vs {1}")]
	OrderMismatch(usize, usize),

	/// Two states with different prefixes cannot be merged
	#[error("Key mismatch: {0:?} vs {1:?}")]
	KeyMismatch(String, String),

	/// A worker thread building a partial model died
	#[error("Model build worker failed")]
	Worker,
}

/// Formats the payload of a caught panic for an error message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_owned()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic".to_owned()
	}
}
