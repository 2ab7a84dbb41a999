//! Built-in word n-gram scorer.
//!
//! - Fixed-order word n-gram counts (`NGramModel`)
//! - All orders `2..=max_order` of a corpus (`WordNGramModel`)
//! - A [`ScoringBackend`](crate::engine::ngram::ScoringBackend) serving
//!   those models behind handles (`LocalNgramBackend`)

/// Handle table implementing the n-gram scoring interface.
pub mod backend;

/// Fixed-order (`n >= 2`) word n-gram counts.
pub mod ngram_model;

/// Continuations observed after one prefix.
mod state;

/// Multi-order model: corpus learning, caching, backoff prediction and scoring.
pub mod word_model;

pub use backend::LocalNgramBackend;
pub use word_model::{WordNGramModel, split_words};
