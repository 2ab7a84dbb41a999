//! Next-word prediction core.
//!
//! This crate provides the engine-agnostic part of a next-word predictor:
//! - Byte-level BPE tokenization (GPT-2 vocabulary and merge files)
//! - Deterministic top-k ranking of model scores
//! - Prediction engines behind a common lifecycle (n-gram and neural)
//! - A built-in word n-gram scorer learned from a text corpus
//! - Candidate normalization, merging and multi-engine orchestration
//! - A bounded context window of committed words
//!
//! Model runtimes stay outside: engines talk to them through the
//! [`engine::ngram::ScoringBackend`] and [`engine::neural::NeuralBackend`]
//! traits.

/// Pipeline configuration (JSON, all fields optional).
pub mod config;

/// Engine lifecycle, the `PredictionEngine` trait and its adapters.
pub mod engine;

/// Error types.
pub mod error;

/// Built-in word n-gram models.
pub mod model;

/// Normalizer, merger and orchestrator.
pub mod pipeline;

/// Top-k selection.
pub mod ranker;

/// Context window.
pub mod session;

/// Byte-level BPE tokenizer.
pub mod tokenizer;

/// File helpers.
///
/// Not exposed
pub(crate) mod io;
