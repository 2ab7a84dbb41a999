//! Candidate post-processing: cleaning, merging and engine orchestration.

/// Bounded, duplicate-free appends into a suggestion list.
pub mod merger;

/// Candidate cleaning (trim, punctuation-only, case-insensitive dedup).
pub mod normalizer;

/// Runs engines and merges their output.
pub mod orchestrator;

pub use merger::merge_unique;
pub use normalizer::normalize;
pub use orchestrator::{MergeOutcome, compose, predict_and_merge};
