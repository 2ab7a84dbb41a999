use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::ngram_model::NGramModel;
use crate::error::ModelError;
use crate::io::{build_output_path, read_file};

/// Splits a corpus line or a context word into lowercase words.
///
/// Leading and trailing punctuation is stripped from each word; inner
/// apostrophes and hyphens are kept ("don't", "well-known").
pub fn split_words(line: &str) -> Vec<String> {
	line.split_whitespace()
		.map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
		.filter(|w| !w.is_empty())
		.map(str::to_lowercase)
		.collect()
}

/// Word n-gram model of orders `2..=max_order`.
///
/// Learns from a line-oriented corpus (one sentence per line), predicts the
/// most frequent continuations of a context with backoff, and scores a
/// candidate by relative frequency.
#[derive(Serialize, Deserialize, Debug)]
pub struct WordNGramModel {
	max_order: usize,
	ngrams: BTreeMap<usize, NGramModel>,
	sentences: usize,
}

impl WordNGramModel {
	/// Empty model.
	///
	/// # Errors
	/// [`ModelError::InvalidOrder`] if `max_order < 2`.
	pub fn new(max_order: usize) -> Result<Self, ModelError> {
		let mut ngrams = BTreeMap::new();
		for n in 2..=max_order {
			ngrams.insert(n, NGramModel::new(n)?);
		}
		if ngrams.is_empty() {
			return Err(ModelError::InvalidOrder(max_order));
		}
		Ok(Self { max_order, ngrams, sentences: 0 })
	}

	/// Loads the model for `corpus`.
	///
	/// A `<corpus>.bin` next to the corpus is reused when it holds a model of
	/// the same order. Otherwise the corpus is read, learned in parallel and
	/// the result is written to that `.bin` file.
	pub fn load_or_build<P: AsRef<Path>>(corpus: P, max_order: usize) -> Result<Self, ModelError> {
		let binary_data_path = build_output_path(&corpus, "bin")?;
		if binary_data_path.exists() {
			let bytes = std::fs::read(&binary_data_path)?;
			match postcard::from_bytes::<Self>(&bytes) {
				Ok(model) if model.max_order == max_order => {
					info!("Loaded word n-gram model from {}", binary_data_path.display());
					return Ok(model);
				}
				Ok(model) => {
					debug!("Cached model has order {}, rebuilding with order {max_order}", model.max_order);
				}
				Err(e) => warn!("Ignoring unreadable model cache {}: {e}", binary_data_path.display()),
			}
		}

		let lines = read_file(&corpus)?;
		let model = Self::from_lines(lines, max_order)?;
		let bytes = postcard::to_stdvec(&model)?;
		std::fs::write(&binary_data_path, bytes)?;
		info!("Built word n-gram model from {} sentences ({})", model.sentences, binary_data_path.display());
		Ok(model)
	}

	/// Learns a model from corpus lines.
	///
	/// Lines are split into `num_cpus * 8` chunks, each learned by its own
	/// thread; the partial models are merged as they arrive.
	pub fn from_lines(lines: Vec<String>, max_order: usize) -> Result<Self, ModelError> {
		let mut final_model = Self::new(max_order)?;
		if lines.is_empty() {
			return Ok(final_model);
		}

		let chunks = num_cpus::get() * 8;
		let chunk_size = lines.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut workers = Vec::new();
		for chunk in lines.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();

			workers.push(thread::spawn(move || {
				let partial_model = Self::new(max_order).map(|mut model| {
					for sentence in &chunk {
						model.add_sentence(sentence);
					}
					model
				});
				// The receiver only goes away if the builder already failed
				let _ = tx.send(partial_model);
			}));
		}
		drop(tx);

		for partial_model in rx.iter() {
			final_model.merge(&partial_model?)?;
		}
		for worker in workers {
			worker.join().map_err(|_| ModelError::Worker)?;
		}

		Ok(final_model)
	}

	pub fn max_order(&self) -> usize {
		self.max_order
	}

	/// Number of learned sentences.
	pub fn sentences(&self) -> usize {
		self.sentences
	}

	/// Learns one sentence for every order.
	pub fn add_sentence(&mut self, sentence: &str) {
		let words = split_words(sentence);
		if words.is_empty() {
			return;
		}
		self.sentences += 1;
		for model in self.ngrams.values_mut() {
			model.add_sentence(&words);
		}
	}

	/// Normalized context suffixes, longest first, each with its model.
	fn backoff<'a>(&'a self, context: &[String]) -> impl Iterator<Item = (&'a NGramModel, Vec<String>)> + 'a {
		let words: Vec<String> = context.iter().flat_map(|w| split_words(w)).collect();
		let longest = self.max_order.min(words.len() + 1);
		(2..=longest).rev().filter_map(move |n| {
			let prefix = words[words.len() + 1 - n..].to_vec();
			self.ngrams.get(&n).map(|model| (model, prefix))
		})
	}

	/// Up to `k` next words for `context`, best first.
	///
	/// Starts with the longest known suffix of the context and backs off to
	/// shorter ones while fewer than `k` distinct words were found. Within an
	/// order, words are sorted by count descending then alphabetically.
	pub fn predict_next(&self, context: &[String], k: usize) -> Vec<String> {
		let mut seen = HashSet::new();
		let mut predictions = Vec::new();
		if k == 0 {
			return predictions;
		}

		for (model, prefix) in self.backoff(context) {
			let Some(state) = model.state(&prefix) else {
				continue;
			};
			for (word, _) in state.ranked() {
				if seen.insert(word.to_owned()) {
					predictions.push(word.to_owned());
					if predictions.len() == k {
						return predictions;
					}
				}
			}
		}
		predictions
	}

	/// Relative frequency of `candidate` after the longest known suffix of
	/// `context`. `0.0` when nothing matches.
	pub fn score(&self, context: &[String], candidate: &str) -> f32 {
		let candidate = candidate.trim().to_lowercase();
		self.backoff(context)
			.find_map(|(model, prefix)| model.state(&prefix).map(|state| (state.count(&candidate), state.total())))
			.filter(|&(_, total)| total > 0)
			.map_or(0.0, |(count, total)| count as f32 / total as f32)
	}

	/// Merges another model of the same order.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.max_order != other.max_order {
			return Err(ModelError::OrderMismatch(self.max_order, other.max_order));
		}
		for (n, model) in &other.ngrams {
			if let Some(existing) = self.ngrams.get_mut(n) {
				existing.merge(model)?;
			} else {
				self.ngrams.insert(*n, model.clone());
			}
		}
		self.sentences += other.sentences;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn ctx(s: &str) -> Vec<String> {
		s.split_whitespace().map(str::to_owned).collect()
	}

	fn corpus() -> Vec<String> {
		[
			"The cat sat on the mat.",
			"the cat ate the fish",
			"The dog sat on the rug",
			"a cat sat down",
		]
		.into_iter()
		.map(str::to_owned)
		.collect()
	}

	#[test]
	fn test_split_words() {
		assert_eq!(split_words("  Hello, World! don't stop... "), vec!["hello", "world", "don't", "stop"]);
		assert!(split_words("-- !!").is_empty());
	}

	#[test]
	fn test_invalid_order() {
		assert!(matches!(WordNGramModel::new(1), Err(ModelError::InvalidOrder(1))));
	}

	#[test]
	fn test_predict_prefers_longest_context() {
		let model = WordNGramModel::from_lines(corpus(), 3).unwrap();
		// "the cat" -> sat (1), ate (1); then "cat" adds nothing new
		assert_eq!(model.predict_next(&ctx("the cat"), 5), vec!["ate", "sat"]);
		// "sat on" -> the; backoff "on" -> the
		assert_eq!(model.predict_next(&ctx("sat on"), 5), vec!["the"]);
	}

	#[test]
	fn test_predict_backs_off() {
		let model = WordNGramModel::from_lines(corpus(), 3).unwrap();
		// "a cat" -> sat; backoff "cat" -> sat (3), ate (1)
		assert_eq!(model.predict_next(&ctx("a cat"), 5), vec!["sat", "ate"]);
		// unknown prefix at order 3, known at order 2
		assert_eq!(model.predict_next(&ctx("purple cat"), 1), vec!["sat"]);
		assert!(model.predict_next(&ctx("zebra"), 3).is_empty());
		assert!(model.predict_next(&ctx("the"), 0).is_empty());
	}

	#[test]
	fn test_context_is_normalized() {
		let model = WordNGramModel::from_lines(corpus(), 2).unwrap();
		assert_eq!(model.predict_next(&ctx("THE,"), 2), model.predict_next(&ctx("the"), 2));
	}

	#[test]
	fn test_score_is_relative_frequency() {
		let model = WordNGramModel::from_lines(corpus(), 2).unwrap();
		// "cat" is followed by sat x2 ("cat sat" in lines 1 and 4), ate x1
		assert!((model.score(&ctx("cat"), "sat") - 2.0 / 3.0).abs() < 1e-6);
		assert_eq!(model.score(&ctx("cat"), "flew"), 0.0);
		assert_eq!(model.score(&ctx("zebra"), "sat"), 0.0);
	}

	#[test]
	fn test_parallel_build_matches_sequential() {
		let lines: Vec<String> = corpus().into_iter().cycle().take(400).collect();
		let parallel = WordNGramModel::from_lines(lines.clone(), 3).unwrap();
		let mut sequential = WordNGramModel::new(3).unwrap();
		for line in &lines {
			sequential.add_sentence(line);
		}
		assert_eq!(parallel.sentences(), 400);
		for context in ["the", "the cat", "sat on", "cat"] {
			assert_eq!(parallel.predict_next(&ctx(context), 10), sequential.predict_next(&ctx(context), 10));
			assert_eq!(parallel.score(&ctx(context), "sat"), sequential.score(&ctx(context), "sat"));
		}
	}

	#[test]
	fn test_load_or_build_writes_cache() {
		let dir = tempfile::tempdir().unwrap();
		let corpus_path = dir.path().join("corpus.txt");
		let mut file = std::fs::File::create(&corpus_path).unwrap();
		for line in corpus() {
			writeln!(file, "{line}").unwrap();
		}
		drop(file);

		let built = WordNGramModel::load_or_build(&corpus_path, 3).unwrap();
		let cache = dir.path().join("corpus.bin");
		assert!(cache.exists());

		// Remove the corpus: the second load must come from the cache
		std::fs::remove_file(&corpus_path).unwrap();
		let cached = WordNGramModel::load_or_build(&corpus_path, 3).unwrap();
		assert_eq!(cached.sentences(), built.sentences());
		assert_eq!(cached.predict_next(&ctx("the cat"), 3), built.predict_next(&ctx("the cat"), 3));

		// A different order cannot reuse it and the corpus is gone
		assert!(matches!(WordNGramModel::load_or_build(&corpus_path, 2), Err(ModelError::Io(_))));
	}
}
