// End-to-end: session -> engines -> normalizer -> merger.
//
// The n-gram engine runs on the built-in word model learned from a temporary
// corpus; the neural engine runs on a small BPE vocabulary with a scorer
// that favours a fixed set of tokens.

use std::io::Write;
use std::sync::Arc;

use nextword_core::config::{NeuralConfig, PipelineConfig, TokenizerConfig};
use nextword_core::engine::neural::{LogitScorer, NeuralAdapter, NeuralBackend};
use nextword_core::engine::ngram::NgramAdapter;
use nextword_core::engine::{EngineState, PredictionEngine};
use nextword_core::error::EngineError;
use nextword_core::model::LocalNgramBackend;
use nextword_core::pipeline::{compose, predict_and_merge};
use nextword_core::session::{ContextWindow, PredictionSession};
use nextword_core::tokenizer::{BpeTokenizer, ByteAlphabet, MergeTable, Vocabulary};

const MERGES: [(&str, &str); 9] = [("Ġ", "t"), ("h", "e"), ("Ġt", "he"), ("Ġ", "m"), ("a", "t"), ("Ġm", "at"), ("Ġ", "r"), ("u", "g"), ("Ġr", "ug")];

fn tokenizer() -> Arc<BpeTokenizer> {
	let mut symbols: Vec<String> = ByteAlphabet::get().iter().map(|(_, c)| c.to_string()).collect();
	symbols.sort();
	symbols.extend(MERGES.iter().map(|(l, r)| format!("{l}{r}")));
	let vocab = Vocabulary::from_entries(symbols.into_iter().enumerate().map(|(i, s)| (s, i as u32))).unwrap();
	Arc::new(BpeTokenizer::new(vocab, MergeTable::from_rules(MERGES).unwrap(), &TokenizerConfig::default()).unwrap())
}

/// Scores " rug" above " mat"; every other token is NaN and never ranked.
struct Favourites {
	scores: Vec<f32>,
}

impl NeuralBackend for Favourites {
	fn load(&self) -> Result<Box<dyn LogitScorer>, EngineError> {
		let scores = self.scores.clone();
		Ok(Box::new(move |_: &[u32]| -> Result<Vec<f32>, EngineError> { Ok(scores.clone()) }))
	}
}

fn neural_engine() -> NeuralAdapter {
	let tokenizer = tokenizer();
	let mut scores = vec![f32::NAN; tokenizer.vocab_size()];
	scores[tokenizer.vocabulary().id("Ġrug").unwrap() as usize] = 5.0;
	scores[tokenizer.vocabulary().id("Ġmat").unwrap() as usize] = 4.0;
	NeuralAdapter::new(tokenizer, Box::new(Favourites { scores }), NeuralConfig::default())
}

fn ngram_engine(dir: &tempfile::TempDir) -> NgramAdapter {
	let corpus = dir.path().join("corpus.txt");
	let mut file = std::fs::File::create(&corpus).unwrap();
	for line in ["The cat sat on the mat.", "The dog sat on the mat.", "The cat slept on the sofa."] {
		writeln!(file, "{line}").unwrap();
	}
	NgramAdapter::new(Box::new(LocalNgramBackend::new(3)), corpus)
}

#[test]
fn test_session_to_suggestions() {
	let dir = tempfile::tempdir().unwrap();
	let ngram = ngram_engine(&dir);
	let neural = neural_engine();
	assert!(ngram.activate());
	assert!(neural.activate());

	let config = PipelineConfig::default();
	let mut session = ContextWindow::new(config.max_context_words);
	for word in ["the", "cat", "sat", "on", "the"] {
		session.record_token(word);
	}

	let context = session.context_tokens();
	let mut holder = Vec::new();
	let first = predict_and_merge(&ngram, &context, config.desired_count, &mut holder, 2);
	// "on the" -> mat (2), sofa (1)
	assert_eq!(first.added, 2);
	assert_eq!(holder, vec!["mat", "sofa"]);

	let remaining = 3 - holder.len();
	let second = predict_and_merge(&neural, &context, config.desired_count, &mut holder, remaining);
	// one slot left: "rug" ranks first; "mat" would be a duplicate anyway
	assert_eq!(second.added, 1);
	assert_eq!(holder, vec!["mat", "sofa", "rug"]);
}

#[test]
fn test_compose_priority_and_bound() {
	let dir = tempfile::tempdir().unwrap();
	let engines: Vec<Arc<dyn PredictionEngine>> = vec![Arc::new(neural_engine()), Arc::new(ngram_engine(&dir))];
	for engine in &engines {
		assert!(engine.activate());
	}

	let context = vec!["on".to_owned(), "the".to_owned()];
	assert_eq!(compose(&engines, &context, 5, 4), vec!["rug", "mat", "sofa"]);
	assert_eq!(compose(&engines, &context, 5, 1), vec!["rug"]);
}

#[test]
fn test_failing_engine_is_skipped() {
	let dir = tempfile::tempdir().unwrap();
	let missing = NgramAdapter::new(Box::new(LocalNgramBackend::new(3)), dir.path().join("absent.txt"));
	assert!(!missing.activate());
	assert_eq!(missing.state(), EngineState::Error);
	assert_eq!(missing.last_error().as_deref(), Some("N-gram backend unavailable."));

	let engines: Vec<Arc<dyn PredictionEngine>> = vec![Arc::new(missing), Arc::new(neural_engine())];
	assert!(engines[1].activate());
	assert_eq!(compose(&engines, &["the".to_owned()], 5, 5), vec!["rug", "mat"]);
}

#[test]
fn test_reset_stops_predictions() {
	let neural = neural_engine();
	assert!(neural.activate());
	let mut session = ContextWindow::new(4);
	session.record_token("the");
	session.reset();

	let mut holder = Vec::new();
	let outcome = predict_and_merge(&neural, &session.context_tokens(), 5, &mut holder, 5);
	assert_eq!(outcome.added, 0);
	assert!(holder.is_empty());
}

#[test]
fn test_engines_are_shareable_across_threads() {
	let neural = Arc::new(neural_engine());
	assert!(neural.activate());
	let workers: Vec<_> = (0..4)
		.map(|_| {
			let engine = neural.clone();
			std::thread::spawn(move || engine.predict(&["the".to_owned()], 2).into_candidates())
		})
		.collect();
	for worker in workers {
		assert_eq!(worker.join().unwrap(), vec!["rug", "mat"]);
	}
}
