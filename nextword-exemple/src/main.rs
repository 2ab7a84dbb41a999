use std::env;
use std::path::Path;

use nextword_core::config::PipelineConfig;
use nextword_core::engine::PredictionEngine;
use nextword_core::engine::ngram::NgramAdapter;
use nextword_core::model::LocalNgramBackend;
use nextword_core::pipeline::{MergeOutcome, predict_and_merge};
use nextword_core::session::{ContextWindow, PredictionSession};
use nextword_core::tokenizer::BpeTokenizer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = PipelineConfig::default();

    // Learn a word n-gram model from the sample corpus
    // (the first run writes ./data/corpus.bin, later runs load it)
    let engine = NgramAdapter::new(Box::new(LocalNgramBackend::new(config.ngram.max_order)), "./data/corpus.txt");
    if !engine.activate() {
        println!("N-gram engine failed: {:?}", engine.last_error());
        return Ok(());
    }

    // Activating a ready engine does not reload the model
    println!("Activate again: {}", engine.activate());

    // Type a sentence word by word, asking for suggestions after each word
    let mut session = ContextWindow::new(config.max_context_words);
    for word in ["I", "would", "like", "a", "cup", "of"] {
        session.record_token(word);

        let mut suggestions = Vec::new();
        let MergeOutcome { added, had_raw, .. } = predict_and_merge(
            &engine,
            &session.context_tokens(),
            config.desired_count,
            &mut suggestions,
            config.suggestion_limit,
        );
        println!("{:<30} -> {suggestions:?} (added {added}, raw: {had_raw})", session.context_tokens().join(" "));
    }

    // Same context, a single candidate scored directly
    let context = session.context_tokens();
    println!("score('tea' | {context:?}) = {:.3}", engine.score_candidate(&context, "tea"));

    // Focus change
    session.reset();
    println!("After reset: {:?}", session.context_tokens());

    engine.deactivate();
    println!("Engine state: {:?}", engine.state());

    // GPT-2 tokenizer, when its files are available
    // (NEXTWORD_GPT2_DIR=/path/to/distilgpt2 with vocab.json and merges.txt)
    if let Ok(dir) = env::var("NEXTWORD_GPT2_DIR") {
        let dir = Path::new(&dir);
        let tokenizer = BpeTokenizer::from_files(dir.join("vocab.json"), dir.join("merges.txt"), &config.tokenizer)?;
        let ids = tokenizer.encode(" the cat");
        println!("vocab size {}, ' the cat' -> {ids:?}", tokenizer.vocab_size());
        for id in ids {
            println!("  {id} -> {:?}", tokenizer.decode(id));
        }
    }

    Ok(())
}
