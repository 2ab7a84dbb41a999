use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use fancy_regex::Regex;
use log::{debug, warn};

use super::alphabet::ByteAlphabet;
use super::vocabulary::{MergeTable, Vocabulary};
use crate::config::TokenizerConfig;
use crate::error::TokenizerError;

/// GPT-2 pretokenization: contractions, then runs of letters, digits, or
/// other non-space characters, each keeping one leading space.
const PRETOKENIZE_PATTERN: &str = r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// Placeholder for a byte whose symbol is not in the vocabulary.
/// No merge rule can match it; it becomes the unknown id on output.
const MISSING: u32 = u32::MAX;

/// A token id together with its decoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	pub id: u32,
	pub text: String,
}

#[derive(Debug, Clone, Copy)]
struct Merge {
	rank: u32,
	merged: u32,
}

/// Byte-level BPE tokenizer.
///
/// Immutable once built; `encode` and `decode` take `&self` and can be
/// called from several threads. The only mutable state is the per-word
/// memoization cache, kept behind an `RwLock`.
#[derive(Debug)]
pub struct BpeTokenizer {
	vocab: Vocabulary,
	/// (left id, right id) -> rank and merged id
	merges: HashMap<(u32, u32), Merge>,
	/// Byte value -> id of its single-symbol token, or `MISSING`
	byte_ids: [u32; 256],
	unknown_id: u32,
	pretokenizer: Regex,
	cache: RwLock<HashMap<String, Vec<u32>>>,
	cache_capacity: usize,
}

impl BpeTokenizer {
	/// Builds a tokenizer from a vocabulary and its merge table.
	///
	/// # Errors
	/// - [`TokenizerError::MissingSymbol`] if a rule's left, right, or merged
	///   symbol is absent from the vocabulary
	/// - [`TokenizerError::Regex`] if the pretokenizer fails to compile
	pub fn new(vocab: Vocabulary, merges: MergeTable, config: &TokenizerConfig) -> Result<Self, TokenizerError> {
		let mut merge_ids = HashMap::with_capacity(merges.len());
		for (rank, left, right) in merges.iter() {
			let lookup = |symbol: &str| {
				vocab.id(symbol).ok_or_else(|| TokenizerError::MissingSymbol { symbol: symbol.to_owned(), rank })
			};
			let left_id = lookup(left)?;
			let right_id = lookup(right)?;
			let merged = lookup(&format!("{left}{right}"))?;
			merge_ids.insert((left_id, right_id), Merge { rank: rank as u32, merged });
		}

		let alphabet = ByteAlphabet::get();
		let mut byte_ids = [MISSING; 256];
		let mut missing = 0;
		for (b, symbol) in alphabet.iter() {
			match vocab.id(symbol.encode_utf8(&mut [0; 4])) {
				Some(id) => byte_ids[b as usize] = id,
				None => missing += 1,
			}
		}

		let unknown_id = ["<unk>", "<|endoftext|>"].iter().find_map(|t| vocab.id(t)).unwrap_or(0);
		if missing > 0 {
			warn!("{missing} byte-level symbols are absent from the vocabulary; they encode as id {unknown_id}");
		}

		Ok(Self {
			vocab,
			merges: merge_ids,
			byte_ids,
			unknown_id,
			pretokenizer: Regex::new(PRETOKENIZE_PATTERN)?,
			cache: RwLock::new(HashMap::new()),
			cache_capacity: config.cache_capacity,
		})
	}

	/// Loads `vocab.json` and `merges.txt` and builds the tokenizer.
	pub fn from_files<V, M>(vocab_path: V, merges_path: M, config: &TokenizerConfig) -> Result<Self, TokenizerError>
	where
		V: AsRef<Path>,
		M: AsRef<Path>,
	{
		let vocab = Vocabulary::load(vocab_path)?;
		let merges = MergeTable::load(merges_path)?;
		Self::new(vocab, merges, config)
	}

	/// Number of distinct ids.
	pub fn vocab_size(&self) -> usize {
		self.vocab.len()
	}

	/// Id emitted for a byte whose symbol the vocabulary lacks.
	pub fn unknown_id(&self) -> u32 {
		self.unknown_id
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocab
	}

	/// Encodes text into token ids.
	pub fn encode(&self, text: &str) -> Vec<u32> {
		let mut ids = Vec::with_capacity(text.len() / 2);
		for piece in self.pretokenize(text) {
			self.encode_piece(piece, &mut ids);
		}
		ids
	}

	/// Decodes a single id. Unknown ids decode to an empty string.
	pub fn decode(&self, id: u32) -> String {
		self.decode_sequence(&[id])
	}

	/// Decodes a sequence of ids.
	///
	/// Bytes of all ids are concatenated before UTF-8 reassembly, so a
	/// character split across two tokens is restored. Invalid UTF-8 is
	/// replaced with U+FFFD.
	pub fn decode_sequence(&self, ids: &[u32]) -> String {
		let alphabet = ByteAlphabet::get();
		let mut bytes = Vec::with_capacity(ids.len() * 4);
		for &id in ids {
			match self.vocab.token(id) {
				Some(symbols) => alphabet.decode_into(symbols, &mut bytes),
				None => debug!("decode: id {id} is outside the vocabulary"),
			}
		}
		String::from_utf8_lossy(&bytes).into_owned()
	}

	/// Returns the token for `id`, or `None` if the id is out of range.
	pub fn token(&self, id: u32) -> Option<Token> {
		self.vocab.token(id)?;
		Some(Token { id, text: self.decode(id) })
	}

	/// Splits text into pretokenized pieces.
	fn pretokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
		let mut pieces = Vec::new();
		let mut last = 0;
		for found in self.pretokenizer.find_iter(text) {
			match found {
				Ok(m) => {
					pieces.push(m.as_str());
					last = m.end();
				}
				Err(e) => {
					// Backtracking limit: keep the rest as one piece
					warn!("pretokenizer failed at byte {last}: {e}");
					pieces.push(&text[last..]);
					break;
				}
			}
		}
		pieces
	}

	fn encode_piece(&self, piece: &str, out: &mut Vec<u32>) {
		if self.cache_capacity > 0 {
			if let Ok(cache) = self.cache.read() {
				if let Some(ids) = cache.get(piece) {
					out.extend_from_slice(ids);
					return;
				}
			}
		}

		let symbols: Vec<u32> = piece.bytes().map(|b| self.byte_ids[b as usize]).collect();
		let ids: Vec<u32> = self
			.merge(symbols)
			.into_iter()
			.map(|id| if id == MISSING { self.unknown_id } else { id })
			.collect();
		out.extend_from_slice(&ids);

		if self.cache_capacity > 0 {
			if let Ok(mut cache) = self.cache.write() {
				if cache.len() >= self.cache_capacity {
					cache.clear();
				}
				cache.insert(piece.to_owned(), ids);
			}
		}
	}

	/// Applies merge rules to one word until none matches.
	///
	/// Each round picks the lowest-rank pair present and merges every
	/// non-overlapping occurrence of it, left to right.
	fn merge(&self, mut parts: Vec<u32>) -> Vec<u32> {
		while parts.len() > 1 {
			let best = parts
				.windows(2)
				.filter_map(|w| self.merges.get(&(w[0], w[1])).map(|m| (w[0], w[1], *m)))
				.min_by_key(|(_, _, m)| m.rank);
			let Some((left, right, merge)) = best else {
				break;
			};

			let mut next = Vec::with_capacity(parts.len());
			let mut i = 0;
			while i < parts.len() {
				if i + 1 < parts.len() && parts[i] == left && parts[i + 1] == right {
					next.push(merge.merged);
					i += 2;
				} else {
					next.push(parts[i]);
					i += 1;
				}
			}
			parts = next;
		}
		parts
	}
}
