use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::TokenizerError;

/// Bidirectional token <-> id mapping.
///
/// # Invariants
/// - ids are dense in `[0, len)`
/// - both directions are injective: one token per id, one id per token
#[derive(Debug, Clone)]
pub struct Vocabulary {
	token_to_id: HashMap<String, u32>,
	/// Indexed by id
	id_to_token: Vec<String>,
}

impl Vocabulary {
	/// Loads a `vocab.json` file (a JSON object mapping token to id).
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TokenizerError> {
		let json = fs::read_to_string(path)?;
		Self::from_json(&json)
	}

	/// Parses the JSON content of a vocabulary file.
	pub fn from_json(json: &str) -> Result<Self, TokenizerError> {
		let entries: HashMap<String, u32> = serde_json::from_str(json)?;
		Self::from_entries(entries)
	}

	/// Builds a vocabulary from `(token, id)` pairs, checking density and injectivity.
	pub fn from_entries<I, S>(entries: I) -> Result<Self, TokenizerError>
	where
		I: IntoIterator<Item = (S, u32)>,
		S: Into<String>,
	{
		let mut by_id: HashMap<u32, String> = HashMap::new();
		let mut token_to_id: HashMap<String, u32> = HashMap::new();

		for (token, id) in entries {
			let token = token.into();
			if let Some(first) = by_id.get(&id) {
				return Err(TokenizerError::DuplicateId { id, first: first.clone(), second: token });
			}
			// A repeated token key is impossible from a JSON object,
			// but pairs built by hand may contain one.
			if let Some(&first_id) = token_to_id.get(&token) {
				return Err(TokenizerError::DuplicateToken { token, first_id, second_id: id });
			}
			by_id.insert(id, token.clone());
			token_to_id.insert(token, id);
		}

		if by_id.is_empty() {
			return Err(TokenizerError::EmptyVocabulary);
		}

		let size = by_id.len();
		let mut id_to_token = Vec::with_capacity(size);
		for id in 0..size as u32 {
			match by_id.remove(&id) {
				Some(token) => id_to_token.push(token),
				None => return Err(TokenizerError::NonDenseVocabulary { missing: id, size }),
			}
		}

		Ok(Self { token_to_id, id_to_token })
	}

	/// Number of distinct ids.
	pub fn len(&self) -> usize {
		self.id_to_token.len()
	}

	/// Always false once constructed; kept for API symmetry with `len`.
	pub fn is_empty(&self) -> bool {
		self.id_to_token.is_empty()
	}

	pub fn id(&self, token: &str) -> Option<u32> {
		self.token_to_id.get(token).copied()
	}

	pub fn token(&self, id: u32) -> Option<&str> {
		self.id_to_token.get(id as usize).map(String::as_str)
	}

	/// Iterates over `(id, token)` in id order.
	pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
		self.id_to_token.iter().enumerate().map(|(id, t)| (id as u32, t.as_str()))
	}
}

/// Ordered list of byte-pair merge rules.
///
/// The position of a rule is its rank: lower rank merges first.
///
/// # Invariants
/// - no pair appears twice, so ranks are unique
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
	rules: Vec<(String, String)>,
}

impl MergeTable {
	/// Loads a `merges.txt` file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TokenizerError> {
		let text = fs::read_to_string(path)?;
		Self::parse(&text)
	}

	/// Parses merge rules, one `left right` pair per line.
	///
	/// - A first line starting with `#` is the version header and is skipped
	/// - Blank lines are skipped
	/// - Any other line must hold exactly two symbols separated by one space
	pub fn parse(text: &str) -> Result<Self, TokenizerError> {
		let mut rules = Vec::new();
		for (index, raw) in text.lines().enumerate() {
			if index == 0 && raw.starts_with('#') {
				continue;
			}
			let line = raw.trim_end_matches('\r');
			if line.trim().is_empty() {
				continue;
			}
			let mut parts = line.split(' ');
			match (parts.next(), parts.next(), parts.next()) {
				(Some(left), Some(right), None) if !left.is_empty() && !right.is_empty() => {
					rules.push((left.to_owned(), right.to_owned()));
				}
				_ => {
					return Err(TokenizerError::MalformedMerge {
						line: index + 1,
						content: line.to_owned(),
					});
				}
			}
		}
		Self::from_rules(rules)
	}

	/// Builds a table from rules already in rank order.
	pub fn from_rules<I, L, R>(rules: I) -> Result<Self, TokenizerError>
	where
		I: IntoIterator<Item = (L, R)>,
		L: Into<String>,
		R: Into<String>,
	{
		let rules: Vec<(String, String)> = rules.into_iter().map(|(l, r)| (l.into(), r.into())).collect();
		let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(rules.len());
		for (rank, (left, right)) in rules.iter().enumerate() {
			if !seen.insert((left.as_str(), right.as_str())) {
				return Err(TokenizerError::DuplicateMerge {
					left: left.clone(),
					right: right.clone(),
					rank,
				});
			}
		}
		Ok(Self { rules })
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	/// Iterates over `(rank, left, right)` in rank order.
	pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &str)> {
		self.rules.iter().enumerate().map(|(rank, (l, r))| (rank, l.as_str(), r.as_str()))
	}
}
