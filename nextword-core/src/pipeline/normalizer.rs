use std::collections::HashSet;
use std::sync::LazyLock;

use fancy_regex::Regex;

/// Any letter (`L*`) or decimal digit (`Nd`). Other numerics such as `½`,
/// `²` or `Ⅻ`, and combining marks, do not count.
static WORD_CHARACTER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[\p{L}\p{Nd}]").ok());

/// True when `s` contains at least one Unicode letter or decimal digit.
pub fn has_word_character(s: &str) -> bool {
	match WORD_CHARACTER.as_ref() {
		Some(re) => re.is_match(s).unwrap_or(false),
		None => s.chars().any(char::is_alphanumeric),
	}
}

/// Cleans raw engine candidates.
///
/// In order, for each entry:
/// - trims surrounding whitespace, dropping what is left empty
/// - drops punctuation-only entries (no Unicode letter or decimal digit)
/// - drops entries whose lowercase form is in `disallowed`
/// - keeps only the first entry of each lowercase form, with its casing
pub fn normalize<S: AsRef<str>>(raw: &[S], disallowed: &HashSet<String>) -> Vec<String> {
	let mut out = Vec::with_capacity(raw.len());
	let mut seen_lower = HashSet::new();
	for token in raw {
		let trimmed = token.as_ref().trim();
		if trimmed.is_empty() || !has_word_character(trimmed) {
			continue;
		}
		let lower = trimmed.to_lowercase();
		if disallowed.contains(&lower) {
			continue;
		}
		if seen_lower.insert(lower) {
			out.push(trimmed.to_owned());
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn none() -> HashSet<String> {
		HashSet::new()
	}

	#[test]
	fn test_drops_blank_punctuation_and_case_duplicates() {
		assert_eq!(normalize(&["Cat", "cat", "  ", "!!", "Dog"], &none()), vec!["Cat", "Dog"]);
	}

	#[test]
	fn test_trims_and_keeps_order() {
		assert_eq!(normalize(&[" b ", "a", "\tc\n"], &none()), vec!["b", "a", "c"]);
	}

	#[test]
	fn test_unicode_letters_and_digits_are_words() {
		assert_eq!(normalize(&["日本", "٣", "…", "¿?", "Ωmega"], &none()), vec!["日本", "٣", "Ωmega"]);
	}

	#[test]
	fn test_other_numerics_and_lone_marks_are_not_words() {
		assert!(normalize(&["½", "²", "①", "Ⅻ", "\u{0903}"], &none()).is_empty());
		// a mark attached to a letter is still a word
		assert_eq!(normalize(&["नमः", "x²"], &none()), vec!["नमः", "x²"]);
	}

	#[test]
	fn test_has_word_character() {
		assert!(has_word_character("a"));
		assert!(has_word_character("٣"));
		assert!(has_word_character(" 日"));
		assert!(!has_word_character("¾"));
		assert!(!has_word_character("…!?"));
		assert!(!has_word_character(""));
	}

	#[test]
	fn test_disallowed_uses_lowercase_form() {
		let disallowed: HashSet<String> = ["the".to_owned()].into_iter().collect();
		assert_eq!(normalize(&["The", "cat", "THE"], &disallowed), vec!["cat"]);
	}

	#[test]
	fn test_first_casing_wins() {
		assert_eq!(normalize(&["!!", "Hi", "hi", "HI"], &none()), vec!["Hi"]);
		assert_eq!(normalize(&[String::from("hI"), String::from("Hi")], &none()), vec!["hI"]);
	}
}
