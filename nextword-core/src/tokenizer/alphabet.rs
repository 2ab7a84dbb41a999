use std::collections::HashMap;
use std::sync::LazyLock;

/// Bijection between the 256 byte values and 256 printable characters.
///
/// Printable ASCII and most of Latin-1 map to themselves; the remaining 68
/// bytes (controls, space, soft hyphen, ...) are shifted to `U+0100..`.
/// Space (0x20) therefore becomes `'Ġ'` (U+0120), the marker found in
/// GPT-2 style vocabularies.
#[derive(Debug)]
pub struct ByteAlphabet {
	encoder: [char; 256],
	decoder: HashMap<char, u8>,
}

static BYTE_ALPHABET: LazyLock<ByteAlphabet> = LazyLock::new(ByteAlphabet::build);

impl ByteAlphabet {
	/// Returns the process-wide alphabet.
	pub fn get() -> &'static ByteAlphabet {
		&BYTE_ALPHABET
	}

	fn build() -> Self {
		let mut bytes: Vec<u8> = (b'!'..=b'~').chain(0xA1..=0xAC).chain(0xAE..=0xFF).collect();
		let mut points: Vec<u32> = bytes.iter().map(|&b| b as u32).collect();
		let mut shifted = 0;
		for b in 0..=255u8 {
			if !bytes.contains(&b) {
				bytes.push(b);
				points.push(256 + shifted);
				shifted += 1;
			}
		}

		let mut encoder = ['\0'; 256];
		let mut decoder = HashMap::with_capacity(256);
		for (b, cp) in bytes.into_iter().zip(points) {
			// cp < 324, always a valid scalar value
			let c = char::from_u32(cp).unwrap_or('\0');
			encoder[b as usize] = c;
			decoder.insert(c, b);
		}
		Self { encoder, decoder }
	}

	/// Maps one byte to its printable symbol.
	pub fn symbol(&self, byte: u8) -> char {
		self.encoder[byte as usize]
	}

	/// Maps a printable symbol back to its byte, if it belongs to the alphabet.
	pub fn byte(&self, symbol: char) -> Option<u8> {
		self.decoder.get(&symbol).copied()
	}

	/// Maps every byte of `text` to its symbol.
	pub fn encode(&self, text: &str) -> String {
		text.bytes().map(|b| self.symbol(b)).collect()
	}

	/// Maps symbols back to raw bytes.
	///
	/// Characters outside the alphabet are skipped.
	pub fn decode_into(&self, symbols: &str, out: &mut Vec<u8>) {
		out.extend(symbols.chars().filter_map(|c| self.byte(c)));
	}

	/// Iterates over `(byte, symbol)` for all 256 bytes.
	pub fn iter(&self) -> impl Iterator<Item = (u8, char)> + '_ {
		self.encoder.iter().enumerate().map(|(b, &c)| (b as u8, c))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn test_alphabet_is_a_bijection() {
		let alphabet = ByteAlphabet::get();
		let symbols: HashSet<char> = alphabet.iter().map(|(_, c)| c).collect();
		assert_eq!(symbols.len(), 256);
		for (b, c) in alphabet.iter() {
			assert_eq!(alphabet.byte(c), Some(b));
			assert!(!c.is_control() && !c.is_whitespace(), "{c:?} is not printable");
		}
	}

	#[test]
	fn test_known_symbols() {
		let alphabet = ByteAlphabet::get();
		assert_eq!(alphabet.symbol(b'a'), 'a');
		assert_eq!(alphabet.symbol(b' '), 'Ġ');
		assert_eq!(alphabet.symbol(b'\n'), 'Ċ');
		assert_eq!(alphabet.symbol(0), 'Ā');
	}

	#[test]
	fn test_encode_decode_non_ascii() {
		let alphabet = ByteAlphabet::get();
		let text = "héllo\tмир 🐱";
		let encoded = alphabet.encode(text);
		assert_eq!(encoded.chars().count(), text.len());
		let mut bytes = Vec::new();
		alphabet.decode_into(&encoded, &mut bytes);
		assert_eq!(bytes, text.as_bytes());
	}
}
