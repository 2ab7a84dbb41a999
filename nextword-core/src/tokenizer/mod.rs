//! Byte-level BPE tokenizer.
//!
//! - [`ByteAlphabet`]: fixed byte <-> printable symbol bijection
//! - [`Vocabulary`] / [`MergeTable`]: static tokenizer data
//! - [`BpeTokenizer`]: text <-> token ids

mod alphabet;
mod bpe;
mod vocabulary;

pub use alphabet::ByteAlphabet;
pub use bpe::{BpeTokenizer, Token};
pub use vocabulary::{MergeTable, Vocabulary};
