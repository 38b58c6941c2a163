//! Herbarium Search
//!
//! Common-name search over indexed databases. Names and queries go
//! through the same accent-folding tokenizer; matching is
//! whole-name-first, then token coverage.

mod index;
mod tokenizer;

pub use index::SearchIndex;
pub use tokenizer::{normalize, tokenize};
