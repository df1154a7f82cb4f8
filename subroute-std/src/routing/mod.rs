//! Subject matching primitives.
//!
//! - [`pattern`]: rewriting of pub/sub wildcard syntax into the trie grammar
//! - [`trie`]: the per-rank radix tree doing the actual matching

pub mod pattern;
pub mod trie;

pub use pattern::{CATCH_ALL_PARAM, SEPARATOR, count_params, translate};
pub use trie::{Match, Trie};
