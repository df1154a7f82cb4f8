//! # subroute-std
//!
//! Standard implementations for the subroute subject router.
//!
//! This crate provides:
//! - **Pattern matching**: [`routing::translate`], [`routing::Trie`]
//! - **Rank-ordered dispatch**: [`RouterBuilder`], [`Router`]
//! - **Task execution**: [`Executor`], [`TokioExecutor`], [`TaskHandle`]
//! - **Testing utilities**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use subroute_core;

// Modules
pub mod router;
pub mod routing;
pub mod testing;

pub use router::{
    Executor, Lookup, RecoverFn, Router, RouterBuilder, ServeStats, TaskHandle, TokioExecutor,
};
