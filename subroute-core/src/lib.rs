//! # subroute-core
//!
//! Core traits and value types for the subroute subject router.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! transport adapters and handler libraries that don't need the full
//! `subroute-std` router implementation.
//!
//! # Building Blocks
//!
//! ## Messages ([`Message`])
//!
//! Anything carrying a dot-delimited subject and an opaque reference to the
//! transport message it came from. The router only ever reads the subject.
//!
//! ## Parameters ([`Param`], [`Params`], [`ParamsPool`])
//!
//! Values captured by wildcards, in the left-to-right order the wildcards
//! appear in the matched pattern. Buffers are leased from a shared pool so a
//! warmed-up router dispatches without allocating parameter storage.
//!
//! ## Handlers ([`Handler`], [`DynHandler`], [`Request`])
//!
//! The terminal endpoint of a dispatch. A handler receives an owned
//! [`Request`] and runs on its own task; its output is converted with
//! [`IntoOutcome`] so failures travel as values, not panics.
//!
//! ## Ranks ([`Rank`])
//!
//! Caller-assigned priority in `1..=255`. Lower ranks are probed first.
//!
//! # Error Types
//!
//! - [`SubrouteError`] - Top-level error type
//! - [`ConfigError`] - Registration-time misuse
//! - [`InsertError`] - Pattern syntax and conflict causes
//! - [`RouteNotFound`] - Dispatch miss
//! - [`HandlerError`] - Handler task failures
//! - [`SpawnError`] - Executor refusals

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod handler;
mod message;
mod params;
mod pool;
mod rank;
mod response;

// Re-exports
pub use error::{
    BoxError, ConfigError, HandlerError, InsertError, RouteNotFound, SpawnError, SubrouteError,
};
pub use handler::{DynHandler, Handler, Request};
pub use message::{Message, SubjectMsg};
pub use params::{MATCHED_ROUTE_PATH_PARAM, Param, Params};
pub use pool::{ParamsPool, PooledParams};
pub use rank::Rank;
pub use response::IntoOutcome;
