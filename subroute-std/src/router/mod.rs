//! # Rank-ordered router
//!
//! Routing happens in two explicit phases:
//!
//! 1. **Open**: a [`RouterBuilder`] collects `(pattern, rank, handler)`
//!    registrations. Each rank gets its own trie.
//! 2. **Serving**: [`RouterBuilder::seal`] freezes the ranks into ascending
//!    order and returns a [`Router`]. Dispatch probes the tries in that
//!    order and spawns the handler of the first match on an [`Executor`].
//!
//! A sealed router never sees new routes. To add some, go back through
//! [`Router::into_builder`] and seal again.

mod builder;
mod dispatch;
mod executor;
mod route;
mod serve;
mod task;

pub use builder::RouterBuilder;
pub use dispatch::Router;
pub use executor::{Executor, TokioExecutor};
pub use route::Lookup;
pub use serve::ServeStats;
pub use task::{RecoverFn, TaskHandle};
