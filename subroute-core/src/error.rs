//! Error types for subroute.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`SubrouteError`] - Top-level error type for all subroute operations
//! - [`ConfigError`] - Errors while registering routes
//! - [`InsertError`] - Why a pattern could not be inserted into a trie
//! - [`RouteNotFound`] - No registered pattern matched a subject
//! - [`HandlerError`] - A dispatched handler failed on its task
//! - [`SpawnError`] - An executor could not start a handler task

use std::any::Any;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all subroute operations.
#[derive(Error, Debug)]
pub enum SubrouteError {
    /// A route could not be registered.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No route matched the dispatched subject.
    #[error(transparent)]
    NotFound(#[from] RouteNotFound),

    /// A handler failed.
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Errors raised while registering a route.
///
/// These are programmer errors: registration stops at the first one and the
/// router is left exactly as it was before the failing call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The rank is outside `1..=255`.
    #[error("rank must be within 1..=255, got {0}")]
    InvalidRank(u32),

    /// The pattern is malformed or conflicts with an existing route.
    #[error("invalid route `{pattern}`: {source}")]
    Route {
        /// The pattern as passed by the caller.
        pattern: String,
        /// What went wrong while inserting it.
        source: InsertError,
    },
}

impl ConfigError {
    /// Attach the offending pattern to an insertion failure.
    pub fn route(pattern: impl Into<String>, source: InsertError) -> Self {
        ConfigError::Route {
            pattern: pattern.into(),
            source,
        }
    }
}

/// Reasons a translated pattern cannot be inserted into a trie.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// The pattern is empty.
    #[error("pattern must not be empty")]
    EmptyPattern,

    /// A `:` or `*` is not followed by a name.
    #[error("wildcards must be named with a non-empty name")]
    UnnamedWildcard,

    /// More than one wildcard in a single token, e.g. `:a:b`.
    #[error("only one wildcard per token is allowed, has `{0}`")]
    MultipleWildcards(String),

    /// Something follows the catch-all.
    #[error("catch-all is only allowed at the end of the pattern")]
    CatchAllNotLast,

    /// The catch-all is not preceded by a `.` separator.
    #[error("catch-all must follow a `.` separator")]
    CatchAllWithoutSeparator,

    /// A wildcard with another name is already registered at this position.
    #[error("wildcard `:{inserted}` conflicts with existing wildcard `:{existing}`")]
    WildcardConflict {
        /// Name already in the trie.
        existing: String,
        /// Name of the rejected wildcard.
        inserted: String,
    },

    /// A catch-all with another name is already registered at this position.
    #[error("catch-all `*{inserted}` conflicts with existing catch-all `*{existing}`")]
    CatchAllConflict {
        /// Name already in the trie.
        existing: String,
        /// Name of the rejected catch-all.
        inserted: String,
    },

    /// A catch-all would share its position with routes continuing past the
    /// same separator. Such patterns belong to different ranks.
    #[error("catch-all overlaps routes continuing past the same separator")]
    CatchAllOverlap,

    /// The exact pattern already has a handler.
    #[error("a handler is already registered for this pattern")]
    Duplicate,
}

/// No rank had a pattern matching the subject.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("404 NotFound: {subject}")]
pub struct RouteNotFound {
    subject: String,
}

impl RouteNotFound {
    /// Create a not-found error for `subject`.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// The subject that matched nothing.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Errors that can occur on a handler's task.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// The handler returned an error.
    #[error("handler failed: {0}")]
    Failed(#[source] BoxError),

    /// The executor refused the task, so the handler never ran.
    #[error("handler task was not started: {0}")]
    Rejected(#[from] SpawnError),

    /// The task was dropped before it finished, e.g. on runtime shutdown.
    #[error("handler task was cancelled")]
    Cancelled,
}

/// An executor could not accept a task, e.g. no async runtime is running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct SpawnError {
    reason: String,
}

impl SpawnError {
    /// Create a spawn failure described by `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why the task was refused.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl HandlerError {
    /// Build a [`HandlerError::Panic`] from a recovered panic payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        HandlerError::Panic(message)
    }

    /// Whether the handler panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, HandlerError::Panic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_reads_as_404() {
        let err = RouteNotFound::new("user.gopher");
        assert_eq!(err.to_string(), "404 NotFound: user.gopher");
        assert_eq!(err.subject(), "user.gopher");
    }

    #[test]
    fn test_config_error_names_pattern() {
        let err = ConfigError::route("user.>", InsertError::Duplicate);
        assert_eq!(
            err.to_string(),
            "invalid route `user.>`: a handler is already registered for this pattern"
        );
    }

    #[test]
    fn test_panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert!(matches!(
            HandlerError::from_panic(payload.as_ref()),
            HandlerError::Panic(ref m) if m == "boom"
        ));

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert!(matches!(
            HandlerError::from_panic(payload.as_ref()),
            HandlerError::Panic(ref m) if m == "owned boom"
        ));

        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert!(HandlerError::from_panic(payload.as_ref()).is_panic());
    }

    #[test]
    fn test_rejected_task_names_reason() {
        let err: HandlerError = SpawnError::new("no runtime").into();
        assert!(!err.is_panic());
        assert_eq!(err.to_string(), "handler task was not started: no runtime");
    }

    #[test]
    fn test_top_level_conversions() {
        let err: SubrouteError = ConfigError::InvalidRank(0).into();
        assert!(matches!(err, SubrouteError::Config(ConfigError::InvalidRank(0))));

        let err: SubrouteError = RouteNotFound::new("a.b").into();
        assert_eq!(err.to_string(), "404 NotFound: a.b");
    }
}
