//! Testing utilities for subroute.
//!
//! This module provides handlers and an executor that make router behaviour
//! observable and deterministic in tests.
//!
//! # Features
//!
//! - [`RecordingHandler`]: Records every request it receives
//! - [`CountingHandler`]: Counts invocations
//! - [`PanickingHandler`] / [`FailingHandler`]: Exercise failure paths
//! - [`InlineExecutor`]: Runs handler tasks on the dispatching thread

use crate::router::Executor;
use futures::{
    StreamExt,
    channel::mpsc,
    executor::block_on,
    future::BoxFuture,
    lock::Mutex as AsyncMutex,
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use subroute_core::{BoxError, Handler, Message, Rank, Request, SpawnError};

// ============================================================================
// Recording Handler
// ============================================================================

/// One request as seen by a [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Subject of the dispatched message.
    pub subject: String,
    /// Captured parameters as `(key, value)`, in order.
    pub params: Vec<(String, String)>,
    /// Rank of the route that matched.
    pub rank: Rank,
}

impl Invocation {
    fn of<M: Message, P>(req: &Request<M, P>) -> Self {
        Self {
            subject: req.subject().to_owned(),
            params: req
                .params()
                .iter()
                .map(|p| (p.key().to_owned(), p.value().to_owned()))
                .collect(),
            rank: req.rank(),
        }
    }

    /// Parameters as borrowed pairs, handy for comparisons.
    pub fn param_pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// A handler that records all requests it receives.
///
/// Clones share the same record, so keep one clone and register the other.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::new();
/// builder.register("user.*", 1, recorder.clone())?;
///
/// router.dispatch(msg)?;
/// let seen = recorder.recv().await.unwrap();
/// assert_eq!(seen.param_pairs(), [("p1", "gopher")]);
/// ```
#[derive(Clone)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<Invocation>>>,
    tx: mpsc::UnboundedSender<Invocation>,
    rx: Arc<AsyncMutex<mpsc::UnboundedReceiver<Invocation>>>,
}

impl RecordingHandler {
    /// Create an empty recorder.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded();
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            tx,
            rx: Arc::new(AsyncMutex::new(rx)),
        }
    }

    /// Get a clone of the recorded invocations.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    /// Get the number of recorded invocations.
    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Wait for the next invocation not yet received through this method.
    pub async fn recv(&self) -> Option<Invocation> {
        self.rx.lock().await.next().await
    }
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message, P: Send + 'static> Handler<M, P> for RecordingHandler {
    type Output = ();

    async fn call(&self, req: Request<M, P>) {
        let invocation = Invocation::of(&req);
        self.calls.lock().push(invocation.clone());
        let _ = self.tx.unbounded_send(invocation);
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts how often it ran.
#[derive(Clone, Default)]
pub struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of invocations.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<M: Message, P: Send + 'static> Handler<M, P> for CountingHandler {
    type Output = ();

    async fn call(&self, _req: Request<M, P>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Failure Handlers
// ============================================================================

/// A handler that always panics with the given message.
#[derive(Clone)]
pub struct PanickingHandler {
    message: &'static str,
}

impl PanickingHandler {
    /// Panic with `message` on every call.
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl<M: Message, P: Send + 'static> Handler<M, P> for PanickingHandler {
    type Output = ();

    async fn call(&self, _req: Request<M, P>) {
        panic!("{}", self.message);
    }
}

/// A handler that always returns an error with the given message.
#[derive(Clone)]
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    /// Fail with `message` on every call.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<M: Message, P: Send + 'static> Handler<M, P> for FailingHandler {
    type Output = Result<(), BoxError>;

    async fn call(&self, _req: Request<M, P>) -> Self::Output {
        Err(self.message.clone().into())
    }
}

// ============================================================================
// Inline Executor
// ============================================================================

/// Runs each handler task to completion before `dispatch` returns.
///
/// Panics that are not recovered propagate out of `dispatch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError> {
        block_on(task);
        Ok(())
    }
}
