//! Where matched handlers run.
//!
//! Dispatch never awaits a handler. It wraps the invocation into a
//! `'static` task and hands it to an [`Executor`], which decides where and
//! when the task runs.

use futures::future::BoxFuture;
use std::fmt;
use subroute_core::SpawnError;
use tokio::runtime::Handle;

/// Spawns handler tasks.
///
/// Any `Fn(BoxFuture<'static, ()>)` closure is an executor that always
/// accepts, which makes it easy to plug in another runtime:
///
/// ```rust,ignore
/// let exec = |task| { async_std::task::spawn(task); };
/// builder.executor(exec);
/// ```
pub trait Executor: Send + Sync + 'static {
    /// Run `task` to completion, independently of the caller.
    ///
    /// A refused task is dropped without being polled.
    fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError>;
}

impl<F> Executor for F
where
    F: Fn(BoxFuture<'static, ()>) + Send + Sync + 'static,
{
    fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError> {
        (self)(task);
        Ok(())
    }
}

/// Spawns onto a tokio runtime.
///
/// Without a handle, tasks go to the runtime the dispatching thread runs
/// in. Dispatching from outside any runtime then refuses the task instead
/// of panicking the way [`tokio::spawn`] would.
#[derive(Clone, Default)]
pub struct TokioExecutor {
    handle: Option<Handle>,
}

impl TokioExecutor {
    /// Spawn onto the ambient runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn onto the runtime behind `handle`, from any thread.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Capture the ambient runtime, if there is one.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::with_handle)
    }
}

impl Executor for TokioExecutor {
    fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError> {
        match &self.handle {
            Some(handle) => drop(handle.spawn(task)),
            None => {
                let handle =
                    Handle::try_current().map_err(|err| SpawnError::new(err.to_string()))?;
                drop(handle.spawn(task));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TokioExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioExecutor")
            .field("pinned", &self.handle.is_some())
            .finish()
    }
}
