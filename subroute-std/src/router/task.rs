//! Handler task construction and panic containment.

use crate::router::executor::Executor;
use futures::{FutureExt, channel::oneshot};
use std::{
    fmt,
    future::Future,
    panic::{AssertUnwindSafe, resume_unwind},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use subroute_core::{DynHandler, HandlerError, Message, Rank, Request};

/// Callback invoked with the message and the failure of its handler.
pub type RecoverFn<M> = Arc<dyn Fn(&M, &HandlerError) + Send + Sync>;

/// Sending half of a [`TaskHandle`].
pub(crate) type Completion = oneshot::Sender<Result<(), HandlerError>>;

/// Completion of a handler task spawned by
/// [`Router::dispatch_tracked`](crate::router::Router::dispatch_tracked).
///
/// Resolves once the handler has finished. A panic resolves to
/// [`HandlerError::Panic`]; a task refused or dropped by its executor before
/// finishing resolves to [`HandlerError::Cancelled`]. Dropping the handle does not
/// affect the task.
pub struct TaskHandle {
    rank: Rank,
    done: oneshot::Receiver<Result<(), HandlerError>>,
}

impl TaskHandle {
    /// A handle for a task on `rank`, and the sender its outcome goes to.
    pub(crate) fn new(rank: Rank) -> (Completion, Self) {
        let (tx, done) = oneshot::channel();
        (tx, Self { rank, done })
    }

    /// Rank of the route whose handler is running.
    pub fn rank(&self) -> Rank {
        self.rank
    }
}

impl Future for TaskHandle {
    type Output = Result<(), HandlerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.done
            .poll_unpin(cx)
            .map(|outcome| outcome.unwrap_or(Err(HandlerError::Cancelled)))
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("rank", &self.rank)
            .finish_non_exhaustive()
    }
}

/// Run `handler` for `request` on `executor`.
///
/// The outcome goes to `recover` when it failed, and to `done` either way.
/// A task the executor refuses is reported like a failed handler and its
/// `done` resolves as cancelled.
pub(crate) fn launch<M, P>(
    executor: &dyn Executor,
    handler: Arc<dyn DynHandler<M, P>>,
    request: Request<M, P>,
    recover: Option<RecoverFn<M>>,
    done: Option<Completion>,
) where
    M: Message,
    P: Send + 'static,
{
    let rank = request.rank();
    let message = Arc::clone(request.shared_message());
    let on_refusal = recover.clone();

    let task = {
        let message = Arc::clone(&message);
        Box::pin(async move {
            let outcome = AssertUnwindSafe(handler.call_dyn(request))
                .catch_unwind()
                .await;

            let result = match outcome {
                Ok(Ok(())) => Ok(()),
                Ok(Err(source)) => Err(HandlerError::Failed(source)),
                Err(payload) => {
                    if recover.is_none() && done.is_none() {
                        // Nobody to report to: let the executor see it.
                        resume_unwind(payload);
                    }
                    Err(HandlerError::from_panic(payload.as_ref()))
                }
            };

            if let Err(err) = &result {
                report(&*message, rank, err, recover.as_ref());
            }
            if let Some(done) = done {
                let _ = done.send(result);
            }
        })
    };

    if let Err(refused) = executor.spawn(task) {
        report(&*message, rank, &HandlerError::Rejected(refused), on_refusal.as_ref());
    }
}

fn report<M: Message>(
    message: &M,
    rank: Rank,
    err: &HandlerError,
    recover: Option<&RecoverFn<M>>,
) {
    match recover {
        Some(recover) => recover(message, err),
        None => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                subject = message.subject(),
                %rank,
                error = %err,
                "handler failed"
            );
            #[cfg(not(feature = "tracing"))]
            let _ = rank;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{executor::block_on, future::BoxFuture};
    use parking_lot::Mutex;
    use subroute_core::{BoxError, SpawnError, SubjectMsg};

    type Msg = SubjectMsg;

    fn inline(task: BoxFuture<'static, ()>) {
        block_on(task)
    }

    fn request() -> Request<Msg> {
        Request::new(
            Arc::new(SubjectMsg::from_subject("orders.created")),
            None,
            None,
            Rank::MIN,
        )
    }

    fn handler<F>(f: F) -> Arc<dyn DynHandler<Msg, ()>>
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Arc::new(move |_req: Request<Msg>| {
            let out = f();
            async move { out }
        })
    }

    fn tracked(exec: &dyn Executor, handler: Arc<dyn DynHandler<Msg, ()>>) -> TaskHandle {
        let (done, handle) = TaskHandle::new(Rank::MIN);
        launch(exec, handler, request(), None, Some(done));
        handle
    }

    #[test]
    fn test_tracked_success() {
        let handle = tracked(&inline, handler(|| Ok(())));
        assert_eq!(handle.rank(), Rank::MIN);
        assert!(block_on(handle).is_ok());
    }

    #[test]
    fn test_tracked_failure_reaches_handle() {
        let handle = tracked(&inline, handler(|| Err("nope".into())));
        let err = block_on(handle).unwrap_err();
        assert!(matches!(err, HandlerError::Failed(ref e) if e.to_string() == "nope"));
    }

    #[test]
    fn test_tracked_panic_is_reported() {
        let handle = tracked(&inline, handler(|| panic!("boom")));
        assert!(matches!(
            block_on(handle),
            Err(HandlerError::Panic(ref m)) if m == "boom"
        ));
    }

    #[test]
    fn test_panic_goes_to_recover() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let recover: RecoverFn<Msg> = Arc::new(move |msg: &Msg, err: &HandlerError| {
            sink.lock().push((msg.subject().to_owned(), err.is_panic()));
        });

        launch(
            &inline,
            handler(|| panic!("boom")),
            request(),
            Some(recover),
            None,
        );
        assert_eq!(*seen.lock(), vec![("orders.created".to_owned(), true)]);
    }

    #[test]
    fn test_panic_without_recover_reaches_executor() {
        let result = std::panic::catch_unwind(|| {
            launch(&inline, handler(|| panic!("boom")), request(), None, None);
        });
        assert!(result.is_err());
    }

    struct Refusing;

    impl Executor for Refusing {
        fn spawn(&self, _task: BoxFuture<'static, ()>) -> Result<(), SpawnError> {
            Err(SpawnError::new("shutting down"))
        }
    }

    #[test]
    fn test_refused_task_goes_to_recover() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let recover: RecoverFn<Msg> = Arc::new(move |msg: &Msg, err: &HandlerError| {
            sink.lock().push((msg.subject().to_owned(), err.to_string()));
        });

        let (done, handle) = TaskHandle::new(Rank::MIN);
        launch(
            &Refusing,
            handler(|| Ok(())),
            request(),
            Some(recover),
            Some(done),
        );
        assert_eq!(
            *seen.lock(),
            vec![(
                "orders.created".to_owned(),
                "handler task was not started: shutting down".to_owned()
            )]
        );
        assert!(matches!(block_on(handle), Err(HandlerError::Cancelled)));
    }

    #[test]
    fn test_refused_task_without_recover_does_not_panic() {
        launch(&Refusing, handler(|| Ok(())), request(), None, None);
    }

    #[test]
    fn test_dropped_task_is_cancelled() {
        let drop_it = |task: BoxFuture<'static, ()>| drop(task);
        let handle = tracked(&drop_it, handler(|| Ok(())));
        assert!(matches!(
            block_on(handle),
            Err(HandlerError::Cancelled)
        ));
    }
}
