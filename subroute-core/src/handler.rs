//! # Handlers
//!
//! The terminal endpoint of a dispatch. A matched handler runs on its own
//! task and receives a fully owned [`Request`]: the shared message, the
//! parameters captured by the match and the optional payload passed along
//! with the dispatch.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `|req: Request<Msg>| async move { ... }`
//! 2. **Struct implementation**: `impl Handler<Msg> for MyHandler`
//!
//! The router stores handlers as `Arc<dyn DynHandler<M, P>>`; every
//! [`Handler`] is a [`DynHandler`] through a blanket implementation.

use crate::{
    error::BoxError,
    message::Message,
    params::Param,
    pool::PooledParams,
    rank::Rank,
    response::IntoOutcome,
};
use futures::future::BoxFuture;
use std::{future::Future, sync::Arc};

/// Everything a handler receives for one dispatched message.
pub struct Request<M, P = ()> {
    message: Arc<M>,
    params: Option<PooledParams>,
    payload: Option<P>,
    rank: Rank,
}

impl<M: Message, P> Request<M, P> {
    /// Assemble a request. The router does this for every match.
    pub fn new(
        message: Arc<M>,
        params: Option<PooledParams>,
        payload: Option<P>,
        rank: Rank,
    ) -> Self {
        Self {
            message,
            params,
            payload,
            rank,
        }
    }

    /// The dispatched message.
    pub fn message(&self) -> &M {
        &self.message
    }

    /// The dispatched message, shared.
    pub fn shared_message(&self) -> &Arc<M> {
        &self.message
    }

    /// Subject of the dispatched message.
    pub fn subject(&self) -> &str {
        self.message.subject()
    }

    /// Captured parameters, in pattern order. Empty when the route has no
    /// wildcards.
    pub fn params(&self) -> &[Param] {
        match &self.params {
            Some(params) => params.as_slice(),
            None => &[],
        }
    }

    /// Value of the first parameter named `name`, or `""`.
    pub fn param(&self, name: &str) -> &str {
        self.params
            .as_ref()
            .map_or("", |params| params.by_name(name))
    }

    /// Pattern of the matched route, when recorded at registration.
    pub fn matched_route_path(&self) -> &str {
        self.params
            .as_ref()
            .map_or("", |params| params.matched_route_path())
    }

    /// The payload passed along with the dispatch.
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// Take the payload out of the request.
    pub fn take_payload(&mut self) -> Option<P> {
        self.payload.take()
    }

    /// Rank of the route that matched.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Split into message, parameter buffer and payload.
    pub fn into_parts(self) -> (Arc<M>, Option<PooledParams>, Option<P>) {
        (self.message, self.params, self.payload)
    }
}

/// The terminal endpoint of a dispatch.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle requests for `{M}`",
    label = "missing `Handler<{M}>` implementation",
    note = "Handlers take a `Request<{M}, P>` and return `()` or a `Result`."
)]
pub trait Handler<M: Message, P = ()>: Send + Sync + 'static {
    /// The output of the handler, usually `()` or a `Result`.
    type Output: IntoOutcome;

    /// Executes the handler logic.
    fn call(&self, request: Request<M, P>) -> impl Future<Output = Self::Output> + Send;
}

// Blanket impl for closures
impl<M, P, F, Fut> Handler<M, P> for F
where
    M: Message,
    P: Send + 'static,
    F: Fn(Request<M, P>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send,
    Fut::Output: IntoOutcome,
{
    type Output = Fut::Output;

    fn call(&self, request: Request<M, P>) -> impl Future<Output = Self::Output> + Send {
        (self)(request)
    }
}

/// Object-safe version of [`Handler`].
pub trait DynHandler<M, P>: Send + Sync + 'static {
    /// Executes the handler and converts its output.
    fn call_dyn(&self, request: Request<M, P>) -> BoxFuture<'_, Result<(), BoxError>>;
}

impl<M, P, H> DynHandler<M, P> for H
where
    M: Message,
    P: Send + 'static,
    H: Handler<M, P>,
{
    fn call_dyn(&self, request: Request<M, P>) -> BoxFuture<'_, Result<(), BoxError>> {
        Box::pin(async move { self.call(request).await.into_outcome() })
    }
}
