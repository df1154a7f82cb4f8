//! Serving phase.

use crate::{
    router::{
        RouterBuilder,
        executor::Executor,
        route::{Lookup, Route, allowed_in, lookup_in},
        task::{Completion, RecoverFn, TaskHandle, launch},
    },
    routing::Trie,
};
use std::{fmt, sync::Arc};
use subroute_core::{Message, ParamsPool, Rank, Request, RouteNotFound};

/// A sealed, rank-ordered subject router.
///
/// Created by [`RouterBuilder::seal`]. Every method takes `&self`, so a
/// router is shared between dispatching tasks behind an `Arc`.
///
/// A subject is matched against the trie of each rank in ascending order.
/// The first rank with a match wins and its handler is spawned; lower
/// priority ranks are never consulted for that message.
pub struct Router<M, P = ()> {
    /// Ascending by rank.
    pub(crate) trees: Vec<(Rank, Trie<Route<M, P>>)>,
    pub(crate) pool: Arc<ParamsPool>,
    pub(crate) save_matched_route_path: bool,
    pub(crate) recover: Option<RecoverFn<M>>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) global_allowed: String,
}

impl<M, P> Router<M, P>
where
    M: Message,
    P: Send + 'static,
{
    /// Start collecting routes.
    pub fn builder() -> RouterBuilder<M, P> {
        RouterBuilder::new()
    }

    /// Reopen for registration. Rank order is recomputed on the next seal.
    pub fn into_builder(self) -> RouterBuilder<M, P> {
        RouterBuilder {
            trees: self.trees.into_iter().collect(),
            pool: self.pool,
            save_matched_route_path: self.save_matched_route_path,
            recover: self.recover,
            executor: self.executor,
            global_allowed: self.global_allowed,
        }
    }

    /// Registered ranks, ascending.
    pub fn ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        self.trees.iter().map(|(rank, _)| *rank)
    }

    /// Number of registered routes across all ranks.
    pub fn route_count(&self) -> usize {
        self.trees.iter().map(|(_, trie)| trie.len()).sum()
    }

    /// The shared parameter buffer pool.
    pub fn pool(&self) -> &Arc<ParamsPool> {
        &self.pool
    }

    /// Probe the trie of a single rank, skipping rank ordering.
    ///
    /// Meant for embedding the router into another dispatch loop.
    pub fn lookup(&self, subject: &str, rank: u32) -> Option<Lookup<'_, M, P>> {
        let rank = Rank::new(rank).ok()?;
        let i = self.trees.binary_search_by_key(&rank, |(r, _)| *r).ok()?;
        lookup_in(&self.trees[i].1, &self.pool, subject)
    }

    /// Ranks other than `requesting` with a route for `subject`, ascending
    /// and comma separated, e.g. `"1, 2, 4"`.
    ///
    /// The subject `"*"` asks for the server-wide rank list: computed fresh
    /// without a requesting rank and served from the cache otherwise.
    /// A requesting rank outside `1..=255` counts as none.
    pub fn allowed_ranks(&self, subject: &str, requesting: Option<u32>) -> String {
        allowed_in(
            self.trees.iter().map(|(rank, trie)| (*rank, trie)),
            subject,
            requesting.and_then(|rank| Rank::new(rank).ok()),
            &self.global_allowed,
        )
    }

    /// Route `message` to the first matching rank and spawn its handler.
    ///
    /// Returns as soon as the task is handed to the executor.
    pub fn dispatch(&self, message: impl Into<Arc<M>>) -> Result<Rank, RouteNotFound> {
        self.submit(message.into(), None, |rank| (None, rank))
    }

    /// Like [`dispatch`](Self::dispatch), handing `payload` to the handler.
    pub fn dispatch_with_payload(
        &self,
        message: impl Into<Arc<M>>,
        payload: P,
    ) -> Result<Rank, RouteNotFound> {
        self.submit(message.into(), Some(payload), |rank| (None, rank))
    }

    /// Like [`dispatch`](Self::dispatch), returning a handle that resolves
    /// to the handler's outcome.
    pub fn dispatch_tracked(
        &self,
        message: impl Into<Arc<M>>,
        payload: Option<P>,
    ) -> Result<TaskHandle, RouteNotFound> {
        self.submit(message.into(), payload, |rank| {
            let (done, handle) = TaskHandle::new(rank);
            (Some(done), handle)
        })
    }

    fn find(&self, subject: &str) -> Option<(Rank, Lookup<'_, M, P>)> {
        self.trees.iter().find_map(|(rank, trie)| {
            lookup_in(trie, &self.pool, subject).map(|found| (*rank, found))
        })
    }

    fn submit<T>(
        &self,
        message: Arc<M>,
        payload: Option<P>,
        track: impl FnOnce(Rank) -> (Option<Completion>, T),
    ) -> Result<T, RouteNotFound> {
        let Some((rank, found)) = self.find(message.subject()) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(subject = message.subject(), "no route");
            return Err(RouteNotFound::new(message.subject()));
        };
        let (route, params) = found.into_parts();

        #[cfg(feature = "tracing")]
        tracing::trace!(
            subject = message.subject(),
            pattern = &*route.pattern,
            %rank,
            "dispatching"
        );

        let (done, out) = track(rank);
        let request = Request::new(message, params, payload, rank);
        launch(
            &*self.executor,
            Arc::clone(&route.handler),
            request,
            self.recover.clone(),
            done,
        );
        Ok(out)
    }
}

impl<M, P> fmt::Debug for Router<M, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("ranks", &self.global_allowed)
            .field("pool", &self.pool)
            .field("recover", &self.recover.is_some())
            .finish_non_exhaustive()
    }
}
