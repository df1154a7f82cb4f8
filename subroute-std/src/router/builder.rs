//! Registration phase.

use crate::{
    router::{
        Router,
        executor::{Executor, TokioExecutor},
        route::{Lookup, Route, allowed_in, join_ranks, lookup_in},
        task::RecoverFn,
    },
    routing::{Trie, count_params, translate},
};
use std::{collections::HashMap, fmt, future::Future, sync::Arc};
use subroute_core::{
    ConfigError, Handler, HandlerError, IntoOutcome, Message, ParamsPool, Rank, Request,
};

/// Collects routes before a [`Router`] starts serving.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = Router::<SubjectMsg>::builder();
/// builder
///     .handle("user.*.>", 1, |req: Request<SubjectMsg>| async move {
///         println!("{}", req.param("p1"));
///     })?
///     .handle("user.>", 2, fallback)?;
/// let router = builder.seal();
/// router.dispatch(msg)?;
/// ```
pub struct RouterBuilder<M, P = ()> {
    pub(crate) trees: HashMap<Rank, Trie<Route<M, P>>>,
    pub(crate) pool: Arc<ParamsPool>,
    pub(crate) save_matched_route_path: bool,
    pub(crate) recover: Option<RecoverFn<M>>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) global_allowed: String,
}

impl<M, P> Default for RouterBuilder<M, P>
where
    M: Message,
    P: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M, P> RouterBuilder<M, P>
where
    M: Message,
    P: Send + 'static,
{
    /// Create an empty builder.
    ///
    /// Handlers run on the tokio runtime the builder is created in. Created
    /// outside one, they run on whichever runtime dispatches; a dispatch
    /// from no runtime at all is reported to [`recover`](Self::recover).
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            pool: Arc::new(ParamsPool::new()),
            save_matched_route_path: false,
            recover: None,
            executor: Arc::new(TokioExecutor::current().unwrap_or_default()),
            global_allowed: String::new(),
        }
    }

    /// Record the matched pattern as a `$matchedRoutePath` parameter.
    ///
    /// Applies to routes registered after this call while the flag is set.
    pub fn save_matched_route_path(&mut self, enabled: bool) -> &mut Self {
        self.save_matched_route_path = enabled;
        self
    }

    /// Install a callback receiving every handler failure, panics included.
    pub fn recover<F>(&mut self, recover: F) -> &mut Self
    where
        F: Fn(&M, &HandlerError) + Send + Sync + 'static,
    {
        self.recover = Some(Arc::new(recover));
        self
    }

    /// Run handlers on `executor` instead of the ambient tokio runtime.
    pub fn executor<E: Executor>(&mut self, executor: E) -> &mut Self {
        self.executor = Arc::new(executor);
        self
    }

    /// Bound the number of idle parameter buffers kept for reuse.
    pub fn max_idle_params(&mut self, max_idle: usize) -> &mut Self {
        let pool = ParamsPool::with_max_idle(max_idle);
        pool.raise_capacity(self.pool.capacity());
        self.pool = Arc::new(pool);
        self
    }

    /// Bind `handler` to `pattern` at `rank`.
    ///
    /// Fails on a rank outside `1..=255` or a pattern the rank's trie
    /// rejects. The builder is unchanged after a failure.
    pub fn register<H>(
        &mut self,
        pattern: &str,
        rank: u32,
        handler: H,
    ) -> Result<&mut Self, ConfigError>
    where
        H: Handler<M, P>,
    {
        let rank = Rank::new(rank)?;
        let translated = translate(pattern);
        let route = Route {
            pattern: Arc::from(translated.as_str()),
            handler: Arc::new(handler),
            save_path: self.save_matched_route_path,
        };

        let inserted = match self.trees.get_mut(&rank) {
            Some(trie) => trie.insert(&translated, route),
            None => {
                let mut trie = Trie::new();
                let inserted = trie.insert(&translated, route);
                if inserted.is_ok() {
                    self.trees.insert(rank, trie);
                    self.global_allowed = join_ranks(self.trees.keys().copied().collect());
                }
                inserted
            }
        };
        inserted.map_err(|source| ConfigError::route(pattern, source))?;

        let needed = count_params(&translated) + usize::from(self.save_matched_route_path);
        self.pool.raise_capacity(needed);

        #[cfg(feature = "tracing")]
        tracing::debug!(pattern, %translated, %rank, "route registered");
        Ok(self)
    }

    /// [`register`](Self::register) for closures, with the request type
    /// inferred from the router.
    pub fn handle<F, Fut>(
        &mut self,
        pattern: &str,
        rank: u32,
        handler: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(Request<M, P>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send,
        Fut::Output: IntoOutcome,
    {
        self.register(pattern, rank, handler)
    }

    /// Probe the trie of a single rank.
    pub fn lookup(&self, subject: &str, rank: u32) -> Option<Lookup<'_, M, P>> {
        let trie = self.trees.get(&Rank::new(rank).ok()?)?;
        lookup_in(trie, &self.pool, subject)
    }

    /// Ranks other than `requesting` with a route for `subject`.
    ///
    /// See [`Router::allowed_ranks`].
    pub fn allowed_ranks(&self, subject: &str, requesting: Option<u32>) -> String {
        allowed_in(
            self.trees.iter().map(|(rank, trie)| (*rank, trie)),
            subject,
            requesting.and_then(|rank| Rank::new(rank).ok()),
            &self.global_allowed,
        )
    }

    /// Registered ranks, ascending.
    pub fn ranks(&self) -> Vec<Rank> {
        let mut ranks: Vec<Rank> = self.trees.keys().copied().collect();
        ranks.sort_unstable();
        ranks
    }

    /// Number of registered routes across all ranks.
    pub fn route_count(&self) -> usize {
        self.trees.values().map(Trie::len).sum()
    }

    /// Freeze the rank order and start serving.
    pub fn seal(self) -> Router<M, P> {
        let mut trees: Vec<_> = self.trees.into_iter().collect();
        trees.sort_unstable_by_key(|(rank, _)| *rank);

        let router = Router {
            trees,
            pool: self.pool,
            save_matched_route_path: self.save_matched_route_path,
            recover: self.recover,
            executor: self.executor,
            global_allowed: self.global_allowed,
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            ranks = router.trees.len(),
            routes = router.route_count(),
            "router sealed"
        );
        router
    }
}

impl<M, P> fmt::Debug for RouterBuilder<M, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("ranks", &self.global_allowed)
            .field("pool", &self.pool)
            .field("save_matched_route_path", &self.save_matched_route_path)
            .field("recover", &self.recover.is_some())
            .finish_non_exhaustive()
    }
}
