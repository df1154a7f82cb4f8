//! Route entries and the matching shared by both router phases.

use crate::routing::Trie;
use std::{
    fmt,
    sync::{Arc, LazyLock},
};
use subroute_core::{DynHandler, MATCHED_ROUTE_PATH_PARAM, ParamsPool, PooledParams, Rank};

static MATCHED_ROUTE_PATH_KEY: LazyLock<Arc<str>> =
    LazyLock::new(|| Arc::from(MATCHED_ROUTE_PATH_PARAM));

/// What a trie terminus holds.
pub(crate) struct Route<M, P> {
    /// Translated pattern.
    pub(crate) pattern: Arc<str>,
    pub(crate) handler: Arc<dyn DynHandler<M, P>>,
    /// Append the pattern as `$matchedRoutePath` on every match.
    pub(crate) save_path: bool,
}

/// Result of a direct single-rank probe.
pub struct Lookup<'r, M, P = ()> {
    route: &'r Route<M, P>,
    params: Option<PooledParams>,
}

impl<'r, M, P> Lookup<'r, M, P> {
    /// The handler bound to the matched pattern.
    pub fn handler(&self) -> &Arc<dyn DynHandler<M, P>> {
        &self.route.handler
    }

    /// The matched pattern, in translated form (`user.:p1.*>`).
    pub fn pattern(&self) -> &str {
        &self.route.pattern
    }

    /// Captured parameters, `None` for a purely static match.
    pub fn params(&self) -> Option<&PooledParams> {
        self.params.as_ref()
    }

    /// Take the captured parameters.
    pub fn into_params(self) -> Option<PooledParams> {
        self.params
    }

    pub(crate) fn into_parts(self) -> (&'r Route<M, P>, Option<PooledParams>) {
        (self.route, self.params)
    }
}

impl<M, P> fmt::Debug for Lookup<'_, M, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lookup")
            .field("pattern", &self.route.pattern)
            .field("params", &self.params)
            .finish()
    }
}

/// Match `subject` in one trie, leasing parameter storage from `pool`.
pub(crate) fn lookup_in<'r, M, P>(
    trie: &'r Trie<Route<M, P>>,
    pool: &Arc<ParamsPool>,
    subject: &str,
) -> Option<Lookup<'r, M, P>> {
    let found = trie.lookup(subject, Some(|| pool.lease()))?;
    let route = found.value;
    let mut params = found.params;
    if route.save_path {
        params
            .get_or_insert_with(|| pool.lease())
            .push(&MATCHED_ROUTE_PATH_KEY, &route.pattern);
    }
    Some(Lookup { route, params })
}

/// Render ranks ascending as `"1, 2, 3"`.
pub(crate) fn join_ranks(mut ranks: Vec<Rank>) -> String {
    ranks.sort_unstable();
    ranks
        .iter()
        .map(Rank::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ranks other than `requesting` whose trie matches `subject`.
///
/// `"*"` asks for every rank. `cached` answers it when a rank is given.
pub(crate) fn allowed_in<'r, M: 'r, P: 'r>(
    tries: impl Iterator<Item = (Rank, &'r Trie<Route<M, P>>)>,
    subject: &str,
    requesting: Option<Rank>,
    cached: &str,
) -> String {
    if subject == "*" {
        return match requesting {
            Some(_) => cached.to_owned(),
            None => join_ranks(tries.map(|(rank, _)| rank).collect()),
        };
    }
    join_ranks(
        tries
            .filter(|(rank, trie)| Some(*rank) != requesting && trie.contains(subject))
            .map(|(rank, _)| rank)
            .collect(),
    )
}
