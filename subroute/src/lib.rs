//! # subroute - Rank-Ordered Subject Router
//!
//! `subroute` routes publish/subscribe messages by their dot-delimited
//! subject. Patterns use the usual wildcards: `*` matches one token and a
//! trailing `>` matches everything after it. Every route carries a rank in
//! `1..=255`; when patterns of several ranks match a subject, the lowest
//! rank wins and only its handler runs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use subroute::prelude::*;
//!
//! let mut builder = Router::<SubjectMsg>::builder();
//! builder
//!     .handle("user.*.>", 1, |req| async move {
//!         // "user.gopher.star.ok" -> p1 = "gopher", > = ".star.ok"
//!         println!("{} {}", req.param("p1"), req.param(">"));
//!     })?
//!     .handle("user.>", 2, |_req| async {})?;
//!
//! let router = builder.seal();
//! router.dispatch(SubjectMsg::from_subject("user.gopher.star.ok"))?;
//! ```
//!
//! ## Crates
//!
//! - `subroute-core`: messages, parameters, handlers, errors
//! - `subroute-std`: the trie, the router and its executors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use subroute_core::{
    // Error types
    BoxError,
    ConfigError,
    // Handler
    DynHandler,
    Handler,
    HandlerError,
    InsertError,
    IntoOutcome,
    // Parameters
    MATCHED_ROUTE_PATH_PARAM,
    // Message
    Message,
    Param,
    Params,
    ParamsPool,
    PooledParams,
    // Rank
    Rank,
    Request,
    RouteNotFound,
    SpawnError,
    SubjectMsg,
    SubrouteError,
};

// Routing
pub use subroute_std::router::{
    Executor, Lookup, RecoverFn, Router, RouterBuilder, ServeStats, TaskHandle, TokioExecutor,
};

/// Pattern translation and the radix trie.
pub mod routing {
    pub use subroute_std::routing::{
        CATCH_ALL_PARAM, Match, SEPARATOR, Trie, count_params, translate,
    };
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use subroute_std::testing::*;
}

/// Prelude module - common imports for subroute.
///
/// # Usage
///
/// ```rust,ignore
/// use subroute::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        ConfigError,
        // Core traits
        Handler,
        HandlerError,
        Message,
        Params,
        Rank,
        Request,
        RouteNotFound,
        // Routing
        Router,
        RouterBuilder,
        SubjectMsg,
    };
}
