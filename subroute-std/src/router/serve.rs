//! Driving a router from a message stream.

use crate::router::Router;
use futures::{Stream, StreamExt, pin_mut};
use std::sync::Arc;
use subroute_core::Message;

/// Counters reported by [`Router::serve`] once its stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    /// Messages handed to a handler.
    pub dispatched: u64,
    /// Messages no rank had a route for.
    pub not_found: u64,
}

impl<M, P> Router<M, P>
where
    M: Message,
    P: Send + 'static,
{
    /// Dispatch every message of `messages` until the stream ends.
    ///
    /// Misses are logged, counted and skipped; they never end the loop.
    ///
    /// ```rust,ignore
    /// let router = Arc::new(builder.seal());
    /// let stats = router.serve(subscription).await;
    /// ```
    pub async fn serve<S>(&self, messages: S) -> ServeStats
    where
        S: Stream,
        S::Item: Into<Arc<M>>,
    {
        pin_mut!(messages);
        let mut stats = ServeStats::default();
        while let Some(message) = messages.next().await {
            match self.dispatch(message) {
                Ok(_) => stats.dispatched += 1,
                Err(miss) => {
                    stats.not_found += 1;
                    #[cfg(feature = "tracing")]
                    tracing::trace!(
                        subject = miss.subject(),
                        not_found = stats.not_found,
                        "skipping unrouted message"
                    );
                    #[cfg(not(feature = "tracing"))]
                    drop(miss);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            dispatched = stats.dispatched,
            not_found = stats.not_found,
            "message stream ended"
        );
        stats
    }
}
