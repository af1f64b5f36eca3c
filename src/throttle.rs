//! Per-route, per-client fixed-window request throttling.
//!
//! [`Throttler`] keeps one counter per `(route, client)` pair in a sharded
//! [`DashMap`], so concurrent requests on unrelated keys rarely contend.
//! All counters are cleared together every window by the loop started with
//! [`Throttler::start_reset_task`]; allowances therefore restart in lockstep
//! for every client.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::proxy::routing::RouteTable;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
    pub route: usize,
    pub client: String,
}

impl ThrottleKey {
    fn new(route: usize, client: &str) -> Self {
        Self {
            route,
            client: client.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Throttler {
    /// Limit per route index; 0 means unlimited.
    limits: Vec<u64>,
    counters: DashMap<ThrottleKey, u64>,
    window: Duration,
}

impl Throttler {
    #[must_use]
    pub fn new(limits: Vec<u64>) -> Self {
        Self::with_window(limits, DEFAULT_WINDOW)
    }

    #[must_use]
    pub fn with_window(limits: Vec<u64>, window: Duration) -> Self {
        Self {
            limits,
            counters: DashMap::new(),
            window,
        }
    }

    #[must_use]
    pub fn from_table(routes: &RouteTable) -> Self {
        Self::new(routes.iter().map(|r| r.limit).collect())
    }

    /// Limit configured for `route`. Unknown routes are unlimited.
    #[must_use]
    pub fn limit(&self, route: usize) -> u64 {
        self.limits.get(route).copied().unwrap_or(0)
    }

    /// Whether one more request would be admitted. Does not count it.
    #[must_use]
    pub fn allow(&self, route: usize, client: &str) -> bool {
        let limit = self.limit(route);
        if limit == 0 {
            return true;
        }
        self.count(route, client) < limit
    }

    /// Count one request against the key.
    pub fn record(&self, route: usize, client: &str) {
        if self.limit(route) == 0 {
            return;
        }
        *self
            .counters
            .entry(ThrottleKey::new(route, client))
            .or_insert(0) += 1;
    }

    /// Check and count in one step under the key's shard lock.
    ///
    /// Returns `false` without counting once the limit is reached, so a
    /// burst of concurrent callers admits exactly `limit` of them.
    pub fn try_acquire(&self, route: usize, client: &str) -> bool {
        let limit = self.limit(route);
        if limit == 0 {
            return true;
        }
        let mut count = self
            .counters
            .entry(ThrottleKey::new(route, client))
            .or_insert(0);
        if *count >= limit {
            return false;
        }
        *count += 1;
        true
    }

    #[must_use]
    pub fn count(&self, route: usize, client: &str) -> u64 {
        self.counters
            .get(&ThrottleKey::new(route, client))
            .map_or(0, |c| *c)
    }

    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.counters.len()
    }

    /// Clear every counter.
    pub fn reset(&self) {
        self.counters.clear();
    }

    /// Spawn the loop that calls [`reset`](Self::reset) once per window.
    ///
    /// The first reset happens one full window after the call.
    #[must_use]
    pub fn start_reset_task(self: &Arc<Self>) -> ResetTask {
        let (shutdown, mut rx) = watch::channel(false);
        let throttler = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(throttler.window);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = rx.changed() => {
                        tracing::debug!("throttle reset loop shutting down");
                        return;
                    }
                }

                let keys = throttler.tracked_keys();
                throttler.reset();
                tracing::debug!(keys, "throttle window reset");
            }
        });

        ResetTask { shutdown, handle }
    }
}

/// Handle to the running reset loop. Dropping it also ends the loop.
#[derive(Debug)]
pub struct ResetTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ResetTask {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "throttle reset task failed");
        }
    }
}
