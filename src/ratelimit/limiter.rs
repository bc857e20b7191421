//! Core rolling window rate limiter implementation.

use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use super::backend::{Admission, AdmissionControl};
use super::limit::Limit;
use super::window::ClientWindow;

/// The rate limiter that owns all per-client counting state.
///
/// Client records live in a sharded concurrent map. All work for one key
/// (prune, record, sum) happens while holding that key's shard guard, so
/// concurrent calls for the same client are applied one at a time and no
/// increment is lost. Calls for keys on different shards do not contend.
///
/// This struct is thread-safe and is meant to be shared behind an `Arc`.
pub struct WindowLimiter {
    /// Per-client records indexed by client key
    clients: DashMap<String, ClientWindow>,
    /// Immutable limit for every client
    limit: Limit,
}

impl WindowLimiter {
    /// Create a new limiter enforcing `limit` for every client.
    pub fn new(limit: Limit) -> Self {
        Self {
            clients: DashMap::new(),
            limit,
        }
    }

    /// The limit enforced by this limiter.
    pub fn limit(&self) -> Limit {
        self.limit
    }

    /// Record a request from `key` at `now_sec` (whole UNIX seconds) and decide
    /// whether to admit it.
    ///
    /// The request is counted before the decision and stays counted when it
    /// is rejected. If the clock steps backwards, buckets newer than `now_sec`
    /// are kept but not summed until time catches up with them.
    pub fn admit_at(&self, key: &str, now_sec: i64) -> Admission {
        // Tracked clients are served without allocating an owned key.
        let admission = match self.clients.get_mut(key) {
            Some(mut window) => self.decide(key, &mut window, now_sec),
            None => match self.clients.entry(key.to_owned()) {
                Entry::Vacant(vacant) => {
                    debug!(
                        client = %key,
                        count = 1,
                        quota = self.limit.quota(),
                        "Tracking new client"
                    );
                    let mut window = ClientWindow::new();
                    window.record(now_sec);
                    vacant.insert(window);
                    Admission::allowed(1)
                }
                // Another caller inserted the key between the lookup and the entry.
                Entry::Occupied(mut occupied) => self.decide(key, occupied.get_mut(), now_sec),
            },
        };

        trace!(
            client = %key,
            allowed = admission.allowed,
            count = admission.count,
            "Admission decided"
        );

        admission
    }

    /// Prune, record and sum for an already tracked client.
    fn decide(&self, key: &str, window: &mut ClientWindow, now_sec: i64) -> Admission {
        let quota = self.limit.quota();
        let window_secs = self.limit.window_secs();

        window.prune(now_sec, window_secs);
        window.record(now_sec);
        match window.sum_within(now_sec, window_secs, quota) {
            Some(count) => Admission::allowed(count),
            None => {
                debug!(
                    client = %key,
                    count = window.sum_within(now_sec, window_secs, u64::MAX).unwrap_or(quota + 1),
                    quota,
                    "Rate limit exceeded"
                );
                Admission::rejected()
            }
        }
    }

    /// Requests currently counted for `key` in the window ending at `now_sec`.
    ///
    /// Returns `None` if the client has never been seen or has been evicted.
    pub fn current_count(&self, key: &str, now_sec: i64) -> Option<u64> {
        self.clients
            .get(key)
            .and_then(|window| window.sum_within(now_sec, self.limit.window_secs(), u64::MAX))
    }

    /// Remove clients that have sent nothing for longer than `idle`.
    ///
    /// `idle` is raised to the window length so that no record still
    /// contributing to a decision is dropped. Returns the number of evicted clients.
    pub fn evict_idle(&self, now_sec: i64, idle: Duration) -> usize {
        let idle_secs = idle.as_secs().max(self.limit.window_secs());
        let mut evicted = 0;
        self.clients.retain(|_, window| {
            let keep = !window.is_idle(now_sec, idle_secs);
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Get the number of tracked clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

impl Default for WindowLimiter {
    fn default() -> Self {
        Self::new(Limit::default())
    }
}

impl AdmissionControl for WindowLimiter {
    fn admit(&self, key: &str) -> Admission {
        self.admit_at(key, chrono::Utc::now().timestamp())
    }
}
