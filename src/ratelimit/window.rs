//! Per-client rolling window record.

use std::collections::BTreeMap;

/// Requests observed for one client, bucketed by whole UNIX second.
///
/// Buckets are kept sorted so that the in-window range and the expired prefix
/// can both be walked without scanning the whole map.
#[derive(Debug, Clone, Default)]
pub struct ClientWindow {
    /// Second timestamp -> requests observed in that second
    buckets: BTreeMap<i64, u64>,
    /// Second of the most recent request
    last_seen: i64,
}

impl ClientWindow {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request in the bucket for `now_sec`.
    pub fn record(&mut self, now_sec: i64) {
        *self.buckets.entry(now_sec).or_insert(0) += 1;
        self.last_seen = self.last_seen.max(now_sec);
    }

    /// Sum the buckets in `[now_sec - window_secs + 1, now_sec]`.
    ///
    /// Returns `None` as soon as the running sum exceeds `quota`.
    pub fn sum_within(&self, now_sec: i64, window_secs: u64, quota: u64) -> Option<u64> {
        if window_secs == 0 {
            return Some(0);
        }
        let mut total: u64 = 0;
        for (_, count) in self.buckets.range(window_start(now_sec, window_secs)..=now_sec) {
            total += count;
            if total > quota {
                return None;
            }
        }
        Some(total)
    }

    /// Drop buckets that can no longer fall inside the window ending at `now_sec`.
    pub fn prune(&mut self, now_sec: i64, window_secs: u64) {
        let start = window_start(now_sec, window_secs);
        // split_off keeps everything >= start
        self.buckets = self.buckets.split_off(&start);
    }

    /// Whether the client has been silent for more than `idle_secs`.
    pub fn is_idle(&self, now_sec: i64, idle_secs: u64) -> bool {
        now_sec.saturating_sub(self.last_seen) > secs_as_i64(idle_secs)
    }

    /// Number of seconds currently holding a bucket.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Second of the most recent request.
    pub fn last_seen(&self) -> i64 {
        self.last_seen
    }
}

fn window_start(now_sec: i64, window_secs: u64) -> i64 {
    now_sec.saturating_sub(secs_as_i64(window_secs)).saturating_add(1)
}

fn secs_as_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}
