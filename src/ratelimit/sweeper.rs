//! Background eviction of idle client records.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::limiter::WindowLimiter;
use crate::config::EvictionConfig;

/// Spawn a task that periodically evicts idle clients from `limiter`.
///
/// Returns `None` when sweeping is disabled. The task runs until the
/// returned handle is aborted.
pub fn spawn_eviction(
    limiter: Arc<WindowLimiter>,
    config: &EvictionConfig,
) -> Option<JoinHandle<()>> {
    let period = config.sweep_interval()?;

    let window = limiter.limit().window();
    let mut idle = config.idle();
    if idle < window {
        warn!(
            idle_secs = idle.as_secs(),
            window_secs = window.as_secs(),
            "Idle eviction period shorter than the window; using the window instead"
        );
        idle = window;
    }

    info!(
        idle_secs = idle.as_secs(),
        sweep_interval_secs = period.as_secs(),
        "Idle client eviction enabled"
    );

    Some(tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = limiter.evict_idle(chrono::Utc::now().timestamp(), idle);
            debug!(
                evicted,
                remaining = limiter.client_count(),
                "Idle client sweep complete"
            );
        }
    }))
}
