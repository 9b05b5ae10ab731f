//! Periodic database ping.
//!
//! Hosted databases that suspend idle connections are kept awake by a
//! background task issuing [`Store::ping`] on a fixed interval. Failures are
//! logged and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use wasabi_check_core::store::Store;

/// Spawn the ping loop. Returns `None` when `interval_secs` is 0.
pub fn spawn(store: Arc<dyn Store>, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("keep-alive disabled");
        return None;
    }
    let period = Duration::from_secs(interval_secs);
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            ping_once(store.as_ref()).await;
        }
    }))
}

/// One ping; `true` on success.
pub async fn ping_once(store: &dyn Store) -> bool {
    match store.ping().await {
        Ok(()) => {
            tracing::debug!("keep-alive ping ok");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "keep-alive ping failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasabi_check_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn zero_interval_disables() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        assert!(spawn(store, 0).is_none());
    }

    #[tokio::test]
    async fn ping_succeeds_and_task_runs() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        assert!(ping_once(store.as_ref()).await);
        let handle = spawn(store, 1).unwrap();
        assert!(!handle.is_finished());
        handle.abort();
    }
}
