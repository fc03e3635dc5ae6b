//! Time-boxed snapshot cache that coalesces concurrent recomputes.

use hq_core::MissionControlData;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct CachedSnapshot {
    snapshot: Arc<MissionControlData>,
    computed_at: Instant,
}

/// Single-slot snapshot cache with a fixed time-to-live.
///
/// The slot lock is held across recomputation, so concurrent misses coalesce
/// into one computation and every waiter observes its result.
pub struct SnapshotCache {
    ttl: Duration,
    slot: Mutex<Option<CachedSnapshot>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached snapshot while fresh, otherwise runs `compute` and stores
    /// its result. A failed computation leaves the slot as it was.
    pub async fn get_or_compute<F, Fut, E>(&self, compute: F) -> Result<Arc<MissionControlData>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MissionControlData, E>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            let age = cached.computed_at.elapsed();
            if age < self.ttl {
                debug!(age_ms = age.as_millis() as u64, "snapshot cache hit");
                return Ok(Arc::clone(&cached.snapshot));
            }
        }
        let snapshot = Arc::new(compute().await?);
        *slot = Some(CachedSnapshot {
            snapshot: Arc::clone(&snapshot),
            computed_at: Instant::now(),
        });
        Ok(snapshot)
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
