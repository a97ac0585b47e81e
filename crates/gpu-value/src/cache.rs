//! Time-bounded memoization of the baseline snapshot.
//!
//! ## Single flight
//!
//! The held snapshot sits behind an async mutex that stays locked while a
//! refresh is in progress. Callers that arrive during a miss wait for that
//! refresh and then see its result, so at most one resolution cycle runs per
//! TTL window no matter how many callers race.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::resolver::BaselineSource;
use crate::types::BaselineSnapshot;

/// Default time-to-live for a resolved baseline.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// In-memory cache in front of a [`BaselineSource`].
pub struct BaselineCache {
    source: Arc<dyn BaselineSource>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<BaselineSnapshot>>,
}

impl BaselineCache {
    /// Create an empty cache. Nothing is resolved until the first `get`.
    pub fn new(source: Arc<dyn BaselineSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            clock: Arc::new(SystemClock),
            slot: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the held snapshot, resolving a new one if it is missing or stale.
    pub async fn get(&self) -> BaselineSnapshot {
        let mut slot = self.slot.lock().await;

        if let Some(snapshot) = slot.as_ref() {
            if !self.is_expired(snapshot) {
                tracing::debug!("baseline cache hit (resolved {})", snapshot.resolved_at);
                return snapshot.clone();
            }
            tracing::info!("baseline cache expired; refreshing");
        } else {
            tracing::info!("baseline cache empty; resolving");
        }

        let fresh = self.source.resolve().await;
        *slot = Some(fresh.clone());
        fresh
    }

    /// Resolve a new snapshot regardless of the held one's age.
    pub async fn force_refresh(&self) -> BaselineSnapshot {
        let mut slot = self.slot.lock().await;
        tracing::info!("baseline refresh forced");
        let fresh = self.source.resolve().await;
        *slot = Some(fresh.clone());
        fresh
    }

    /// The held snapshot, fresh or not, without triggering a resolution.
    pub async fn peek(&self) -> Option<BaselineSnapshot> {
        self.slot.lock().await.clone()
    }

    /// Drop the held snapshot so the next `get` resolves.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    fn is_expired(&self, snapshot: &BaselineSnapshot) -> bool {
        // A negative age means the wall clock stepped backwards; keep the snapshot.
        match (self.clock.now() - snapshot.resolved_at).to_std() {
            Ok(age) => age > self.ttl,
            Err(_) => false,
        }
    }
}
