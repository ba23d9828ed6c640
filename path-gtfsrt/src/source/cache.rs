//! Single-slot, time bounded cache for a shared upstream response.
//!
//! The PANYNJ endpoint returns every station in one body. Without a cache,
//! one update cycle would hit it once per station. The slot moves through
//! these states:
//!
//! ```text
//!  Empty ──miss──► Warming ──store──► Valid ──ttl──► Expired ──miss──► Warming
//! ```
//!
//! `Warming` is the window where a caller holds the write lock and performs
//! the one upstream fetch. Readers that arrive in the meantime queue on the
//! lock and, after re-checking, are served the freshly stored response.
//! Failures are cached too, so a broken upstream is not retried by every
//! station in the same cycle.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::error::SourceError;
use crate::clock::Clock;

/// Observable state of the cache slot at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Valid,
    Expired,
}

/// A captured upstream response, successful or not.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub captured_at: DateTime<Utc>,
    pub payload: Result<Bytes, Arc<SourceError>>,
}

impl CachedResponse {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.captured_at) < ttl
    }

    fn replay(&self) -> Result<Bytes, SourceError> {
        self.payload.clone().map_err(SourceError::Shared)
    }
}

/// Shared response cache with double-checked locking.
pub struct SharedResponseCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<CachedResponse>>,
}

impl SharedResponseCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn state(&self) -> SlotState {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            None => SlotState::Empty,
            Some(cached) if cached.is_fresh(self.clock.now(), self.ttl) => SlotState::Valid,
            Some(_) => SlotState::Expired,
        }
    }

    /// Return the cached response if it is within the TTL, otherwise run
    /// `fetch` exactly once and store its result.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Bytes, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, SourceError>>,
    {
        {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref().filter(|c| c.is_fresh(self.clock.now(), self.ttl))
            {
                debug!(captured_at = %cached.captured_at, "shared cache hit");
                return cached.replay();
            }
        }

        let mut slot = self.slot.write().await;

        // Another caller may have refreshed the slot while we waited
        if let Some(cached) = slot.as_ref().filter(|c| c.is_fresh(self.clock.now(), self.ttl)) {
            debug!(captured_at = %cached.captured_at, "shared cache filled while waiting");
            return cached.replay();
        }

        debug!("shared cache miss, fetching upstream");
        let payload = fetch().await.map_err(Arc::new);
        let cached = CachedResponse {
            captured_at: self.clock.now(),
            payload,
        };
        let result = cached.replay();
        *slot = Some(cached);
        result
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}
