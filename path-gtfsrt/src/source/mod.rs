//! Upstream source gateways.
//!
//! A [`SourceGateway`] wraps one upstream provider of PATH realtime data
//! behind three operations: list stations, list routes, and get the
//! upcoming trains at a station.
//!
//! Two gateways are provided:
//! - [`RazzaGateway`] - the Razza HTTP JSON API. Every call is a fresh
//!   network round trip.
//! - [`PanynjGateway`] - the Port Authority ridepath feed. The upstream
//!   returns every station in one body, so responses are held in a short
//!   lived [`SharedResponseCache`] and re-parsed per station.
//!
//! All calls take a [`Deadline`]. A call that outlives it fails with
//! [`SourceError::Timeout`]; it never blocks indefinitely.

mod cache;
mod error;
mod http;
mod panynj;
mod qa;
mod razza;
mod static_ids;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Route, Station, Train};

pub use cache::{CachedResponse, SharedResponseCache, SlotState};
pub use error::SourceError;
pub use http::{HttpFetch, ReqwestFetcher};
pub use panynj::{PANYNJ_URL, PanynjGateway};
pub use qa::apply_route_qa;
pub use razza::{RAZZA_BASE_URL, RazzaGateway};
pub use static_ids::{gtfs_route_ids, gtfs_stop_ids};

/// Time budget and cancellation signal for one upstream call.
#[derive(Debug, Clone)]
pub struct Deadline {
    timeout: Duration,
    cancel: CancellationToken,
}

impl Deadline {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// A deadline that can only expire, never be cancelled.
    pub fn after(timeout: Duration) -> Self {
        Self::new(timeout, CancellationToken::new())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `fut` until it finishes, the timeout elapses, or the token is
    /// cancelled, whichever comes first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SourceError::Cancelled),
            res = tokio::time::timeout(self.timeout, fut) => {
                res.unwrap_or(Err(SourceError::Timeout(self.timeout)))
            }
        }
    }
}

/// Uniform access to one upstream provider.
#[async_trait]
pub trait SourceGateway: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Map from station to the GTFS static stop id.
    async fn station_topology(
        &self,
        deadline: &Deadline,
    ) -> Result<BTreeMap<Station, String>, SourceError>;

    /// Map from route to the GTFS static route id.
    async fn route_topology(
        &self,
        deadline: &Deadline,
    ) -> Result<BTreeMap<Route, String>, SourceError>;

    /// Upcoming trains at a station.
    async fn trains_at(
        &self,
        station: Station,
        deadline: &Deadline,
    ) -> Result<Vec<Train>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_passes_through_result() {
        let deadline = Deadline::after(Duration::from_secs(1));
        let res = deadline.run(async { Ok::<_, SourceError>(7) }).await;
        assert_eq!(res.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_times_out() {
        let deadline = Deadline::after(Duration::from_millis(100));
        let res: Result<(), _> = deadline
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert!(matches!(res, Err(SourceError::Timeout(d)) if d == Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn deadline_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let deadline = Deadline::new(Duration::from_secs(60), token);
        assert!(deadline.is_cancelled());
        let res: Result<(), _> = deadline.run(std::future::pending()).await;
        assert!(matches!(res, Err(SourceError::Cancelled)));
    }
}
