//! The random-walk discovery loop.
//!
//! Each iteration looks up a random target, merges the returned records into
//! [`FoundRecords`] and pauses. The loop runs for as long as the engine
//! reports itself running.

use std::sync::Arc;
use std::time::Duration;

use discv5::enr::NodeId;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_LOOKUP_INTERVAL;
use crate::engine::DiscoveryEngine;
use crate::found::FoundRecords;

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Lookups issued.
    pub lookups: u64,
    /// Lookups that returned an error.
    pub failures: u64,
}

/// Drives repeated random lookups against an engine.
pub struct DiscoveryLoop<E: ?Sized> {
    engine: Arc<E>,
    found: FoundRecords,
    interval: Duration,
    shutdown: CancellationToken,
}

impl<E: DiscoveryEngine + ?Sized> DiscoveryLoop<E> {
    /// Create a loop with the default 1s interval.
    pub fn new(engine: Arc<E>, found: FoundRecords) -> Self {
        Self {
            engine,
            found,
            interval: DEFAULT_LOOKUP_INTERVAL,
            shutdown: CancellationToken::new(),
        }
    }

    /// Set the pause between lookups.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Use `token` to cut the pause short when shutdown begins.
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Run until the engine stops.
    ///
    /// Results of a lookup that completes after the engine stopped are
    /// discarded. Lookup errors are logged and the loop carries on.
    pub async fn run(self) -> LoopStats {
        let mut stats = LoopStats::default();

        while self.engine.is_running() && !self.shutdown.is_cancelled() {
            let target = random_target();
            info!(lookup_target = %hex::encode(target.raw()), "Find node");

            let result = self.engine.lookup(target).await;
            stats.lookups += 1;

            if !self.engine.is_running() {
                debug!("Engine stopped during lookup, discarding results");
                break;
            }

            match result {
                Ok(records) => {
                    let returned = records.len();
                    let new = self.found.merge(records).await;
                    debug!(returned, new, "Merged lookup results");
                }
                Err(e) => {
                    stats.failures += 1;
                    warn!(error = %e, "Lookup failed, retrying on next tick");
                }
            }

            let known = self.engine.known_record_count().await;
            let connected = self.engine.connected_peer_count().await;
            let found = self.found.len().await;
            info!(known, connected, found, "Lookup complete");

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }

        debug!(
            lookups = stats.lookups,
            failures = stats.failures,
            "Discovery loop exited"
        );
        stats
    }
}

/// A uniformly random 32-byte target from the OS CSPRNG.
pub fn random_target() -> NodeId {
    let mut raw = [0u8; 32];
    OsRng.fill_bytes(&mut raw);
    NodeId::new(&raw)
}
