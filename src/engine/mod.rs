//! The discovery engine seam.
//!
//! The orchestrator never touches protocol internals; it drives any
//! [`DiscoveryEngine`]. [`Discv5Engine`] adapts the `discv5` crate.

mod discv5_engine;

use std::net::SocketAddr;

use async_trait::async_trait;
use discv5::enr::NodeId;
use discv5::Enr;

use crate::identity::Identity;

pub use self::discv5_engine::Discv5Engine;

/// Error surfaced by a discovery engine operation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} failed: {reason}")]
pub struct EngineError {
    operation: &'static str,
    reason: String,
}

impl EngineError {
    /// Create an engine error for a named operation.
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }

    /// Operation that failed (e.g. `"lookup"`).
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

/// A running (or startable) DHT discovery engine.
///
/// Implementations own the protocol state machine. All methods take `&self`
/// so that the discovery loop and the lifecycle coordinator can share one
/// engine behind an `Arc`.
#[async_trait]
pub trait DiscoveryEngine: Send + Sync + 'static {
    /// Seed the routing table with a known record.
    async fn add_seed_record(&self, record: Enr) -> Result<(), EngineError>;

    /// Bind the socket and start the protocol.
    async fn start(&self) -> Result<(), EngineError>;

    /// Stop the protocol. Returns once the engine has shut down.
    async fn stop(&self);

    /// Whether the engine is started and not yet stopped.
    fn is_running(&self) -> bool;

    /// Find the nodes closest to `target`.
    async fn lookup(&self, target: NodeId) -> Result<Vec<Enr>, EngineError>;

    /// The identity the engine signs with.
    async fn current_identity(&self) -> Identity;

    /// The engine's current local record.
    async fn local_record(&self) -> Enr;

    /// The UDP socket the engine binds to.
    fn bind_address(&self) -> SocketAddr;

    /// Number of records in the routing table.
    async fn known_record_count(&self) -> usize;

    /// Number of currently connected peers.
    async fn connected_peer_count(&self) -> usize;
}
