//! [`DiscoveryEngine`] backed by the `discv5` crate.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use discv5::enr::{CombinedKey, NodeId};
use discv5::{ConfigBuilder, Discv5, Enr, ListenConfig};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{DiscoveryEngine, EngineError};
use crate::identity::Identity;

/// A discv5 service driven through the [`DiscoveryEngine`] trait.
///
/// Lookups only take the read lock to submit a query, so
/// [`stop`](DiscoveryEngine::stop) does not wait for in-flight queries. Their
/// results arrive after the engine reports stopped and are discarded by the
/// caller.
pub struct Discv5Engine {
    inner: RwLock<Discv5>,
    identity: Identity,
    bind_address: SocketAddr,
    running: AtomicBool,
}

impl Discv5Engine {
    /// Create an engine for `identity` listening on `bind_address`.
    ///
    /// When `local_record` is `None` a fresh record is derived from the
    /// identity and bind address. A supplied record whose UDP port differs
    /// from the bind port is updated and re-signed.
    pub fn create(
        local_record: Option<Enr>,
        identity: Identity,
        bind_address: SocketAddr,
    ) -> Result<Self, EngineError> {
        let key = identity.key();
        let record = match local_record {
            Some(record) => align_local_record(record, &key, bind_address)?,
            None => derive_local_record(&key, bind_address)?,
        };

        let listen = ListenConfig::from_ip(bind_address.ip(), bind_address.port());
        let config = ConfigBuilder::new(listen).build();
        let discv5: Discv5 =
            Discv5::new(record, key, config).map_err(|e| EngineError::new("create", e.to_string()))?;

        Ok(Self {
            inner: RwLock::new(discv5),
            identity,
            bind_address,
            running: AtomicBool::new(false),
        })
    }
}

fn derive_local_record(key: &CombinedKey, bind_address: SocketAddr) -> Result<Enr, EngineError> {
    let mut builder = Enr::builder();
    match bind_address.ip() {
        IpAddr::V4(ip) => {
            if !ip.is_unspecified() {
                builder.ip4(ip);
            }
            builder.udp4(bind_address.port());
        }
        IpAddr::V6(ip) => {
            if !ip.is_unspecified() {
                builder.ip6(ip);
            }
            builder.udp6(bind_address.port());
        }
    }
    builder
        .build(key)
        .map_err(|e| EngineError::new("derive local record", format!("{e:?}")))
}

fn align_local_record(
    mut record: Enr,
    key: &CombinedKey,
    bind_address: SocketAddr,
) -> Result<Enr, EngineError> {
    let port = bind_address.port();
    let advertised = match bind_address {
        SocketAddr::V4(_) => record.udp4(),
        SocketAddr::V6(_) => record.udp6(),
    };
    if advertised == Some(port) {
        return Ok(record);
    }

    let updated = match bind_address {
        SocketAddr::V4(_) => record.set_udp4(port, key),
        SocketAddr::V6(_) => record.set_udp6(port, key),
    };
    updated.map_err(|e| EngineError::new("update local record", format!("{e:?}")))?;
    debug!(
        previous = ?advertised,
        port,
        seq = record.seq(),
        "Re-signed local record for new bind port"
    );
    Ok(record)
}

#[async_trait]
impl DiscoveryEngine for Discv5Engine {
    async fn add_seed_record(&self, record: Enr) -> Result<(), EngineError> {
        self.inner
            .read()
            .await
            .add_enr(record)
            .map_err(|e| EngineError::new("add seed record", e.to_string()))
    }

    async fn start(&self) -> Result<(), EngineError> {
        let mut discv5 = self.inner.write().await;
        discv5
            .start()
            .await
            .map_err(|e| EngineError::new("start", format!("{e:?}")))?;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.write().await.shutdown();
        info!(bind_address = %self.bind_address, "discv5 engine stopped");
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn lookup(&self, target: NodeId) -> Result<Vec<Enr>, EngineError> {
        // The query future owns its channel to the service; the lock is
        // released before it is awaited.
        let query = self.inner.read().await.find_node(target);
        query
            .await
            .map_err(|e| EngineError::new("lookup", format!("{e:?}")))
    }

    async fn current_identity(&self) -> Identity {
        self.identity.clone()
    }

    async fn local_record(&self) -> Enr {
        self.inner.read().await.local_enr()
    }

    fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    async fn known_record_count(&self) -> usize {
        self.inner.read().await.table_entries_id().len()
    }

    async fn connected_peer_count(&self) -> usize {
        self.inner.read().await.connected_peers()
    }
}
