//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use discv5::enr::CombinedKey;
use discv5_service::records::encode_record;
use discv5_service::{DiscoveryEngine, EngineError, Enr, Identity, NodeId, ServiceConfig};

/// A record for a fresh random node at `127.0.0.1:port`.
pub fn test_record(port: u16) -> Enr {
    record_for(&CombinedKey::generate_secp256k1(), port, 1)
}

/// A record signed by `key` with the given port and sequence number.
pub fn record_for(key: &CombinedKey, port: u16, seq: u64) -> Enr {
    Enr::builder()
        .seq(seq)
        .ip4(Ipv4Addr::LOCALHOST)
        .udp4(port)
        .build(key)
        .unwrap()
}

/// Write `records` one per line.
pub async fn write_record_lines(path: &Path, records: &[Enr]) {
    let mut text = String::new();
    for record in records {
        text.push_str(&encode_record(record));
        text.push('\n');
    }
    tokio::fs::write(path, text).await.unwrap();
}

/// Non-empty lines of a file.
pub async fn read_lines(path: &Path) -> Vec<String> {
    tokio::fs::read_to_string(path)
        .await
        .unwrap()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

/// A config with every file inside `dir` and a short lookup interval.
pub fn config_in(dir: &Path) -> ServiceConfig {
    ServiceConfig {
        peer_id_file: dir.join("peer-id.json"),
        local_enr_file: dir.join("local-enr"),
        bootstrap_enrs_file: dir.join("bootstrap-enrs"),
        bind_address: "/ip4/127.0.0.1/udp/5500".to_string(),
        output_enrs_file: dir.join("output-enrs"),
        lookup_interval: Duration::from_millis(5),
        ..ServiceConfig::default()
    }
}

/// Poll `check` until it holds, panicking after five seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let wait = async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("condition not reached in time");
}

/// In-memory engine with scripted lookup results.
pub struct MockEngine {
    identity: Identity,
    local_record: Enr,
    bind_address: SocketAddr,
    running: AtomicBool,
    stays_stopped: bool,
    stop_during_lookup: Option<usize>,
    script: Mutex<VecDeque<Result<Vec<Enr>, EngineError>>>,
    seeds: Mutex<Vec<Enr>>,
    lookups: AtomicUsize,
    stops: AtomicUsize,
    identity_reads: AtomicUsize,
}

impl MockEngine {
    /// An engine with a fresh identity.
    pub fn new() -> Self {
        let bind_address = SocketAddr::from((Ipv4Addr::LOCALHOST, 5500));
        Self::create(None, Identity::generate(), bind_address).unwrap()
    }

    /// Factory with the signature `DiscoveryService::init_with` expects.
    pub fn create(
        local_record: Option<Enr>,
        identity: Identity,
        bind_address: SocketAddr,
    ) -> Result<Self, EngineError> {
        let local_record = match local_record {
            Some(record) => record,
            None => Enr::builder()
                .ip4(Ipv4Addr::LOCALHOST)
                .udp4(bind_address.port())
                .build(&identity.key())
                .map_err(|e| EngineError::new("create", e.to_string()))?,
        };
        Ok(Self {
            identity,
            local_record,
            bind_address,
            running: AtomicBool::new(false),
            stays_stopped: false,
            stop_during_lookup: None,
            script: Mutex::new(VecDeque::new()),
            seeds: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            identity_reads: AtomicUsize::new(0),
        })
    }

    /// Answer lookups with `results` in order, then with empty results.
    pub fn with_lookup_results<I>(self, results: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<Enr>, EngineError>>,
    {
        self.script.lock().unwrap().extend(results);
        self
    }

    /// Report not running from inside the `n`th lookup (1-based).
    pub fn stop_during_lookup(mut self, n: usize) -> Self {
        self.stop_during_lookup = Some(n);
        self
    }

    /// `start` succeeds but the engine never reports running.
    pub fn stays_stopped(mut self) -> Self {
        self.stays_stopped = true;
        self
    }

    /// Mark the engine running without going through `start`.
    pub fn started(self) -> Self {
        self.running.store(true, Ordering::SeqCst);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// One per save, since every save reads the identity once.
    pub fn identity_reads(&self) -> usize {
        self.identity_reads.load(Ordering::SeqCst)
    }

    pub fn seeds(&self) -> Vec<Enr> {
        self.seeds.lock().unwrap().clone()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[async_trait]
impl DiscoveryEngine for MockEngine {
    async fn add_seed_record(&self, record: Enr) -> Result<(), EngineError> {
        self.seeds.lock().unwrap().push(record);
        Ok(())
    }

    async fn start(&self) -> Result<(), EngineError> {
        if !self.stays_stopped {
            self.running.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn lookup(&self, _target: NodeId) -> Result<Vec<Enr>, EngineError> {
        let n = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::task::yield_now().await;
        if self.stop_during_lookup == Some(n) {
            self.running.store(false, Ordering::SeqCst);
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn current_identity(&self) -> Identity {
        self.identity_reads.fetch_add(1, Ordering::SeqCst);
        self.identity.clone()
    }

    async fn local_record(&self) -> Enr {
        self.local_record.clone()
    }

    fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    async fn known_record_count(&self) -> usize {
        self.seeds.lock().unwrap().len()
    }

    async fn connected_peer_count(&self) -> usize {
        0
    }
}
