//! The discovery service: loading, seeding, the loop and the lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use discv5::Enr;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::driver::DiscoveryLoop;
use crate::engine::{DiscoveryEngine, Discv5Engine, EngineError};
use crate::error::Result;
use crate::found::FoundRecords;
use crate::identity::Identity;
use crate::lifecycle::{Coordinator, LifecycleSignal};
use crate::loader;
use crate::persist::PersistenceWriter;
use crate::records::encode_record;

/// A seeded discovery engine plus the state shared by the loop and the
/// persistence path.
pub struct DiscoveryService<E> {
    engine: Arc<E>,
    found: FoundRecords,
    config: ServiceConfig,
}

impl DiscoveryService<Discv5Engine> {
    /// Load `config` and create a seeded discv5 engine.
    pub async fn init(config: ServiceConfig) -> Result<Self> {
        Self::init_with(config, Discv5Engine::create).await
    }
}

impl<E: DiscoveryEngine> DiscoveryService<E> {
    /// Load `config`, build the engine with `create` and seed it with the
    /// bootstrap records in file order.
    ///
    /// `create` is only called once loading has fully succeeded.
    pub async fn init_with<F>(config: ServiceConfig, create: F) -> Result<Self>
    where
        F: FnOnce(Option<Enr>, Identity, SocketAddr) -> std::result::Result<E, EngineError>,
    {
        let loaded = loader::load(&config).await?;
        let engine = Arc::new(create(
            loaded.local_record,
            loaded.identity,
            loaded.bind_address,
        )?);

        for record in loaded.bootstrap_records {
            debug!(enr = %encode_record(&record), "Adding bootstrap record");
            engine.add_seed_record(record).await?;
        }

        Ok(Self {
            engine,
            found: FoundRecords::new(),
            config,
        })
    }

    /// The engine being driven.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Records found so far.
    pub fn found(&self) -> &FoundRecords {
        &self.found
    }

    /// Start the engine and serve until a termination signal arrives.
    ///
    /// The discovery loop runs on its own task while this task handles
    /// `signals`. Returns once state is saved and the engine has stopped.
    pub async fn run<S>(self, signals: S) -> Result<()>
    where
        S: Stream<Item = LifecycleSignal> + Unpin,
    {
        self.engine.start().await?;
        let local_record = self.engine.local_record().await;
        info!(
            bind_address = %self.engine.bind_address(),
            node_id = %local_record.node_id(),
            "Service started"
        );

        let shutdown = CancellationToken::new();
        let discovery = DiscoveryLoop::new(Arc::clone(&self.engine), self.found.clone())
            .interval(self.config.lookup_interval)
            .shutdown_token(shutdown.clone());
        let discovery = tokio::spawn(discovery.run());

        let writer = PersistenceWriter::new(
            Arc::clone(&self.engine),
            self.found.clone(),
            self.config.persist_paths(),
        );
        let outcome = Coordinator::new(Arc::clone(&self.engine), writer, shutdown)
            .run(signals)
            .await;

        match discovery.await {
            Ok(stats) => debug!(
                lookups = stats.lookups,
                failures = stats.failures,
                "Discovery loop finished"
            ),
            Err(e) => warn!(error = %e, "Discovery loop task failed"),
        }
        let found = self.found.len().await;
        info!(found, "Service stopped");
        outcome
    }
}
