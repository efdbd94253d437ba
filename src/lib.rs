//! Long-running discv5 node discovery service.
//!
//! Loads a persisted identity and seed records, drives random-target lookups
//! against a [`DiscoveryEngine`] and saves what it found on SIGHUP and on
//! shutdown.

#![deny(missing_docs)]

pub mod cli;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod found;
pub mod identity;
pub mod lifecycle;
pub mod loader;
pub mod persist;
pub mod records;
pub mod service;

// Re-export key types
pub use config::{IdentityPolicy, ServiceConfig};
pub use driver::{DiscoveryLoop, LoopStats};
pub use engine::{DiscoveryEngine, Discv5Engine, EngineError};
pub use error::{Error, Result};
pub use found::FoundRecords;
pub use identity::Identity;
pub use lifecycle::{Coordinator, LifecycleSignal, LifecycleState};
pub use persist::{PersistPaths, PersistenceWriter, SaveReport};
pub use service::DiscoveryService;

pub use discv5::enr::NodeId;
pub use discv5::Enr;
