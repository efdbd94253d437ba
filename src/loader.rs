//! Startup loading of identity, records and bind address.

use std::net::SocketAddr;

use discv5::Enr;
use tracing::{debug, warn};

use crate::config::{parse_bind_address, ServiceConfig};
use crate::error::Result;
use crate::identity::{read_identity, Identity};
use crate::records::{read_optional_record, read_records};

/// Everything needed to create and seed an engine.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Node identity.
    pub identity: Identity,
    /// Persisted local record, if any and if it belongs to `identity`.
    pub local_record: Option<Enr>,
    /// Seed records, in file order.
    pub bootstrap_records: Vec<Enr>,
    /// Resolved UDP bind address.
    pub bind_address: SocketAddr,
}

/// Load the startup bundle described by `config`.
///
/// Any error here is fatal; nothing has been started yet.
pub async fn load(config: &ServiceConfig) -> Result<LoadedConfig> {
    let bind_address = parse_bind_address(&config.bind_address)?;
    let identity = read_identity(&config.peer_id_file, config.identity_policy).await?;
    let local_record = read_optional_record(&config.local_enr_file)
        .await?
        .and_then(|record| {
            if record.node_id() == identity.node_id() {
                Some(record)
            } else {
                warn!(
                    path = %config.local_enr_file.display(),
                    record_node_id = %record.node_id(),
                    node_id = %identity.node_id(),
                    "Local record belongs to another identity, deriving a new one"
                );
                None
            }
        });
    let bootstrap_records = read_records(&config.bootstrap_enrs_file).await?;

    debug!(
        node_id = %identity.node_id(),
        local_record = local_record.is_some(),
        bootstrap = bootstrap_records.len(),
        %bind_address,
        "Loaded service configuration"
    );

    Ok(LoadedConfig {
        identity,
        local_record,
        bootstrap_records,
        bind_address,
    })
}
