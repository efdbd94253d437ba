//! Service configuration and bind-address resolution.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use multiaddr::{Multiaddr, Protocol};

use crate::error::{Error, Result};
use crate::persist::PersistPaths;

/// Default bind address: all IPv4 interfaces, UDP port 5500.
pub const DEFAULT_BIND_ADDRESS: &str = "/ip4/0.0.0.0/udp/5500";

/// Default pause between two lookups.
pub const DEFAULT_LOOKUP_INTERVAL: Duration = Duration::from_millis(1000);

/// What to do when the peer identity file does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityPolicy {
    /// Generate a fresh identity and write it to the file immediately.
    #[default]
    CreateIfMissing,
    /// Fail with [`Error::IdentityMissing`].
    Require,
}

/// Configuration for a discovery service run.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Peer identity file (JSON keypair).
    pub peer_id_file: PathBuf,
    /// Local ENR file.
    pub local_enr_file: PathBuf,
    /// Line-delimited bootstrap ENRs.
    pub bootstrap_enrs_file: PathBuf,
    /// Multiaddr text of the UDP bind address.
    pub bind_address: String,
    /// Line-delimited output of discovered ENRs.
    pub output_enrs_file: PathBuf,
    /// Pause between lookups. Default: 1s.
    pub lookup_interval: Duration,
    /// Missing identity handling. Default: create.
    pub identity_policy: IdentityPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            peer_id_file: PathBuf::from("./peer-id.json"),
            local_enr_file: PathBuf::from("./local-enr"),
            bootstrap_enrs_file: PathBuf::from("./bootstrap-enrs"),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            output_enrs_file: PathBuf::from("./output-enrs"),
            lookup_interval: DEFAULT_LOOKUP_INTERVAL,
            identity_policy: IdentityPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Files written on every save.
    pub fn persist_paths(&self) -> PersistPaths {
        PersistPaths {
            peer_id_file: self.peer_id_file.clone(),
            local_enr_file: self.local_enr_file.clone(),
            output_enrs_file: self.output_enrs_file.clone(),
        }
    }
}

/// Resolve a multiaddr such as `/ip4/0.0.0.0/udp/5500` into a UDP socket address.
///
/// Only `/ip4/<addr>/udp/<port>` and `/ip6/<addr>/udp/<port>` are accepted.
pub fn parse_bind_address(address: &str) -> Result<SocketAddr> {
    let invalid = |reason: &str| Error::InvalidBindAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let multiaddr: Multiaddr = address.parse().map_err(|e| Error::InvalidBindAddress {
        address: address.to_string(),
        reason: format!("{e}"),
    })?;

    let mut protocols = multiaddr.iter();
    let ip: IpAddr = match protocols.next() {
        Some(Protocol::Ip4(ip)) => ip.into(),
        Some(Protocol::Ip6(ip)) => ip.into(),
        Some(other) => return Err(invalid(&format!("expected ip4 or ip6, found {other}"))),
        None => return Err(invalid("empty multiaddr")),
    };
    let port = match protocols.next() {
        Some(Protocol::Udp(port)) => port,
        Some(other) => return Err(invalid(&format!("must use UDP transport, found {other}"))),
        None => return Err(invalid("missing udp port")),
    };
    if let Some(extra) = protocols.next() {
        return Err(invalid(&format!("unexpected trailing protocol {extra}")));
    }

    Ok(SocketAddr::new(ip, port))
}
