//! Error types for discv5-service.

use std::path::PathBuf;

use crate::engine::EngineError;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The peer identity file does not exist and the policy forbids creating one.
    #[error("peer identity file not found: {}", .0.display())]
    IdentityMissing(PathBuf),

    /// The peer identity file exists but does not hold a usable keypair.
    #[error("invalid peer identity in {}: {reason}", path.display())]
    InvalidIdentity {
        /// File that was read.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A line of a record file is not a valid ENR.
    #[error("invalid record at {}:{line}: {reason}", path.display())]
    RecordParse {
        /// File that was read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Decoder message.
        reason: String,
    },

    /// The bind address is not a UDP multiaddr.
    #[error("invalid bind address '{address}': {reason}")]
    InvalidBindAddress {
        /// The address text as given.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A state file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    PersistenceWrite {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error while reading an input file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Error surfaced by the discovery engine.
    #[error("discovery engine error: {0}")]
    Engine(#[from] EngineError),
}

impl Error {
    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a persistence error for a path.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PersistenceWrite {
            path: path.into(),
            source,
        }
    }
}
