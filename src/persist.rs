//! Persistence of identity, local record and discovered records.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use crate::engine::DiscoveryEngine;
use crate::error::{Error, Result};
use crate::found::FoundRecords;
use crate::identity::write_identity;
use crate::records::{write_record, write_records};

/// Files written on every save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistPaths {
    /// Peer identity file.
    pub peer_id_file: PathBuf,
    /// Local ENR file.
    pub local_enr_file: PathBuf,
    /// Discovered ENRs, one per line.
    pub output_enrs_file: PathBuf,
}

/// Summary of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Number of records written to the output file.
    pub records: usize,
}

/// Writes the engine's identity and record plus the found records.
pub struct PersistenceWriter<E: ?Sized> {
    engine: Arc<E>,
    found: FoundRecords,
    paths: PersistPaths,
}

impl<E: ?Sized> Clone for PersistenceWriter<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            found: self.found.clone(),
            paths: self.paths.clone(),
        }
    }
}

impl<E: DiscoveryEngine + ?Sized> PersistenceWriter<E> {
    /// Create a writer for an engine and its accumulator.
    pub fn new(engine: Arc<E>, found: FoundRecords, paths: PersistPaths) -> Self {
        Self {
            engine,
            found,
            paths,
        }
    }

    /// Target paths.
    pub fn paths(&self) -> &PersistPaths {
        &self.paths
    }

    /// Write all three files.
    ///
    /// Each file is written independently; a failure on one does not skip
    /// the others. The first failure is returned.
    pub async fn save(&self) -> Result<SaveReport> {
        let identity = self.engine.current_identity().await;
        let local_record = self.engine.local_record().await;
        let records = self.found.snapshot().await;

        let results = [
            write_identity(&self.paths.peer_id_file, &identity).await,
            write_record(&self.paths.local_enr_file, &local_record).await,
            write_records(&self.paths.output_enrs_file, &records).await,
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                error!(error = %e, "Failed to persist discovery state");
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            records = records.len(),
            output = %self.paths.output_enrs_file.display(),
            "Saved discovery state"
        );
        Ok(SaveReport {
            records: records.len(),
        })
    }
}

/// Replace `path` with `contents` via a sibling temp file and rename.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = tokio::fs::write(&tmp, contents).await {
        return Err(Error::persistence(path, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(Error::persistence(path, e));
    }
    Ok(())
}
