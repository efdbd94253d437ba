//! Accumulator of records seen in lookup results.

use std::collections::BTreeMap;
use std::sync::Arc;

use discv5::Enr;
use tokio::sync::RwLock;

/// Node id to most recently observed record, last write wins.
///
/// Cloning yields another handle to the same map. Entries are kept in node
/// id order, so [`snapshot`](Self::snapshot) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct FoundRecords {
    inner: Arc<RwLock<BTreeMap<[u8; 32], Enr>>>,
}

impl FoundRecords {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge records, overwriting any earlier record with the same node id.
    ///
    /// Returns how many node ids were seen for the first time.
    pub async fn merge<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = Enr>,
    {
        let mut map = self.inner.write().await;
        records
            .into_iter()
            .filter(|record| map.insert(record.node_id().raw(), record.clone()).is_none())
            .count()
    }

    /// Number of distinct node ids.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether nothing has been found yet.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Copy of all records, ordered by node id.
    pub async fn snapshot(&self) -> Vec<Enr> {
        self.inner.read().await.values().cloned().collect()
    }
}
