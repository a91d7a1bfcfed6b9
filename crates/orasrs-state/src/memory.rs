// IN-MEMORY LEDGER
// Reference LedgerStore used by tests, embedders and the CLI harness
//
// SAFETY INVARIANTS:
// 1. apply() is all-or-nothing: the batch is merged in a single step
// 2. Snapshots are byte-exact (keys and values are hex-encoded)

use crate::ledger::{LedgerError, LedgerStore, WriteBatch};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// On-disk form of a MemoryLedger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    /// hex(key) → hex(value)
    pub entries: BTreeMap<String, String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.as_slice())
    }

    pub fn to_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (hex::encode(k), hex::encode(v)))
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(LedgerError::Codec(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let mut entries = BTreeMap::new();
        for (key, value) in snapshot.entries {
            let key = hex::decode(&key)
                .map_err(|e| LedgerError::Codec(format!("bad key {}: {}", key, e)))?;
            let value = hex::decode(&value)
                .map_err(|e| LedgerError::Codec(format!("bad value: {}", e)))?;
            entries.insert(key, value);
        }
        Ok(MemoryLedger { entries })
    }

    pub fn load_json(path: &Path) -> Result<Self, LedgerError> {
        let raw = fs::read(path)?;
        let snapshot: LedgerSnapshot =
            serde_json::from_slice(&raw).map_err(|e| LedgerError::Codec(e.to_string()))?;
        let ledger = Self::from_snapshot(snapshot)?;
        debug!("Loaded {} ledger entries from {}", ledger.len(), path.display());
        Ok(ledger)
    }

    /// Write the snapshot next to `path` and rename it into place.
    pub fn save_json(&self, path: &Path) -> Result<(), LedgerError> {
        let encoded = serde_json::to_vec_pretty(&self.to_snapshot())
            .map_err(|e| LedgerError::Codec(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, path)?;
        info!("Saved {} ledger entries to {}", self.len(), path.display());
        Ok(())
    }
}

impl LedgerStore for MemoryLedger {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), LedgerError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<(), LedgerError> {
        self.entries.extend(batch);
        Ok(())
    }
}
