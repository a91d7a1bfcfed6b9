// LEDGER ACCESSOR
// The host key-value store contract and the batch handed to it at commit time
//
// SAFETY INVARIANTS:
// 1. Contract code reaches the host store only through LedgerStore
// 2. A WriteBatch holds at most one value per key (last write wins)
// 3. Batches are applied in ascending key order, so replay is deterministic

use std::collections::btree_map;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger backend error: {0}")]
    Backend(String),

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot codec error: {0}")]
    Codec(String),
}

/// Host-supplied key-value store.
///
/// SAFETY: The host guarantees that one invocation's reads and writes are
/// serialized against every other invocation. Implementations need no locking
/// of their own.
pub trait LedgerStore {
    /// Read a value. `Ok(None)` means the key has never been written.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write a single value.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), LedgerError>;

    /// Apply every write of an invocation as one unit.
    ///
    /// The default replays `put` in key order, which is only as atomic as the
    /// host's own transaction boundary. Stores that can swap state in one step
    /// should override it.
    fn apply(&mut self, batch: WriteBatch) -> Result<(), LedgerError> {
        for (key, value) in batch {
            self.put(&key, &value)?;
        }
        Ok(())
    }
}

/// Ordered set of pending writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a write, replacing any earlier write to the same key.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
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
}

impl IntoIterator for WriteBatch {
    type Item = (Vec<u8>, Vec<u8>);
    type IntoIter = btree_map::IntoIter<Vec<u8>, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_last_write_wins() {
        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"one".to_vec());
        batch.put(b"k".to_vec(), b"two".to_vec());

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get(b"k"), Some(&b"two"[..]));
    }

    #[test]
    fn test_batch_iterates_in_key_order() {
        let mut batch = WriteBatch::new();
        batch.put(b"b".to_vec(), b"2".to_vec());
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.put(b"c".to_vec(), b"3".to_vec());

        let keys: Vec<&[u8]> = batch.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
    }
}
