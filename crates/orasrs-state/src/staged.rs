// STAGED LEDGER
// Buffer-then-commit overlay used for every contract invocation
//
// SAFETY INVARIANTS:
// 1. Reads observe the invocation's own staged writes before the host store
// 2. Nothing reaches the host store before commit()
// 3. Dropping or discarding a StagedLedger leaves the host store untouched
// 4. commit() hands the host exactly one WriteBatch

use crate::ledger::{LedgerError, LedgerStore, WriteBatch};
use log::debug;

pub struct StagedLedger<'a> {
    base: &'a mut dyn LedgerStore,
    pending: WriteBatch,
}

impl<'a> StagedLedger<'a> {
    pub fn new(base: &'a mut dyn LedgerStore) -> Self {
        StagedLedger {
            base,
            pending: WriteBatch::new(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        if let Some(value) = self.pending.get(key) {
            return Ok(Some(value.to_vec()));
        }
        self.base.get(key)
    }

    /// Stage a write. Never touches the host store.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.pending.put(key.to_vec(), value.to_vec());
    }

    pub fn pending(&self) -> &WriteBatch {
        &self.pending
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Hand every staged write to the host store and return how many keys were written.
    pub fn commit(self) -> Result<usize, LedgerError> {
        let written = self.pending.len();
        if written == 0 {
            return Ok(0);
        }
        self.base.apply(self.pending)?;
        debug!("Committed {} staged ledger writes", written);
        Ok(written)
    }

    /// Drop every staged write and return how many were discarded.
    pub fn discard(self) -> usize {
        let dropped = self.pending.len();
        if dropped > 0 {
            debug!("Discarded {} staged ledger writes", dropped);
        }
        dropped
    }
}
