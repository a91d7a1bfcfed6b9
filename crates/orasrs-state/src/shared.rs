use crate::memory::MemoryLedger;
use parking_lot::Mutex;
use std::sync::Arc;

/// A MemoryLedger shared between threads, with whole-invocation serialization.
///
/// SAFETY: Models the host guarantee that invocations never interleave. The
/// lock is held for the entire closure, so every read and the final commit of
/// one invocation happen before the next invocation starts.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<MemoryLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: MemoryLedger) -> Self {
        SharedLedger {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn serialized<R>(&self, invocation: impl FnOnce(&mut MemoryLedger) -> R) -> R {
        let mut guard = self.inner.lock();
        invocation(&mut guard)
    }

    pub fn snapshot(&self) -> MemoryLedger {
        self.inner.lock().clone()
    }
}
