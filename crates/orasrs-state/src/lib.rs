pub mod ledger;
pub mod staged;
pub mod memory;
pub mod shared;

pub use ledger::{LedgerError, LedgerStore, WriteBatch};
pub use staged::StagedLedger;
pub use memory::{LedgerSnapshot, MemoryLedger};
pub use shared::SharedLedger;
