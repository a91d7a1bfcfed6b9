use crate::accessor::LedgerAccessor;
use crate::error::RegistryError;
use crate::events::ContractEvent;
use orasrs_state::LedgerStore;

/// One invocation in flight: staged ledger, host context and buffered events.
///
/// SAFETY: Components mutate only through `ledger_mut()` and `emit()`. Both are
/// buffered, so an error anywhere before `commit()` leaves no trace.
pub struct Execution<'a> {
    ledger: LedgerAccessor<'a>,
    caller: String,
    now: i64,
    events: Vec<ContractEvent>,
}

impl<'a> Execution<'a> {
    pub fn begin(store: &'a mut dyn LedgerStore, caller: &str, now: i64) -> Self {
        Execution {
            ledger: LedgerAccessor::new(store),
            caller: caller.to_string(),
            now,
            events: Vec::new(),
        }
    }

    /// Identity executing the invocation, as supplied by the host.
    pub fn caller(&self) -> &str {
        &self.caller
    }

    /// Logical transaction timestamp, in seconds.
    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn ledger(&self) -> &LedgerAccessor<'a> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut LedgerAccessor<'a> {
        &mut self.ledger
    }

    pub fn emit(&mut self, event: ContractEvent) {
        self.events.push(event);
    }

    pub fn pending_events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Commit staged writes and release the buffered events.
    pub fn commit(self) -> Result<Vec<ContractEvent>, RegistryError> {
        self.ledger.commit()?;
        Ok(self.events)
    }

    pub fn abort(self) {
        self.ledger.discard();
    }
}
