// ACCESS CONTROL
// Owner, governance and validator checks against the invocation caller,
// plus the contract-state gate for node-facing mutations
//
// SAFETY INVARIANTS:
// 1. Checks are read + compare only; they never write
// 2. Checks fail closed: an unset register authorizes nobody

use crate::error::{RegistryError, StateViolation};
use crate::execution::Execution;
use crate::types::ContractState;

/// Contract must be initialized and Active.
pub fn require_active(exec: &Execution<'_>) -> Result<(), RegistryError> {
    match exec.ledger().contract_state()? {
        Some(ContractState::Active) => Ok(()),
        Some(state) => Err(StateViolation::ContractNotActive(state).into()),
        None => Err(StateViolation::NotInitialized.into()),
    }
}

pub fn require_owner(exec: &Execution<'_>) -> Result<(), RegistryError> {
    let caller = exec.caller();
    match exec.ledger().owner()? {
        Some(owner) if owner == caller => Ok(()),
        Some(owner) => Err(RegistryError::Unauthorized(format!(
            "only owner can call this function, caller: {}, owner: {}",
            caller, owner
        ))),
        None => Err(RegistryError::Unauthorized(format!(
            "owner is not set, caller {} rejected",
            caller
        ))),
    }
}

pub fn require_governance(exec: &Execution<'_>) -> Result<(), RegistryError> {
    let caller = exec.caller();
    match exec.ledger().governance()? {
        Some(governance) if governance == caller => Ok(()),
        Some(governance) => Err(RegistryError::Unauthorized(format!(
            "only governance can call this function, caller: {}, governance: {}",
            caller, governance
        ))),
        None => Err(RegistryError::Unauthorized(format!(
            "governance is not set, caller {} rejected",
            caller
        ))),
    }
}

pub fn require_validator(exec: &Execution<'_>) -> Result<(), RegistryError> {
    let caller = exec.caller();
    if exec.ledger().is_validator(caller)? {
        Ok(())
    } else {
        Err(RegistryError::Unauthorized(format!(
            "only authorized validators can call this function, caller: {}",
            caller
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use orasrs_state::MemoryLedger;

    #[test]
    fn test_unset_registers_fail_closed() {
        let mut store = MemoryLedger::new();
        let exec = Execution::begin(&mut store, "anyone-000000", 0);

        assert_eq!(require_owner(&exec).unwrap_err().kind(), ErrorKind::Unauthorized);
        assert_eq!(require_governance(&exec).unwrap_err().kind(), ErrorKind::Unauthorized);
        assert_eq!(require_validator(&exec).unwrap_err().kind(), ErrorKind::Unauthorized);
        assert_eq!(
            require_active(&exec).unwrap_err().state_violation(),
            Some(&StateViolation::NotInitialized)
        );
    }

    #[test]
    fn test_paused_contract_is_not_active() {
        let mut store = MemoryLedger::new();
        let mut exec = Execution::begin(&mut store, "anyone-000000", 0);
        exec.ledger_mut().save_contract_state(ContractState::Paused);

        assert_eq!(
            require_active(&exec).unwrap_err().state_violation(),
            Some(&StateViolation::ContractNotActive(ContractState::Paused))
        );
    }

    #[test]
    fn test_roles_are_independent() {
        let mut store = MemoryLedger::new();
        {
            let mut exec = Execution::begin(&mut store, "deployer-0001", 0);
            exec.ledger_mut().save_owner("deployer-0001");
            exec.ledger_mut().save_governance("council-00001");
            exec.commit().unwrap();
        }

        let exec = Execution::begin(&mut store, "deployer-0001", 0);
        assert!(require_owner(&exec).is_ok());
        assert!(require_governance(&exec).is_err());
        assert!(require_validator(&exec).is_err());
        exec.abort();

        let exec = Execution::begin(&mut store, "council-00001", 0);
        assert!(require_owner(&exec).is_err());
        assert!(require_governance(&exec).is_ok());
    }
}
