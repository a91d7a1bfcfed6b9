// CONTRACT LIFECYCLE
// One-time initialization, pause/resume and validator appointment
//
// SAFETY INVARIANTS:
// 1. Owner and governance are written once, at initialization
// 2. Only Active → Paused and Paused → Active are reachable; EmergencyStopped is never entered
// 3. Validator membership is only ever granted here

use crate::access::{require_governance, require_owner};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, StateViolation};
use crate::events::ContractEvent;
use crate::execution::Execution;
use crate::request::{optional_str, Args};
use crate::types::{ContractState, Tier};
use log::info;

/// Argument keys accepted for the governance address, in priority order.
pub const GOVERNANCE_ARGS: [&str; 2] = ["_arg0", "governance_address"];

pub struct Lifecycle<'c> {
    config: &'c RegistryConfig,
}

impl<'c> Lifecycle<'c> {
    pub fn new(config: &'c RegistryConfig) -> Self {
        Lifecycle { config }
    }

    /// Set up roles, state and empty tier lists. Returns the governance address.
    pub fn initialize(&self, exec: &mut Execution<'_>, args: &Args) -> Result<String, RegistryError> {
        if exec.ledger().owner()?.is_some() || exec.ledger().contract_state()?.is_some() {
            return Err(StateViolation::AlreadyInitialized.into());
        }

        let owner = exec.caller().to_string();
        if owner.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "caller identity is empty".to_string(),
            ));
        }

        let mut governance = None;
        for key in GOVERNANCE_ARGS {
            if let Some(address) = optional_str(args, key)? {
                governance = Some(address);
                break;
            }
        }
        let governance = governance.unwrap_or_else(|| owner.clone());

        let ledger = exec.ledger_mut();
        ledger.save_contract_state(ContractState::Active);
        ledger.save_owner(&owner);
        ledger.save_governance(&governance);
        for tier in Tier::ALL {
            ledger.save_tier_members(tier, &[])?;
        }

        info!("Initialized registry, owner {}, governance {}", owner, governance);
        Ok(governance)
    }

    pub fn pause(&self, exec: &mut Execution<'_>) -> Result<(), RegistryError> {
        self.transition(exec, "pause", ContractState::Active, ContractState::Paused)?;
        exec.emit(ContractEvent::ContractPaused {
            timestamp: exec.now(),
        });
        info!("Contract paused by {}", exec.caller());
        Ok(())
    }

    pub fn resume(&self, exec: &mut Execution<'_>) -> Result<(), RegistryError> {
        self.transition(exec, "resume", ContractState::Paused, ContractState::Active)?;
        exec.emit(ContractEvent::ContractResumed {
            timestamp: exec.now(),
        });
        info!("Contract resumed by {}", exec.caller());
        Ok(())
    }

    fn transition(
        &self,
        exec: &mut Execution<'_>,
        action: &'static str,
        from: ContractState,
        to: ContractState,
    ) -> Result<(), RegistryError> {
        require_governance(exec)?;
        match exec.ledger().contract_state()? {
            Some(state) if state == from => {
                exec.ledger_mut().save_contract_state(to);
                Ok(())
            }
            Some(state) => Err(StateViolation::IllegalTransition { action, state }.into()),
            None => Err(StateViolation::NotInitialized.into()),
        }
    }

    pub fn add_validator(&self, exec: &mut Execution<'_>, address: &str) -> Result<(), RegistryError> {
        require_owner(exec)?;
        if address.chars().count() < self.config.min_validator_address_len {
            return Err(RegistryError::InvalidArgument(format!(
                "invalid validator address {:?}: shorter than {} characters",
                address, self.config.min_validator_address_len
            )));
        }

        exec.ledger_mut().save_validator(address);
        exec.emit(ContractEvent::ValidatorAdded {
            validator: address.to_string(),
            timestamp: exec.now(),
        });
        info!("Validator {} appointed", address);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use orasrs_state::MemoryLedger;

    const DEPLOYER: &str = "deployer-00001";
    const COUNCIL: &str = "council-000001";

    fn initialized(args: &Args) -> MemoryLedger {
        let config = RegistryConfig::default();
        let mut store = MemoryLedger::new();
        let mut exec = Execution::begin(&mut store, DEPLOYER, 0);
        Lifecycle::new(&config).initialize(&mut exec, args).unwrap();
        exec.commit().unwrap();
        store
    }

    fn args(pairs: &[(&str, &str)]) -> Args {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_governance_argument_priority() {
        let config = RegistryConfig::default();
        let lifecycle = Lifecycle::new(&config);

        for (pairs, expected) in [
            (vec![("_arg0", "gov-a"), ("governance_address", "gov-b")], "gov-a"),
            (vec![("_arg0", ""), ("governance_address", "gov-b")], "gov-b"),
            (vec![], DEPLOYER),
        ] {
            let mut store = MemoryLedger::new();
            let mut exec = Execution::begin(&mut store, DEPLOYER, 0);
            assert_eq!(lifecycle.initialize(&mut exec, &args(&pairs)).unwrap(), expected);
            assert_eq!(exec.ledger().owner().unwrap().as_deref(), Some(DEPLOYER));
            assert_eq!(exec.ledger().contract_state().unwrap(), Some(ContractState::Active));
        }
    }

    #[test]
    fn test_second_initialize_is_rejected() {
        let config = RegistryConfig::default();
        let mut store = initialized(&Args::new());

        let mut exec = Execution::begin(&mut store, "intruder-00001", 5);
        let err = Lifecycle::new(&config).initialize(&mut exec, &Args::new()).unwrap_err();
        assert_eq!(err.state_violation(), Some(&StateViolation::AlreadyInitialized));
    }

    #[test]
    fn test_pause_resume_transitions() {
        let config = RegistryConfig::default();
        let lifecycle = Lifecycle::new(&config);
        let mut store = initialized(&args(&[("_arg0", COUNCIL)]));

        let mut exec = Execution::begin(&mut store, COUNCIL, 10);
        let err = lifecycle.resume(&mut exec).unwrap_err();
        assert_eq!(
            err.state_violation(),
            Some(&StateViolation::IllegalTransition {
                action: "resume",
                state: ContractState::Active
            })
        );

        lifecycle.pause(&mut exec).unwrap();
        assert!(lifecycle.pause(&mut exec).is_err());
        lifecycle.resume(&mut exec).unwrap();
        assert_eq!(exec.ledger().contract_state().unwrap(), Some(ContractState::Active));
        assert_eq!(exec.pending_events().len(), 2);
    }

    #[test]
    fn test_pause_requires_governance() {
        let config = RegistryConfig::default();
        let mut store = initialized(&args(&[("_arg0", COUNCIL)]));

        let mut exec = Execution::begin(&mut store, DEPLOYER, 10);
        let err = Lifecycle::new(&config).pause(&mut exec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_add_validator_checks_owner_and_length() {
        let config = RegistryConfig::default();
        let lifecycle = Lifecycle::new(&config);
        let mut store = initialized(&Args::new());

        let mut exec = Execution::begin(&mut store, DEPLOYER, 10);
        assert_eq!(
            lifecycle.add_validator(&mut exec, "short").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        lifecycle.add_validator(&mut exec, "validator-0001").unwrap();
        assert!(exec.ledger().is_validator("validator-0001").unwrap());
        exec.abort();

        let mut exec = Execution::begin(&mut store, "validator-0001", 11);
        assert_eq!(
            lifecycle.add_validator(&mut exec, "validator-0002").unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
    }
}
