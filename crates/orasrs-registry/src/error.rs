use crate::types::{ContractState, Tier};
use orasrs_state::LedgerError;
use thiserror::Error;

/// Flat classification of a RegistryError, stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidArgument,
    InvalidState,
    InvalidMethod,
    Unsupported,
    Storage,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(#[from] StateViolation),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Storage error: {0}")]
    Storage(#[from] LedgerError),

    #[error("Corrupt {what} record: {detail}")]
    CorruptRecord { what: &'static str, detail: String },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Unauthorized(_) => ErrorKind::Unauthorized,
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RegistryError::InvalidState(_) => ErrorKind::InvalidState,
            RegistryError::InvalidMethod(_) => ErrorKind::InvalidMethod,
            RegistryError::Unsupported(_) => ErrorKind::Unsupported,
            RegistryError::Storage(_) | RegistryError::CorruptRecord { .. } => ErrorKind::Storage,
        }
    }

    pub fn state_violation(&self) -> Option<&StateViolation> {
        match self {
            RegistryError::InvalidState(violation) => Some(violation),
            _ => None,
        }
    }
}

/// Business-rule and lifecycle violations, all reported as `InvalidState`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateViolation {
    #[error("contract is not initialized")]
    NotInitialized,

    #[error("contract is already initialized")]
    AlreadyInitialized,

    #[error("contract is not active, current state: {0}")]
    ContractNotActive(ContractState),

    #[error("cannot {action} while contract is {state}")]
    IllegalTransition { action: &'static str, state: ContractState },

    #[error("max consensus nodes reached: {limit}")]
    CapacityExceeded { limit: usize },

    #[error("node already in {tier} list: {address}")]
    DuplicateMembership { address: String, tier: Tier },

    #[error("address {address} is already registered as node {node_id}")]
    AddressAlreadyRegistered { address: String, node_id: String },

    #[error("insufficient stake amount for {address}, available: {available}, requested: {requested}")]
    InsufficientStake {
        address: String,
        available: u64,
        requested: u64,
    },

    #[error("lock period not ended for {address}, unlocks at {unlocks_at}, now {now}")]
    LockPeriodActive {
        address: String,
        unlocks_at: i64,
        now: i64,
    },

    #[error("slashed node {0} cannot perform this operation")]
    NodeSlashed(String),

    #[error("{0} is not an active node")]
    InactiveNode(String),

    #[error("{what} would overflow for {address}")]
    Overflow { what: &'static str, address: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_violations_classify_as_invalid_state() {
        let err: RegistryError = StateViolation::CapacityExceeded { limit: 21 }.into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(
            err.state_violation(),
            Some(&StateViolation::CapacityExceeded { limit: 21 })
        );
    }

    #[test]
    fn test_messages_carry_amounts() {
        let err: RegistryError = StateViolation::InsufficientStake {
            address: "addr-1".to_string(),
            available: 10,
            requested: 25,
        }
        .into();
        let message = err.to_string();
        assert!(message.contains("available: 10"));
        assert!(message.contains("requested: 25"));
        assert!(message.contains("addr-1"));
    }
}
