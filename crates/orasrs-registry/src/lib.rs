//! OraSRS node registry.
//!
//! A deterministic state machine over a host key-value ledger: node
//! registration into three trust tiers, staking with a lock period,
//! governance slashing, validator-driven reputation and contract lifecycle.
//! All behavior is reached through [`Contract::invoke`].

pub mod access;
pub mod accessor;
pub mod challenge;
pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod execution;
pub mod keys;
pub mod lifecycle;
pub mod registry;
pub mod reputation;
pub mod request;
pub mod staking;
pub mod threat;
pub mod types;

pub use config::RegistryConfig;
pub use contract::{Contract, Response};
pub use error::{ErrorKind, RegistryError, StateViolation};
pub use events::{ContractEvent, EventLog, EventSink};
pub use execution::Execution;
pub use registry::{NodeRegistry, RegisterRequest, Registration};
pub use request::{Args, Invocation, Request};
pub use threat::{NoThreatAttestations, ThreatAttestations, ThreatMethod};
pub use types::{ContractState, ContractStats, Node, NodeInfo, NodeStatus, Tier};
