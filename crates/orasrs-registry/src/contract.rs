// CONTRACT DISPATCH
// Single entry point: parse the method, run one handler, commit, then emit
//
// SAFETY INVARIANTS:
// 1. Exactly one handler runs per invocation
// 2. A failed invocation writes nothing and emits nothing
// 3. Events reach the sink only after the host accepted the write batch
// 4. No state lives on the Contract itself; everything is in the host ledger

use crate::config::RegistryConfig;
use crate::error::{ErrorKind, RegistryError};
use crate::events::{ContractEvent, EventSink};
use crate::execution::Execution;
use crate::lifecycle::Lifecycle;
use crate::registry::{NodeRegistry, Registration};
use crate::reputation::ReputationEngine;
use crate::request::{Args, Invocation, Request};
use crate::staking::StakingEngine;
use crate::threat::{NoThreatAttestations, ThreatAttestations};
use crate::types::NodeInfo;
use crate::challenge;
use log::{debug, warn};
use orasrs_state::LedgerStore;

/// Outcome of one invocation, shaped as the host's `(success, payload, error)` triple.
#[derive(Debug)]
pub struct Response {
    pub success: bool,
    pub payload: Option<Vec<u8>>,
    pub error: Option<RegistryError>,
}

impl Response {
    pub fn ok(payload: Vec<u8>) -> Self {
        Response {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(error: RegistryError) -> Self {
        Response {
            success: false,
            payload: None,
            error: Some(error),
        }
    }

    /// Payload as UTF-8, if there is one and it decodes.
    pub fn payload_str(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(RegistryError::kind)
    }

    pub fn into_result(self) -> Result<Vec<u8>, RegistryError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.payload.unwrap_or_default()),
        }
    }

    pub fn into_triple(self) -> (bool, Option<Vec<u8>>, Option<RegistryError>) {
        (self.success, self.payload, self.error)
    }
}

pub struct Contract {
    config: RegistryConfig,
    threats: Box<dyn ThreatAttestations>,
}

impl Default for Contract {
    fn default() -> Self {
        Contract {
            config: RegistryConfig::default(),
            threats: Box::new(NoThreatAttestations),
        }
    }
}

impl Contract {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        config.validate()?;
        Ok(Contract {
            config,
            threats: Box::new(NoThreatAttestations),
        })
    }

    pub fn with_threat_attestations(mut self, handler: impl ThreatAttestations + 'static) -> Self {
        self.threats = Box::new(handler);
        self
    }

    /// One-time setup. The deploying caller becomes owner.
    pub fn initialize(
        &self,
        store: &mut dyn LedgerStore,
        invocation: &Invocation,
    ) -> Result<String, RegistryError> {
        let mut exec = Execution::begin(store, &invocation.caller, invocation.tx_timestamp);
        match Lifecycle::new(&self.config).initialize(&mut exec, &invocation.args) {
            Ok(governance) => {
                exec.commit()?;
                Ok(governance)
            }
            Err(e) => {
                exec.abort();
                warn!("initialize rejected for {}: {}", invocation.caller, e);
                Err(e)
            }
        }
    }

    pub fn invoke(
        &self,
        store: &mut dyn LedgerStore,
        sink: &mut dyn EventSink,
        invocation: &Invocation,
    ) -> Response {
        let request = match Request::parse(&invocation.args) {
            Ok(request) => request,
            Err(e) => {
                warn!("invocation by {} rejected: {}", invocation.caller, e);
                return Response::failure(e);
            }
        };
        let method = request.method_name();
        debug!("{} invoked by {} at {}", method, invocation.caller, invocation.tx_timestamp);

        match self.execute(store, invocation, request) {
            Ok((payload, events)) => {
                for event in &events {
                    sink.emit(event);
                }
                Response::ok(payload)
            }
            Err(e) => {
                warn!("{} rejected for {}: {}", method, invocation.caller, e);
                Response::failure(e)
            }
        }
    }

    fn execute(
        &self,
        store: &mut dyn LedgerStore,
        invocation: &Invocation,
        request: Request,
    ) -> Result<(Vec<u8>, Vec<ContractEvent>), RegistryError> {
        let read_only = request.is_read_only();
        let mut exec = Execution::begin(store, &invocation.caller, invocation.tx_timestamp);

        match self.route(&mut exec, request, &invocation.args) {
            Ok(payload) if read_only => {
                exec.abort();
                Ok((payload, Vec::new()))
            }
            Ok(payload) => {
                let events = exec.commit()?;
                Ok((payload, events))
            }
            Err(e) => {
                exec.abort();
                Err(e)
            }
        }
    }

    fn route(
        &self,
        exec: &mut Execution<'_>,
        request: Request,
        args: &Args,
    ) -> Result<Vec<u8>, RegistryError> {
        let config = &self.config;

        match request {
            Request::RegisterNode(register) => {
                match NodeRegistry::new(config).register(exec, register)? {
                    Registration::Created { .. } => Ok(b"Node registered successfully".to_vec()),
                    Registration::Updated { .. } => Ok(b"Node updated successfully".to_vec()),
                }
            }
            Request::GetNodeInfo { node_address } => {
                let info = match NodeRegistry::new(config).get_node(exec, &node_address) {
                    Ok(node) => NodeInfo {
                        node: Some(node),
                        success: true,
                        error: None,
                    },
                    Err(RegistryError::NotFound(message)) => NodeInfo {
                        node: None,
                        success: false,
                        error: Some(message),
                    },
                    Err(e) => return Err(e),
                };
                to_json("node info", &info)
            }
            Request::GetContractStats => {
                let stats = NodeRegistry::new(config).stats(exec)?;
                to_json("contract stats", &stats)
            }
            Request::UpdateReputation { node_address, delta } => {
                ReputationEngine::new(config).update_reputation(exec, &node_address, delta)?;
                Ok(b"Reputation updated successfully".to_vec())
            }
            Request::AddValidator { validator_address } => {
                Lifecycle::new(config).add_validator(exec, &validator_address)?;
                Ok(b"Validator added successfully".to_vec())
            }
            Request::PauseContract => {
                Lifecycle::new(config).pause(exec)?;
                Ok(b"Contract paused successfully".to_vec())
            }
            Request::ResumeContract => {
                Lifecycle::new(config).resume(exec)?;
                Ok(b"Contract resumed successfully".to_vec())
            }
            Request::SlashNode { node_address, reason } => {
                StakingEngine::new(config).slash(exec, &node_address, &reason)?;
                Ok(b"Node slashed successfully".to_vec())
            }
            Request::Stake { amount } => {
                StakingEngine::new(config).stake(exec, amount)?;
                Ok(b"Stake deposited successfully".to_vec())
            }
            Request::RequestWithdrawal { amount } => {
                StakingEngine::new(config).request_withdrawal(exec, amount)?;
                Ok(b"Withdrawal requested successfully".to_vec())
            }
            Request::GetPendingWithdrawal { node_address } => {
                let pending = StakingEngine::new(config).pending_withdrawal(exec, &node_address)?;
                Ok(pending.to_string().into_bytes())
            }
            Request::SubmitChallenge { cache_key, reason } => {
                challenge::submit_challenge(exec, &cache_key, &reason).map(String::into_bytes)
            }
            Request::Threat(method) => self.threats.handle(method, exec, args),
        }
    }
}

fn to_json<T: serde::Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>, RegistryError> {
    serde_json::to_vec(value).map_err(|e| RegistryError::CorruptRecord {
        what,
        detail: e.to_string(),
    })
}
