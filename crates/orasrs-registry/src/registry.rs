// NODE REGISTRY
// Node records, the id→address index and the three tier lists
//
// SAFETY INVARIANTS:
// 1. An address appears in at most one tier list
// 2. is_consensus_node == true iff the address is in the consensus list
// 3. The consensus list never exceeds max_consensus_nodes
// 4. A node id resolves to exactly one address and is never reassigned
// 5. Nodes are never deleted

use crate::access::require_active;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, StateViolation};
use crate::events::ContractEvent;
use crate::execution::Execution;
use crate::types::{ContractStats, Node, NodeStatus, Tier};
use log::{debug, info};

/// Typed `registerNode` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub node_id: Option<String>,
    pub tier: Tier,
    pub agent_version: Option<String>,
    pub deployment_type: Option<String>,
}

impl RegisterRequest {
    pub fn new(tier: Tier) -> Self {
        RegisterRequest {
            node_id: None,
            tier,
            agent_version: None,
            deployment_type: None,
        }
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Created { node_id: String, tier: Tier },
    Updated { node_id: String },
}

/// `node_<first 8 chars of caller>_<timestamp>`
pub fn synthesize_node_id(caller: &str, now: i64) -> String {
    let prefix: String = caller.chars().take(8).collect();
    format!("node_{}_{}", prefix, now)
}

pub struct NodeRegistry<'c> {
    config: &'c RegistryConfig,
}

impl<'c> NodeRegistry<'c> {
    pub fn new(config: &'c RegistryConfig) -> Self {
        NodeRegistry { config }
    }

    /// Create a node for the caller, or refresh the metadata of an existing
    /// node. Without an explicit id the caller's own node is refreshed.
    pub fn register(
        &self,
        exec: &mut Execution<'_>,
        request: RegisterRequest,
    ) -> Result<Registration, RegistryError> {
        require_active(exec)?;

        let caller = exec.caller().to_string();
        if caller.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "caller identity is empty".to_string(),
            ));
        }

        let now = exec.now();
        let node_id = match request.node_id.clone() {
            Some(node_id) => node_id,
            None => match exec.ledger().load_node(&caller)? {
                Some(existing) => return self.refresh(exec, existing.node_id, &caller, request),
                None => synthesize_node_id(&caller, now),
            },
        };

        if let Some(owner) = exec.ledger().node_address_by_id(&node_id)? {
            return self.refresh(exec, node_id, &owner, request);
        }

        if let Some(existing) = exec.ledger().load_node(&caller)? {
            return Err(StateViolation::AddressAlreadyRegistered {
                address: caller,
                node_id: existing.node_id,
            }
            .into());
        }

        let mut node = Node::new(
            caller.clone(),
            node_id.clone(),
            request
                .agent_version
                .unwrap_or_else(|| self.config.default_agent_version.clone()),
            request
                .deployment_type
                .unwrap_or_else(|| self.config.default_deployment_type.clone()),
            now,
            self.config,
        );

        self.insert_into_tier(exec, &caller, request.tier)?;
        node.is_consensus_node = request.tier == Tier::Consensus;

        debug!(
            "{} tier minimum stake {} is published but not enforced",
            request.tier,
            self.config.min_stake.for_tier(request.tier)
        );

        exec.ledger_mut().save_node(&node)?;
        exec.emit(ContractEvent::NodeRegistered {
            node_id: node_id.clone(),
            address: caller.clone(),
            timestamp: now,
        });

        info!("Registered node {} for {} in {} tier", node_id, caller, request.tier);
        Ok(Registration::Created {
            node_id,
            tier: request.tier,
        })
    }

    fn refresh(
        &self,
        exec: &mut Execution<'_>,
        node_id: String,
        owner: &str,
        request: RegisterRequest,
    ) -> Result<Registration, RegistryError> {
        if owner != exec.caller() {
            return Err(RegistryError::Unauthorized(format!(
                "node id {} belongs to {}, caller: {}",
                node_id,
                owner,
                exec.caller()
            )));
        }

        let mut node = exec.ledger().node(owner)?;
        node.agent_version = request
            .agent_version
            .unwrap_or_else(|| self.config.default_agent_version.clone());
        node.deployment_type = request
            .deployment_type
            .unwrap_or_else(|| self.config.default_deployment_type.clone());
        node.last_seen = exec.now();
        node.status = NodeStatus::Active;

        exec.ledger_mut().save_node(&node)?;
        exec.emit(ContractEvent::NodeUpdated {
            node_id: node_id.clone(),
            address: owner.to_string(),
            timestamp: exec.now(),
        });

        info!("Updated node {} ({})", node_id, node.status);
        Ok(Registration::Updated { node_id })
    }

    pub fn get_node(&self, exec: &Execution<'_>, address: &str) -> Result<Node, RegistryError> {
        exec.ledger().node(address)
    }

    /// Aggregate over the tier lists. Stake and the active count only include
    /// Active nodes; list lengths include every member.
    pub fn stats(&self, exec: &Execution<'_>) -> Result<ContractStats, RegistryError> {
        let mut stats = ContractStats::default();

        for tier in Tier::ALL {
            let members = exec.ledger().tier_members(tier)?;
            let count = members.len() as u64;
            match tier {
                Tier::Consensus => stats.total_consensus_nodes = count,
                Tier::Partition => stats.total_partition_nodes = count,
                Tier::Edge => stats.total_edge_nodes = count,
            }

            for address in &members {
                match exec.ledger().load_node(address)? {
                    Some(node) if node.is_active() => {
                        stats.total_staked = stats.total_staked.saturating_add(node.stake_amount);
                        stats.active_nodes += 1;
                    }
                    Some(_) => {}
                    None => debug!("{} list references missing node {}", tier, address),
                }
            }
        }

        Ok(stats)
    }

    pub fn insert_into_tier(
        &self,
        exec: &mut Execution<'_>,
        address: &str,
        tier: Tier,
    ) -> Result<(), RegistryError> {
        let mut members = exec.ledger().tier_members(tier)?;

        if tier == Tier::Consensus && members.len() >= self.config.max_consensus_nodes {
            return Err(StateViolation::CapacityExceeded {
                limit: self.config.max_consensus_nodes,
            }
            .into());
        }
        if members.iter().any(|member| member == address) {
            return Err(StateViolation::DuplicateMembership {
                address: address.to_string(),
                tier,
            }
            .into());
        }

        members.push(address.to_string());
        exec.ledger_mut().save_tier_members(tier, &members)
    }

    /// Order-preserving removal. Returns whether the address was a member;
    /// nothing is written when it was not.
    pub fn remove_from_consensus_list(
        &self,
        exec: &mut Execution<'_>,
        address: &str,
    ) -> Result<bool, RegistryError> {
        let mut members = exec.ledger().tier_members(Tier::Consensus)?;
        let before = members.len();
        members.retain(|member| member != address);

        if members.len() == before {
            return Ok(false);
        }
        exec.ledger_mut().save_tier_members(Tier::Consensus, &members)?;
        info!("Removed {} from consensus list", address);
        Ok(true)
    }

    /// The tier list holding `address`, if any.
    pub fn tier_of(&self, exec: &Execution<'_>, address: &str) -> Result<Option<Tier>, RegistryError> {
        for tier in Tier::ALL {
            if exec.ledger().tier_members(tier)?.iter().any(|m| m == address) {
                return Ok(Some(tier));
            }
        }
        Ok(None)
    }
}
