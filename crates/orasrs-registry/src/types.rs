use crate::config::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational status of a node.
///
/// Only `Active` and `Slashed` are reachable through the registry today.
/// `ThreatDetected`, `Verified` and `PendingRemoval` belong to the threat
/// attestation subsystem and are modeled without transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Unregistered,
    Registered,
    Active,
    Slashed,
    PendingRemoval,
    ThreatDetected,
    Verified,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeStatus::Unregistered => "UNREGISTERED",
            NodeStatus::Registered => "REGISTERED",
            NodeStatus::Active => "ACTIVE",
            NodeStatus::Slashed => "SLASHED",
            NodeStatus::PendingRemoval => "PENDING_REMOVAL",
            NodeStatus::ThreatDetected => "THREAT_DETECTED",
            NodeStatus::Verified => "VERIFIED",
        };
        f.write_str(label)
    }
}

/// Trust tier. Consensus is capacity-limited, edge is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Consensus,
    Partition,
    Edge,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Consensus, Tier::Partition, Tier::Edge];

    /// Map the wire `node_type` code: 0 consensus, 1 partition, anything else edge.
    pub fn from_node_type(code: u8) -> Self {
        match code {
            0 => Tier::Consensus,
            1 => Tier::Partition,
            _ => Tier::Edge,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Consensus => write!(f, "consensus"),
            Tier::Partition => write!(f, "partition"),
            Tier::Edge => write!(f, "edge"),
        }
    }
}

/// Process-wide contract state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractState {
    Active,
    Paused,
    /// Reserved terminal state; no operation in this crate enters or leaves it.
    EmergencyStopped,
}

impl ContractState {
    pub fn code(self) -> u8 {
        match self {
            ContractState::Active => 0,
            ContractState::Paused => 1,
            ContractState::EmergencyStopped => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ContractState::Active),
            1 => Some(ContractState::Paused),
            2 => Some(ContractState::EmergencyStopped),
            _ => None,
        }
    }
}

impl fmt::Display for ContractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractState::Active => write!(f, "Active"),
            ContractState::Paused => write!(f, "Paused"),
            ContractState::EmergencyStopped => write!(f, "EmergencyStopped"),
        }
    }
}

/// One registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Identity key, immutable after creation
    pub node_address: String,
    /// Human-assigned label, 1:1 with the address through the id index
    pub node_id: String,
    pub stake_amount: u64,
    /// Lock-period anchor
    pub stake_start: i64,
    pub reputation_score: u64,
    pub status: NodeStatus,
    /// Must agree with membership in the consensus list
    pub is_consensus_node: bool,

    pub is_threat_sensor: bool,
    pub agent_version: String,
    pub deployment_type: String,
    pub threat_score: u64,
    pub verified_threats: u64,
    pub compliance_zone: String,
    pub last_threat_report: i64,

    pub challenge_count: u64,
    pub challenges_won: u64,
    pub challenges_lost: u64,
    pub last_seen: i64,
}

impl Node {
    /// Fresh record for an open (stake-free) registration.
    pub fn new(
        node_address: String,
        node_id: String,
        agent_version: String,
        deployment_type: String,
        now: i64,
        config: &RegistryConfig,
    ) -> Self {
        Node {
            node_address,
            node_id,
            stake_amount: 0,
            stake_start: now,
            reputation_score: config.initial_reputation,
            status: NodeStatus::Active,
            is_consensus_node: false,
            is_threat_sensor: true,
            agent_version,
            deployment_type,
            threat_score: 0,
            verified_threats: 0,
            compliance_zone: config.default_compliance_zone.clone(),
            last_threat_report: 0,
            challenge_count: 0,
            challenges_won: 0,
            challenges_lost: 0,
            last_seen: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }

    pub fn is_slashed(&self) -> bool {
        self.status == NodeStatus::Slashed
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node {} @ {} (status={}, stake={}, reputation={}, consensus={})",
            self.node_id,
            self.node_address,
            self.status,
            self.stake_amount,
            self.reputation_score,
            self.is_consensus_node
        )
    }
}

/// `getNodeInfo` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node: Option<Node>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `getContractStats` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStats {
    pub total_staked: u64,
    pub active_nodes: u64,
    pub total_consensus_nodes: u64,
    pub total_partition_nodes: u64,
    pub total_edge_nodes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_codes() {
        assert_eq!(Tier::from_node_type(0), Tier::Consensus);
        assert_eq!(Tier::from_node_type(1), Tier::Partition);
        assert_eq!(Tier::from_node_type(2), Tier::Edge);
        assert_eq!(Tier::from_node_type(200), Tier::Edge);
    }

    #[test]
    fn test_contract_state_codes() {
        for state in [
            ContractState::Active,
            ContractState::Paused,
            ContractState::EmergencyStopped,
        ] {
            assert_eq!(ContractState::from_code(state.code()), Some(state));
        }
        assert_eq!(ContractState::from_code(3), None);
    }

    #[test]
    fn test_new_node_defaults() {
        let config = RegistryConfig::default();
        let node = Node::new(
            "addr-0000001".to_string(),
            "node-1".to_string(),
            "2.0.0".to_string(),
            "edge".to_string(),
            1_700_000_000,
            &config,
        );

        assert_eq!(node.stake_amount, 0);
        assert_eq!(node.reputation_score, 50);
        assert_eq!(node.status, NodeStatus::Active);
        assert!(node.is_threat_sensor);
        assert!(!node.is_consensus_node);
        assert_eq!(node.compliance_zone, "GLOBAL");
        assert_eq!(node.stake_start, 1_700_000_000);
        assert_eq!(node.last_seen, 1_700_000_000);
    }
}
