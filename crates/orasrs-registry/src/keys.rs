// LEDGER KEY LAYOUT
//
// SAFETY INVARIANTS:
// 1. Every key is a fixed prefix followed by an entity identifier (or nothing, for singletons)
// 2. No prefix is a prefix of another, so keys never collide across entity types

use crate::types::Tier;

pub const NODE_PREFIX: &str = "NODE_";
pub const NODE_ID_INDEX_PREFIX: &str = "NODEID_TO_ADDR_";
pub const CONSENSUS_NODES: &str = "CONSENSUS_NODES";
pub const PARTITION_NODES: &str = "PARTITION_NODES";
pub const EDGE_NODES: &str = "EDGE_NODES";
pub const PENDING_WITHDRAWAL_PREFIX: &str = "PENDING_WITHDRAWAL_";
pub const OWNER: &str = "OWNER_";
pub const GOVERNANCE: &str = "GOVERNANCE_";
pub const CONTRACT_STATE: &str = "CONTRACT_STATE_";
pub const VALIDATOR_PREFIX: &str = "VALIDATOR_";

pub const ALL_PREFIXES: [&str; 10] = [
    NODE_PREFIX,
    NODE_ID_INDEX_PREFIX,
    CONSENSUS_NODES,
    PARTITION_NODES,
    EDGE_NODES,
    PENDING_WITHDRAWAL_PREFIX,
    OWNER,
    GOVERNANCE,
    CONTRACT_STATE,
    VALIDATOR_PREFIX,
];

fn prefixed(prefix: &str, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + id.len());
    key.extend_from_slice(prefix.as_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}

pub fn node(address: &str) -> Vec<u8> {
    prefixed(NODE_PREFIX, address)
}

pub fn node_id_index(node_id: &str) -> Vec<u8> {
    prefixed(NODE_ID_INDEX_PREFIX, node_id)
}

pub fn tier_list(tier: Tier) -> &'static [u8] {
    match tier {
        Tier::Consensus => CONSENSUS_NODES.as_bytes(),
        Tier::Partition => PARTITION_NODES.as_bytes(),
        Tier::Edge => EDGE_NODES.as_bytes(),
    }
}

pub fn pending_withdrawal(address: &str) -> Vec<u8> {
    prefixed(PENDING_WITHDRAWAL_PREFIX, address)
}

pub fn validator(address: &str) -> Vec<u8> {
    prefixed(VALIDATOR_PREFIX, address)
}
