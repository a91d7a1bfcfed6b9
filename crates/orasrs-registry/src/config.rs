use crate::error::RegistryError;
use crate::types::Tier;
use serde::{Deserialize, Serialize};

/// Seven days, in seconds.
pub const STAKE_LOCK_PERIOD_SECS: i64 = 7 * 24 * 60 * 60;
pub const MAX_CONSENSUS_NODES: usize = 21;
pub const SLASH_PENALTY_RATE: u64 = 100;
pub const INITIAL_REPUTATION: u64 = 50;
pub const MAX_REPUTATION: u64 = 1000;
pub const CONSENSUS_DEMOTION_THRESHOLD: u64 = 80;
pub const REPUTATION_REWARD_THRESHOLD: u64 = 120;
pub const MIN_STAKE_ROOT: u64 = 10_000;
pub const MIN_STAKE_PARTITION: u64 = 5_000;
pub const MIN_STAKE_EDGE: u64 = 100;
pub const MIN_VALIDATOR_ADDRESS_LEN: usize = 10;

/// Per-tier minimum stake.
///
/// Registration is open: these thresholds are published but never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinStake {
    pub root: u64,
    pub partition: u64,
    pub edge: u64,
}

impl Default for MinStake {
    fn default() -> Self {
        MinStake {
            root: MIN_STAKE_ROOT,
            partition: MIN_STAKE_PARTITION,
            edge: MIN_STAKE_EDGE,
        }
    }
}

impl MinStake {
    pub fn for_tier(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Consensus => self.root,
            Tier::Partition => self.partition,
            Tier::Edge => self.edge,
        }
    }
}

/// Registry tunables.
///
/// SAFETY: Every node executing the registry must run with identical values,
/// otherwise invocations stop being deterministic across the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub stake_lock_period_secs: i64,
    pub max_consensus_nodes: usize,
    /// Percentage of stake forfeited on slash (100 = everything)
    pub slash_penalty_rate: u64,
    pub initial_reputation: u64,
    pub max_reputation: u64,
    /// Consensus members scoring below this are demoted
    pub consensus_demotion_threshold: u64,
    /// Reserved: scores above this would earn a bonus, none is applied today
    pub reputation_reward_threshold: u64,
    pub min_stake: MinStake,
    pub min_validator_address_len: usize,
    pub default_agent_version: String,
    pub default_deployment_type: String,
    pub default_compliance_zone: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            stake_lock_period_secs: STAKE_LOCK_PERIOD_SECS,
            max_consensus_nodes: MAX_CONSENSUS_NODES,
            slash_penalty_rate: SLASH_PENALTY_RATE,
            initial_reputation: INITIAL_REPUTATION,
            max_reputation: MAX_REPUTATION,
            consensus_demotion_threshold: CONSENSUS_DEMOTION_THRESHOLD,
            reputation_reward_threshold: REPUTATION_REWARD_THRESHOLD,
            min_stake: MinStake::default(),
            min_validator_address_len: MIN_VALIDATOR_ADDRESS_LEN,
            default_agent_version: "2.0.0".to_string(),
            default_deployment_type: "edge".to_string(),
            default_compliance_zone: "GLOBAL".to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), RegistryError> {
        let invalid = |msg: String| -> Result<(), RegistryError> {
            Err(RegistryError::InvalidArgument(msg))
        };

        if self.stake_lock_period_secs < 0 {
            return invalid(format!(
                "stake_lock_period_secs must be >= 0, got {}",
                self.stake_lock_period_secs
            ));
        }
        if self.max_consensus_nodes == 0 {
            return invalid("max_consensus_nodes must be > 0".to_string());
        }
        if self.slash_penalty_rate > 100 {
            return invalid(format!(
                "slash_penalty_rate must be <= 100, got {}",
                self.slash_penalty_rate
            ));
        }
        if self.max_reputation > i64::MAX as u64 {
            return invalid("max_reputation does not fit a signed score".to_string());
        }
        if self.initial_reputation > self.max_reputation {
            return invalid(format!(
                "initial_reputation {} exceeds max_reputation {}",
                self.initial_reputation, self.max_reputation
            ));
        }
        if self.consensus_demotion_threshold > self.max_reputation {
            return invalid(format!(
                "consensus_demotion_threshold {} exceeds max_reputation {}",
                self.consensus_demotion_threshold, self.max_reputation
            ));
        }
        if self.default_agent_version.is_empty() || self.default_deployment_type.is_empty() {
            return invalid("default agent version and deployment type must be non-empty".to_string());
        }
        Ok(())
    }
}
