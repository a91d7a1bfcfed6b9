// REPUTATION ENGINE
// Bounded score updates from validators, with consensus demotion
//
// SAFETY INVARIANTS:
// 1. Scores stay within [0, max_reputation] for any delta
// 2. A demoted node loses its flag and its consensus list entry in the same invocation
// 3. Only validators move scores

use crate::access::{require_active, require_validator};
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::events::ContractEvent;
use crate::execution::Execution;
use crate::registry::NodeRegistry;
use crate::types::Node;
use log::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationChange {
    pub previous: u64,
    pub score: u64,
    pub demoted: bool,
}

pub struct ReputationEngine<'c> {
    config: &'c RegistryConfig,
    registry: NodeRegistry<'c>,
}

impl<'c> ReputationEngine<'c> {
    pub fn new(config: &'c RegistryConfig) -> Self {
        ReputationEngine {
            config,
            registry: NodeRegistry::new(config),
        }
    }

    /// `clamp(current + delta, 0, max_reputation)` without intermediate overflow.
    pub fn clamp_score(&self, current: u64, delta: i64) -> u64 {
        let raw = current as i128 + delta as i128;
        raw.clamp(0, self.config.max_reputation as i128) as u64
    }

    pub fn update_reputation(
        &self,
        exec: &mut Execution<'_>,
        address: &str,
        delta: i64,
    ) -> Result<ReputationChange, RegistryError> {
        require_active(exec)?;
        require_validator(exec)?;

        let mut node = exec.ledger().node(address)?;
        let previous = node.reputation_score;
        node.reputation_score = self.clamp_score(previous, delta);

        let demoted = self.apply_rules(exec, &mut node)?;

        exec.ledger_mut().save_node(&node)?;
        exec.emit(ContractEvent::ReputationUpdated {
            address: address.to_string(),
            delta,
            score: node.reputation_score,
            timestamp: exec.now(),
        });

        info!(
            "Reputation of {} moved {} -> {} by {}",
            address,
            previous,
            node.reputation_score,
            exec.caller()
        );
        Ok(ReputationChange {
            previous,
            score: node.reputation_score,
            demoted,
        })
    }

    fn apply_rules(&self, exec: &mut Execution<'_>, node: &mut Node) -> Result<bool, RegistryError> {
        let score = node.reputation_score;

        if score < self.config.consensus_demotion_threshold {
            let removed = self
                .registry
                .remove_from_consensus_list(exec, &node.node_address)?;
            if node.is_consensus_node || removed {
                node.is_consensus_node = false;
                info!(
                    "Demoted {} from consensus, score {} below {}",
                    node.node_address, score, self.config.consensus_demotion_threshold
                );
                return Ok(true);
            }
        } else if score > self.config.reputation_reward_threshold {
            // No bonus is defined for high scores yet.
            debug!("{} above reward threshold with {}", node.node_address, score);
        }

        Ok(false)
    }
}
