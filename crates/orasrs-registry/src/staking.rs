// STAKING & SLASHING ENGINE
// Stake bookkeeping, lock period, penalties and pending withdrawals
//
// SAFETY INVARIANTS:
// 1. Stake never underflows: withdrawals and penalties are bounded by the current balance
// 2. Penalty = stake * rate / 100, computed in 128 bits from the pre-slash balance
// 3. A slashed node never withdraws or stakes again
// 4. Pending withdrawals only grow
// 5. Withdrawal is allowed at exactly stake_start + lock period, never before

use crate::access::{require_active, require_governance};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, StateViolation};
use crate::events::ContractEvent;
use crate::execution::Execution;
use crate::registry::NodeRegistry;
use crate::types::{Node, NodeStatus};
use log::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    pub amount: u64,
    pub remaining_stake: u64,
    pub pending_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashOutcome {
    pub penalty: u64,
    pub remaining_stake: u64,
    pub removed_from_consensus: bool,
}

pub struct StakingEngine<'c> {
    config: &'c RegistryConfig,
    registry: NodeRegistry<'c>,
}

impl<'c> StakingEngine<'c> {
    pub fn new(config: &'c RegistryConfig) -> Self {
        StakingEngine {
            config,
            registry: NodeRegistry::new(config),
        }
    }

    /// Portion of `stake` forfeited on slash.
    pub fn penalty_for(&self, stake: u64) -> u64 {
        let penalty = stake as u128 * self.config.slash_penalty_rate as u128 / 100;
        // rate <= 100 keeps this within the balance
        penalty.min(stake as u128) as u64
    }

    /// Earliest timestamp at which the node may withdraw.
    pub fn unlocks_at(&self, node: &Node) -> i64 {
        node.stake_start.saturating_add(self.config.stake_lock_period_secs)
    }

    /// Deposit `amount` into the caller's stake. Re-anchors the lock period.
    pub fn stake(&self, exec: &mut Execution<'_>, amount: u64) -> Result<u64, RegistryError> {
        require_active(exec)?;
        if amount == 0 {
            return Err(RegistryError::InvalidArgument(
                "stake amount must be greater than zero".to_string(),
            ));
        }

        let caller = exec.caller().to_string();
        let mut node = exec.ledger().node(&caller)?;
        if node.is_slashed() {
            return Err(StateViolation::NodeSlashed(caller).into());
        }

        node.stake_amount = node
            .stake_amount
            .checked_add(amount)
            .ok_or_else(|| StateViolation::Overflow {
                what: "stake",
                address: caller.clone(),
            })?;
        node.stake_start = exec.now();
        node.last_seen = exec.now();

        exec.ledger_mut().save_node(&node)?;
        exec.emit(ContractEvent::StakeDeposited {
            address: caller.clone(),
            amount,
            total: node.stake_amount,
            timestamp: exec.now(),
        });

        info!("Staked {} for {}, total {}", amount, caller, node.stake_amount);
        Ok(node.stake_amount)
    }

    /// Move `amount` of the caller's unlocked stake into pending withdrawal.
    pub fn request_withdrawal(
        &self,
        exec: &mut Execution<'_>,
        amount: u64,
    ) -> Result<WithdrawalReceipt, RegistryError> {
        require_active(exec)?;
        if amount == 0 {
            return Err(RegistryError::InvalidArgument(
                "withdrawal amount must be greater than zero".to_string(),
            ));
        }

        let caller = exec.caller().to_string();
        let now = exec.now();
        let mut node = exec.ledger().node(&caller)?;

        if node.is_slashed() {
            return Err(StateViolation::NodeSlashed(caller).into());
        }

        let unlocks_at = self.unlocks_at(&node);
        if now < unlocks_at {
            return Err(StateViolation::LockPeriodActive {
                address: caller,
                unlocks_at,
                now,
            }
            .into());
        }

        if node.stake_amount < amount {
            return Err(StateViolation::InsufficientStake {
                address: caller,
                available: node.stake_amount,
                requested: amount,
            }
            .into());
        }

        let pending_total = exec
            .ledger()
            .pending_withdrawal(&caller)?
            .checked_add(amount)
            .ok_or_else(|| StateViolation::Overflow {
                what: "pending withdrawal",
                address: caller.clone(),
            })?;

        node.stake_amount -= amount;
        node.last_seen = now;

        exec.ledger_mut().save_node(&node)?;
        exec.ledger_mut().save_pending_withdrawal(&caller, pending_total);
        exec.emit(ContractEvent::WithdrawalRequested {
            address: caller.clone(),
            amount,
            timestamp: now,
        });

        info!(
            "Withdrawal of {} requested by {}, pending {}",
            amount, caller, pending_total
        );
        Ok(WithdrawalReceipt {
            amount,
            remaining_stake: node.stake_amount,
            pending_total,
        })
    }

    pub fn pending_withdrawal(&self, exec: &Execution<'_>, address: &str) -> Result<u64, RegistryError> {
        let pending = exec.ledger().pending_withdrawal(address)?;
        debug!("Pending withdrawal for {}: {}", address, pending);
        Ok(pending)
    }

    /// Governance penalty. Marks the node Slashed and drops it from consensus.
    pub fn slash(
        &self,
        exec: &mut Execution<'_>,
        address: &str,
        reason: &str,
    ) -> Result<SlashOutcome, RegistryError> {
        require_governance(exec)?;
        if reason.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "slash reason is required".to_string(),
            ));
        }

        let mut node = exec.ledger().node(address)?;
        let penalty = self.penalty_for(node.stake_amount);
        node.stake_amount -= penalty;
        node.status = NodeStatus::Slashed;

        let removed_from_consensus = self.registry.remove_from_consensus_list(exec, address)?;
        if node.is_consensus_node && !removed_from_consensus {
            warn!("{} was flagged consensus but not listed", address);
        }
        node.is_consensus_node = false;

        exec.ledger_mut().save_node(&node)?;
        exec.emit(ContractEvent::NodeSlashed {
            address: address.to_string(),
            penalty,
            reason: reason.to_string(),
            timestamp: exec.now(),
        });

        info!(
            "Slashed {} by {} ({}), remaining stake {}",
            address, penalty, reason, node.stake_amount
        );
        Ok(SlashOutcome {
            penalty,
            remaining_stake: node.stake_amount,
            removed_from_consensus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::registry::RegisterRequest;
    use crate::types::{ContractState, Tier};
    use orasrs_state::MemoryLedger;

    const SENSOR: &str = "sensor-aaaa0001";
    const COUNCIL: &str = "council-000001";

    fn ledger_with_node(tier: Tier, stake: u64) -> MemoryLedger {
        let config = RegistryConfig::default();
        let mut store = MemoryLedger::new();

        let mut exec = Execution::begin(&mut store, SENSOR, 1_000);
        exec.ledger_mut().save_contract_state(ContractState::Active);
        exec.ledger_mut().save_governance(COUNCIL);
        NodeRegistry::new(&config)
            .register(&mut exec, RegisterRequest::new(tier).with_node_id("n-1"))
            .unwrap();
        let mut node = exec.ledger().node(SENSOR).unwrap();
        node.stake_amount = stake;
        exec.ledger_mut().save_node(&node).unwrap();
        exec.commit().unwrap();
        store
    }

    #[test]
    fn test_penalty_rates() {
        let config = RegistryConfig::default();
        assert_eq!(StakingEngine::new(&config).penalty_for(u64::MAX), u64::MAX);

        let config = RegistryConfig {
            slash_penalty_rate: 50,
            ..RegistryConfig::default()
        };
        let engine = StakingEngine::new(&config);
        assert_eq!(engine.penalty_for(1001), 500);
        assert_eq!(engine.penalty_for(u64::MAX), u64::MAX / 2);
    }

    #[test]
    fn test_withdrawal_checks_lock_then_funds() {
        let config = RegistryConfig::default();
        let engine = StakingEngine::new(&config);
        let mut store = ledger_with_node(Tier::Edge, 500);
        let unlock = 1_000 + config.stake_lock_period_secs;

        let mut exec = Execution::begin(&mut store, SENSOR, unlock - 1);
        let err = engine.request_withdrawal(&mut exec, 100).unwrap_err();
        assert!(matches!(
            err.state_violation(),
            Some(StateViolation::LockPeriodActive { .. })
        ));
        exec.abort();

        let mut exec = Execution::begin(&mut store, SENSOR, unlock);
        let err = engine.request_withdrawal(&mut exec, 501).unwrap_err();
        assert_eq!(
            err.state_violation(),
            Some(&StateViolation::InsufficientStake {
                address: SENSOR.to_string(),
                available: 500,
                requested: 501,
            })
        );

        let receipt = engine.request_withdrawal(&mut exec, 200).unwrap();
        assert_eq!(receipt.remaining_stake, 300);
        assert_eq!(receipt.pending_total, 200);
        let receipt = engine.request_withdrawal(&mut exec, 300).unwrap();
        assert_eq!(receipt.remaining_stake, 0);
        assert_eq!(receipt.pending_total, 500);
        assert_eq!(engine.pending_withdrawal(&exec, SENSOR).unwrap(), 500);
    }

    #[test]
    fn test_zero_amounts_are_rejected() {
        let config = RegistryConfig::default();
        let engine = StakingEngine::new(&config);
        let mut store = ledger_with_node(Tier::Edge, 500);

        let mut exec = Execution::begin(&mut store, SENSOR, i64::MAX);
        assert_eq!(
            engine.request_withdrawal(&mut exec, 0).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(engine.stake(&mut exec, 0).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_stake_reanchors_lock() {
        let config = RegistryConfig::default();
        let engine = StakingEngine::new(&config);
        let mut store = ledger_with_node(Tier::Edge, 0);

        let mut exec = Execution::begin(&mut store, SENSOR, 5_000);
        assert_eq!(engine.stake(&mut exec, 700).unwrap(), 700);
        let node = exec.ledger().node(SENSOR).unwrap();
        assert_eq!(node.stake_start, 5_000);
        assert_eq!(engine.unlocks_at(&node), 5_000 + config.stake_lock_period_secs);
        assert_eq!(exec.pending_events()[0].topic(), "StakeDeposited");
    }

    #[test]
    fn test_slash_consensus_member() {
        let config = RegistryConfig::default();
        let engine = StakingEngine::new(&config);
        let mut store = ledger_with_node(Tier::Consensus, 10_000);

        let mut exec = Execution::begin(&mut store, COUNCIL, 2_000);
        let outcome = engine.slash(&mut exec, SENSOR, "malicious").unwrap();
        assert_eq!(
            outcome,
            SlashOutcome {
                penalty: 10_000,
                remaining_stake: 0,
                removed_from_consensus: true,
            }
        );

        let node = exec.ledger().node(SENSOR).unwrap();
        assert!(node.is_slashed());
        assert!(!node.is_consensus_node);
        assert!(exec.ledger().tier_members(Tier::Consensus).unwrap().is_empty());
    }

    #[test]
    fn test_slashed_node_cannot_move_stake() {
        let config = RegistryConfig::default();
        let engine = StakingEngine::new(&config);
        let mut store = ledger_with_node(Tier::Edge, 100);

        let mut exec = Execution::begin(&mut store, COUNCIL, 2_000);
        engine.slash(&mut exec, SENSOR, "malicious").unwrap();
        exec.commit().unwrap();

        let mut exec = Execution::begin(&mut store, SENSOR, i64::MAX);
        let slashed = StateViolation::NodeSlashed(SENSOR.to_string());
        assert_eq!(
            engine.request_withdrawal(&mut exec, 1).unwrap_err().state_violation(),
            Some(&slashed)
        );
        assert_eq!(engine.stake(&mut exec, 1).unwrap_err().state_violation(), Some(&slashed));
    }

    #[test]
    fn test_slash_requires_governance_and_reason() {
        let config = RegistryConfig::default();
        let engine = StakingEngine::new(&config);
        let mut store = ledger_with_node(Tier::Edge, 100);

        let mut exec = Execution::begin(&mut store, SENSOR, 2_000);
        assert_eq!(
            engine.slash(&mut exec, SENSOR, "self").unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        exec.abort();

        let mut exec = Execution::begin(&mut store, COUNCIL, 2_000);
        assert_eq!(
            engine.slash(&mut exec, SENSOR, "").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            engine.slash(&mut exec, "nobody-00000", "x").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
