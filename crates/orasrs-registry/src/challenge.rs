use crate::access::require_active;
use crate::error::{RegistryError, StateViolation};
use crate::events::ContractEvent;
use crate::execution::Execution;
use log::info;

/// `challenge_<cache_key>_<timestamp>`
pub fn challenge_id(cache_key: &str, now: i64) -> String {
    format!("challenge_{}_{}", cache_key, now)
}

/// Record a dispute against a cached threat verdict.
///
/// Only Active nodes may challenge. The challenge is announced through
/// `NodeChallenged`; resolution happens elsewhere, so no counters move here.
pub fn submit_challenge(
    exec: &mut Execution<'_>,
    cache_key: &str,
    reason: &str,
) -> Result<String, RegistryError> {
    require_active(exec)?;

    let challenger = exec.caller().to_string();
    let node = exec.ledger().node(&challenger)?;
    if !node.is_active() {
        return Err(StateViolation::InactiveNode(challenger).into());
    }

    let id = challenge_id(cache_key, exec.now());
    exec.emit(ContractEvent::NodeChallenged {
        challenge_id: id.clone(),
        cache_key: cache_key.to_string(),
        challenger: challenger.clone(),
        reason: reason.to_string(),
        timestamp: exec.now(),
    });

    info!("{} challenged {} ({})", challenger, cache_key, reason);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{ContractState, Node, NodeStatus};
    use crate::config::RegistryConfig;
    use orasrs_state::MemoryLedger;

    fn seed(store: &mut MemoryLedger, status: NodeStatus) {
        let mut exec = Execution::begin(store, "sensor-aaaa0001", 0);
        exec.ledger_mut().save_contract_state(ContractState::Active);
        let mut node = Node::new(
            "sensor-aaaa0001".to_string(),
            "n-1".to_string(),
            "2.0.0".to_string(),
            "edge".to_string(),
            0,
            &RegistryConfig::default(),
        );
        node.status = status;
        exec.ledger_mut().save_node(&node).unwrap();
        exec.commit().unwrap();
    }

    #[test]
    fn test_active_node_challenges() {
        let mut store = MemoryLedger::new();
        seed(&mut store, NodeStatus::Active);

        let mut exec = Execution::begin(&mut store, "sensor-aaaa0001", 77);
        let id = submit_challenge(&mut exec, "ip:10.0.0.1", "false positive").unwrap();
        assert_eq!(id, "challenge_ip:10.0.0.1_77");
        assert_eq!(exec.pending_events().len(), 1);

        let node = exec.ledger().node("sensor-aaaa0001").unwrap();
        assert_eq!(node.challenge_count, 0);
    }

    #[test]
    fn test_slashed_node_cannot_challenge() {
        let mut store = MemoryLedger::new();
        seed(&mut store, NodeStatus::Slashed);

        let mut exec = Execution::begin(&mut store, "sensor-aaaa0001", 77);
        let err = submit_challenge(&mut exec, "ip:10.0.0.1", "x").unwrap_err();
        assert_eq!(
            err.state_violation(),
            Some(&StateViolation::InactiveNode("sensor-aaaa0001".to_string()))
        );
    }

    #[test]
    fn test_unknown_challenger() {
        let mut store = MemoryLedger::new();
        seed(&mut store, NodeStatus::Active);

        let mut exec = Execution::begin(&mut store, "stranger-00001", 77);
        let err = submit_challenge(&mut exec, "ip:10.0.0.1", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
