/// Informational contract events.
///
/// SAFETY: Events are buffered per invocation and delivered only after the
/// invocation's writes have been committed. A failed invocation emits nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    NodeRegistered {
        node_id: String,
        address: String,
        timestamp: i64,
    },
    NodeUpdated {
        node_id: String,
        address: String,
        timestamp: i64,
    },
    ReputationUpdated {
        address: String,
        delta: i64,
        score: u64,
        timestamp: i64,
    },
    NodeSlashed {
        address: String,
        penalty: u64,
        reason: String,
        timestamp: i64,
    },
    StakeDeposited {
        address: String,
        amount: u64,
        total: u64,
        timestamp: i64,
    },
    WithdrawalRequested {
        address: String,
        amount: u64,
        timestamp: i64,
    },
    ValidatorAdded {
        validator: String,
        timestamp: i64,
    },
    ContractPaused {
        timestamp: i64,
    },
    ContractResumed {
        timestamp: i64,
    },
    NodeChallenged {
        challenge_id: String,
        cache_key: String,
        challenger: String,
        reason: String,
        timestamp: i64,
    },
}

impl ContractEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            ContractEvent::NodeRegistered { .. } => "NodeRegistered",
            ContractEvent::NodeUpdated { .. } => "NodeUpdated",
            ContractEvent::ReputationUpdated { .. } => "ReputationUpdated",
            ContractEvent::NodeSlashed { .. } => "NodeSlashed",
            ContractEvent::StakeDeposited { .. } => "StakeDeposited",
            ContractEvent::WithdrawalRequested { .. } => "WithdrawalRequested",
            ContractEvent::ValidatorAdded { .. } => "ValidatorAdded",
            ContractEvent::ContractPaused { .. } => "ContractPaused",
            ContractEvent::ContractResumed { .. } => "ContractResumed",
            ContractEvent::NodeChallenged { .. } => "NodeChallenged",
        }
    }

    /// Positional string fields as handed to the host's event primitive.
    pub fn data(&self) -> Vec<String> {
        match self {
            ContractEvent::NodeRegistered { node_id, address, timestamp } => {
                vec![node_id.clone(), address.clone(), timestamp.to_string()]
            }
            ContractEvent::NodeUpdated { node_id, address, timestamp } => vec![
                node_id.clone(),
                address.clone(),
                "updated".to_string(),
                timestamp.to_string(),
            ],
            ContractEvent::ReputationUpdated { address, delta, score, timestamp } => vec![
                address.clone(),
                delta.to_string(),
                score.to_string(),
                timestamp.to_string(),
            ],
            ContractEvent::NodeSlashed { address, penalty, reason, timestamp } => vec![
                address.clone(),
                penalty.to_string(),
                reason.clone(),
                timestamp.to_string(),
            ],
            ContractEvent::StakeDeposited { address, amount, total, timestamp } => vec![
                address.clone(),
                amount.to_string(),
                total.to_string(),
                timestamp.to_string(),
            ],
            ContractEvent::WithdrawalRequested { address, amount, timestamp } => {
                vec![address.clone(), amount.to_string(), timestamp.to_string()]
            }
            ContractEvent::ValidatorAdded { validator, timestamp } => {
                vec![validator.clone(), timestamp.to_string()]
            }
            ContractEvent::ContractPaused { timestamp } | ContractEvent::ContractResumed { timestamp } => {
                vec![timestamp.to_string()]
            }
            ContractEvent::NodeChallenged {
                challenge_id,
                cache_key,
                challenger,
                reason,
                timestamp,
            } => vec![
                challenge_id.clone(),
                cache_key.clone(),
                challenger.clone(),
                reason.clone(),
                timestamp.to_string(),
            ],
        }
    }
}

/// Host event primitive.
pub trait EventSink {
    fn emit(&mut self, event: &ContractEvent);
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<ContractEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn topics(&self) -> Vec<&'static str> {
        self.events.iter().map(ContractEvent::topic).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &ContractEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_data_ends_with_timestamp() {
        let events = vec![
            ContractEvent::NodeRegistered {
                node_id: "n".to_string(),
                address: "a".to_string(),
                timestamp: 42,
            },
            ContractEvent::ContractPaused { timestamp: 42 },
            ContractEvent::NodeSlashed {
                address: "a".to_string(),
                penalty: 7,
                reason: "malicious".to_string(),
                timestamp: 42,
            },
        ];

        for event in &events {
            assert_eq!(event.data().last().map(String::as_str), Some("42"));
        }
    }

    #[test]
    fn test_event_log_collects_topics() {
        let mut log = EventLog::new();
        log.emit(&ContractEvent::ContractPaused { timestamp: 1 });
        log.emit(&ContractEvent::ContractResumed { timestamp: 2 });
        assert_eq!(log.topics(), vec!["ContractPaused", "ContractResumed"]);
    }
}
