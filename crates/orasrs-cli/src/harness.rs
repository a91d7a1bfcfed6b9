// LOCAL HARNESS
// Plays the host: snapshot-file ledger, tracing event sink, response rendering
//
// SAFETY INVARIANTS:
// 1. The snapshot file is rewritten only after a successful invocation
// 2. A missing snapshot file reads as an empty ledger

use anyhow::{Context, Result};
use orasrs_registry::{ContractEvent, EventSink, Response};
use orasrs_state::MemoryLedger;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Forwards contract events to tracing.
#[derive(Debug, Default)]
pub struct TracingSink {
    emitted: usize,
}

impl TracingSink {
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

impl EventSink for TracingSink {
    fn emit(&mut self, event: &ContractEvent) {
        self.emitted += 1;
        info!(topic = event.topic(), data = ?event.data(), "contract event");
    }
}

pub fn load_ledger(path: &Path) -> Result<MemoryLedger> {
    if !path.exists() {
        info!("No ledger at {}, starting empty", path.display());
        return Ok(MemoryLedger::new());
    }
    MemoryLedger::load_json(path).with_context(|| format!("failed to load ledger {}", path.display()))
}

pub fn save_ledger(ledger: &MemoryLedger, path: &Path) -> Result<()> {
    ledger
        .save_json(path)
        .with_context(|| format!("failed to save ledger {}", path.display()))
}

/// Printable form of the host's `(success, payload, error)` triple.
#[derive(Debug, Serialize)]
pub struct ResponseView {
    pub success: bool,
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        ResponseView {
            success: response.success,
            payload: response.payload.as_deref().map(render_payload),
            error: response.error.as_ref().map(ToString::to_string),
            error_kind: response.error_kind().map(|kind| format!("{:?}", kind)),
        }
    }
}

/// JSON payloads are embedded as JSON, anything else as a string.
fn render_payload(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orasrs_registry::{RegistryError, StateViolation};
    use orasrs_state::LedgerStore;

    #[test]
    fn test_payload_rendering() {
        assert_eq!(render_payload(br#"{"a":1}"#), serde_json::json!({"a": 1}));
        assert_eq!(render_payload(b"500"), Value::String("500".to_string()));
        assert_eq!(
            render_payload(b"Node registered successfully"),
            Value::String("Node registered successfully".to_string())
        );
    }

    #[test]
    fn test_failure_view() {
        let response = Response::failure(RegistryError::from(StateViolation::NotInitialized));
        let view = ResponseView::from(&response);
        assert!(!view.success);
        assert_eq!(view.error_kind.as_deref(), Some("InvalidState"));
        assert!(view.payload.is_none());
    }

    #[test]
    fn test_ledger_file_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut ledger = load_ledger(&path).unwrap();
        assert!(ledger.is_empty());
        ledger.put(b"CONTRACT_STATE_", b"0").unwrap();
        save_ledger(&ledger, &path).unwrap();

        assert_eq!(load_ledger(&path).unwrap(), ledger);
    }
}
