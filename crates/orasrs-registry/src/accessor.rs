// TYPED LEDGER ACCESSOR
// Typed reads and writes of registry records over a staged host ledger
//
// SAFETY INVARIANTS:
// 1. Every registry component reads and writes through this accessor only
// 2. Writes are staged; nothing reaches the host before commit()
// 3. A node record and its id→address index entry are always written together
// 4. A missing tier list reads as empty; it is never an error

use crate::error::RegistryError;
use crate::keys;
use crate::types::{ContractState, Node, Tier};
use log::debug;
use orasrs_state::{LedgerStore, StagedLedger};

const VALIDATOR_MARKER: &[u8] = b"1";

pub struct LedgerAccessor<'a> {
    ledger: StagedLedger<'a>,
}

fn utf8(what: &'static str, bytes: Vec<u8>) -> Result<String, RegistryError> {
    String::from_utf8(bytes).map_err(|e| RegistryError::CorruptRecord {
        what,
        detail: e.to_string(),
    })
}

impl<'a> LedgerAccessor<'a> {
    pub fn new(store: &'a mut dyn LedgerStore) -> Self {
        LedgerAccessor {
            ledger: StagedLedger::new(store),
        }
    }

    // --- node records -------------------------------------------------------

    pub fn load_node(&self, address: &str) -> Result<Option<Node>, RegistryError> {
        match self.ledger.get(&keys::node(address))? {
            None => Ok(None),
            Some(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| RegistryError::CorruptRecord {
                    what: "node",
                    detail: e.to_string(),
                }),
        }
    }

    pub fn node(&self, address: &str) -> Result<Node, RegistryError> {
        self.load_node(address)?
            .ok_or_else(|| RegistryError::NotFound(format!("node not found for address {}", address)))
    }

    /// Stage the node record together with its id→address index entry.
    pub fn save_node(&mut self, node: &Node) -> Result<(), RegistryError> {
        let encoded = serde_json::to_vec(node).map_err(|e| RegistryError::CorruptRecord {
            what: "node",
            detail: e.to_string(),
        })?;
        self.ledger.put(&keys::node(&node.node_address), &encoded);
        self.ledger
            .put(&keys::node_id_index(&node.node_id), node.node_address.as_bytes());
        Ok(())
    }

    pub fn node_address_by_id(&self, node_id: &str) -> Result<Option<String>, RegistryError> {
        match self.ledger.get(&keys::node_id_index(node_id))? {
            Some(raw) if !raw.is_empty() => Ok(Some(utf8("node id index", raw)?)),
            _ => Ok(None),
        }
    }

    // --- tier lists ---------------------------------------------------------

    pub fn tier_members(&self, tier: Tier) -> Result<Vec<String>, RegistryError> {
        match self.ledger.get(keys::tier_list(tier))? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_slice(&raw).map_err(|e| RegistryError::CorruptRecord {
                what: "tier list",
                detail: format!("{} list: {}", tier, e),
            }),
        }
    }

    pub fn save_tier_members(&mut self, tier: Tier, members: &[String]) -> Result<(), RegistryError> {
        let encoded = serde_json::to_vec(members).map_err(|e| RegistryError::CorruptRecord {
            what: "tier list",
            detail: e.to_string(),
        })?;
        self.ledger.put(keys::tier_list(tier), &encoded);
        Ok(())
    }

    // --- pending withdrawals ------------------------------------------------

    pub fn pending_withdrawal(&self, address: &str) -> Result<u64, RegistryError> {
        match self.ledger.get(&keys::pending_withdrawal(address))? {
            None => Ok(0),
            Some(raw) => utf8("pending withdrawal", raw)?
                .parse::<u64>()
                .map_err(|e| RegistryError::CorruptRecord {
                    what: "pending withdrawal",
                    detail: e.to_string(),
                }),
        }
    }

    pub fn save_pending_withdrawal(&mut self, address: &str, amount: u64) {
        self.ledger.put(
            &keys::pending_withdrawal(address),
            amount.to_string().as_bytes(),
        );
    }

    // --- role registers -----------------------------------------------------

    pub fn is_validator(&self, address: &str) -> Result<bool, RegistryError> {
        Ok(self
            .ledger
            .get(&keys::validator(address))?
            .map_or(false, |marker| marker == VALIDATOR_MARKER))
    }

    pub fn save_validator(&mut self, address: &str) {
        self.ledger.put(&keys::validator(address), VALIDATOR_MARKER);
    }

    pub fn owner(&self) -> Result<Option<String>, RegistryError> {
        self.singleton_string(keys::OWNER, "owner")
    }

    pub fn save_owner(&mut self, address: &str) {
        self.ledger.put(keys::OWNER.as_bytes(), address.as_bytes());
    }

    pub fn governance(&self) -> Result<Option<String>, RegistryError> {
        self.singleton_string(keys::GOVERNANCE, "governance")
    }

    pub fn save_governance(&mut self, address: &str) {
        self.ledger.put(keys::GOVERNANCE.as_bytes(), address.as_bytes());
    }

    fn singleton_string(&self, key: &str, what: &'static str) -> Result<Option<String>, RegistryError> {
        match self.ledger.get(key.as_bytes())? {
            Some(raw) if !raw.is_empty() => Ok(Some(utf8(what, raw)?)),
            _ => Ok(None),
        }
    }

    // --- contract state -----------------------------------------------------

    pub fn contract_state(&self) -> Result<Option<ContractState>, RegistryError> {
        let raw = match self.ledger.get(keys::CONTRACT_STATE.as_bytes())? {
            None => return Ok(None),
            Some(raw) => utf8("contract state", raw)?,
        };
        raw.parse::<u8>()
            .ok()
            .and_then(ContractState::from_code)
            .map(Some)
            .ok_or_else(|| RegistryError::CorruptRecord {
                what: "contract state",
                detail: format!("unknown state code {:?}", raw),
            })
    }

    pub fn save_contract_state(&mut self, state: ContractState) {
        self.ledger.put(
            keys::CONTRACT_STATE.as_bytes(),
            state.code().to_string().as_bytes(),
        );
    }

    // --- commit -------------------------------------------------------------

    pub fn is_dirty(&self) -> bool {
        self.ledger.is_dirty()
    }

    pub fn commit(self) -> Result<usize, RegistryError> {
        Ok(self.ledger.commit()?)
    }

    pub fn discard(self) {
        let dropped = self.ledger.discard();
        if dropped > 0 {
            debug!("Rolled back {} staged registry writes", dropped);
        }
    }
}
