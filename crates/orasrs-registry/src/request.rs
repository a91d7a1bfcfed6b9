// TYPED REQUESTS
// Parses the host's flat argument map into one validated Request per invocation
//
// SAFETY INVARIANTS:
// 1. Parsing never touches the ledger
// 2. An empty argument value is treated as absent
// 3. Every method name maps to exactly one Request variant

use crate::error::RegistryError;
use crate::registry::RegisterRequest;
use crate::threat::ThreatMethod;
use crate::types::Tier;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Flat string→bytes argument map supplied by the host.
pub type Args = BTreeMap<String, Vec<u8>>;

pub const METHOD_ARG: &str = "method";

/// One host invocation: who, when, and the raw arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub caller: String,
    pub tx_timestamp: i64,
    pub args: Args,
}

impl Invocation {
    pub fn new(caller: impl Into<String>, tx_timestamp: i64) -> Self {
        Invocation {
            caller: caller.into(),
            tx_timestamp,
            args: Args::new(),
        }
    }

    pub fn method(self, method: &str) -> Self {
        self.arg(METHOD_ARG, method)
    }

    pub fn arg(mut self, key: &str, value: impl AsRef<[u8]>) -> Self {
        self.args.insert(key.to_string(), value.as_ref().to_vec());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    RegisterNode(RegisterRequest),
    GetNodeInfo { node_address: String },
    GetContractStats,
    UpdateReputation { node_address: String, delta: i64 },
    AddValidator { validator_address: String },
    PauseContract,
    ResumeContract,
    SlashNode { node_address: String, reason: String },
    Stake { amount: u64 },
    RequestWithdrawal { amount: u64 },
    GetPendingWithdrawal { node_address: String },
    SubmitChallenge { cache_key: String, reason: String },
    Threat(ThreatMethod),
}

impl Request {
    pub fn parse(args: &Args) -> Result<Self, RegistryError> {
        let method = match args.get(METHOD_ARG) {
            Some(raw) if !raw.is_empty() => std::str::from_utf8(raw)
                .map_err(|_| RegistryError::InvalidMethod("method name is not valid UTF-8".to_string()))?,
            _ => return Err(RegistryError::InvalidMethod("method is required".to_string())),
        };

        let request = match method {
            "registerNode" => {
                let tier = match optional_str(args, "node_type")? {
                    None => Tier::Edge,
                    Some(code) => Tier::from_node_type(parse_number(&code, "node_type")?),
                };
                Request::RegisterNode(RegisterRequest {
                    node_id: optional_str(args, "node_id")?,
                    tier,
                    agent_version: optional_str(args, "agent_version")?,
                    deployment_type: optional_str(args, "deployment_type")?,
                })
            }
            "getNodeInfo" => Request::GetNodeInfo {
                node_address: required_str(args, "node_address")?,
            },
            "getContractStats" => Request::GetContractStats,
            "updateReputation" => Request::UpdateReputation {
                node_address: required_str(args, "node_address")?,
                delta: parse_number(&required_str(args, "reputation_delta")?, "reputation_delta")?,
            },
            "addValidator" => Request::AddValidator {
                validator_address: required_str(args, "validator_address")?,
            },
            "pauseContract" => Request::PauseContract,
            "resumeContract" => Request::ResumeContract,
            "slashNode" => Request::SlashNode {
                node_address: required_str(args, "node_address")?,
                reason: required_str(args, "reason")?,
            },
            "stake" => Request::Stake {
                amount: required_amount(args)?,
            },
            "requestWithdrawal" => Request::RequestWithdrawal {
                amount: required_amount(args)?,
            },
            "getPendingWithdrawal" => Request::GetPendingWithdrawal {
                node_address: required_str(args, "node_address")?,
            },
            "submitChallenge" => Request::SubmitChallenge {
                cache_key: required_str(args, "cache_key")?,
                reason: required_str(args, "reason")?,
            },
            other => match ThreatMethod::from_method_name(other) {
                Some(threat) => Request::Threat(threat),
                None => return Err(RegistryError::InvalidMethod(format!("unknown method: {}", other))),
            },
        };

        Ok(request)
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            Request::RegisterNode(_) => "registerNode",
            Request::GetNodeInfo { .. } => "getNodeInfo",
            Request::GetContractStats => "getContractStats",
            Request::UpdateReputation { .. } => "updateReputation",
            Request::AddValidator { .. } => "addValidator",
            Request::PauseContract => "pauseContract",
            Request::ResumeContract => "resumeContract",
            Request::SlashNode { .. } => "slashNode",
            Request::Stake { .. } => "stake",
            Request::RequestWithdrawal { .. } => "requestWithdrawal",
            Request::GetPendingWithdrawal { .. } => "getPendingWithdrawal",
            Request::SubmitChallenge { .. } => "submitChallenge",
            Request::Threat(method) => method.method_name(),
        }
    }

    /// Reads never stage writes, so they skip the commit.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Request::GetNodeInfo { .. } | Request::GetContractStats | Request::GetPendingWithdrawal { .. }
        )
    }
}

/// Optional UTF-8 argument; empty counts as absent.
pub fn optional_str(args: &Args, name: &str) -> Result<Option<String>, RegistryError> {
    match args.get(name) {
        Some(raw) if !raw.is_empty() => String::from_utf8(raw.clone())
            .map(Some)
            .map_err(|_| RegistryError::InvalidArgument(format!("{} is not valid UTF-8", name))),
        _ => Ok(None),
    }
}

pub fn required_str(args: &Args, name: &str) -> Result<String, RegistryError> {
    optional_str(args, name)?.ok_or_else(|| RegistryError::InvalidArgument(format!("{} is required", name)))
}

fn parse_number<T>(raw: &str, name: &str) -> Result<T, RegistryError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>()
        .map_err(|e| RegistryError::InvalidArgument(format!("invalid {} {:?}: {}", name, raw, e)))
}

fn required_amount(args: &Args) -> Result<u64, RegistryError> {
    let amount: u64 = parse_number(&required_str(args, "amount")?, "amount")?;
    if amount == 0 {
        return Err(RegistryError::InvalidArgument(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn args(pairs: &[(&str, &str)]) -> Args {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_missing_or_unknown_method() {
        let err = Request::parse(&Args::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMethod);

        let err = Request::parse(&args(&[("method", "")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMethod);

        let err = Request::parse(&args(&[("method", "mintTokens")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid method: unknown method: mintTokens");
    }

    #[test]
    fn test_register_defaults_to_edge() {
        let request = Request::parse(&args(&[("method", "registerNode")])).unwrap();
        assert_eq!(request, Request::RegisterNode(RegisterRequest::new(Tier::Edge)));

        let request = Request::parse(&args(&[
            ("method", "registerNode"),
            ("node_type", "0"),
            ("node_id", "root-1"),
            ("agent_version", ""),
        ]))
        .unwrap();
        assert_eq!(
            request,
            Request::RegisterNode(RegisterRequest::new(Tier::Consensus).with_node_id("root-1"))
        );
    }

    #[test]
    fn test_bad_numbers_are_invalid_arguments() {
        for bad in [
            args(&[("method", "registerNode"), ("node_type", "x")]),
            args(&[("method", "registerNode"), ("node_type", "-1")]),
            args(&[("method", "updateReputation"), ("node_address", "a"), ("reputation_delta", "ten")]),
            args(&[("method", "requestWithdrawal"), ("amount", "0")]),
            args(&[("method", "stake"), ("amount", "-5")]),
            args(&[("method", "stake"), ("amount", " 5 ")]),
            args(&[("method", "registerNode"), ("node_type", "1 ")]),
            args(&[("method", "updateReputation"), ("node_address", "a"), ("reputation_delta", " -3")]),
            args(&[("method", "stake")]),
        ] {
            assert_eq!(Request::parse(&bad).unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_signed_delta() {
        let request = Request::parse(&args(&[
            ("method", "updateReputation"),
            ("node_address", "sensor-1"),
            ("reputation_delta", "-40"),
        ]))
        .unwrap();
        assert_eq!(
            request,
            Request::UpdateReputation {
                node_address: "sensor-1".to_string(),
                delta: -40
            }
        );
    }

    #[test]
    fn test_threat_methods_route_to_seam() {
        let request = Request::parse(&args(&[("method", "getGlobalThreatList")])).unwrap();
        assert_eq!(request, Request::Threat(ThreatMethod::GetGlobalThreatList));
        assert_eq!(request.method_name(), "getGlobalThreatList");
    }

    #[test]
    fn test_invocation_builder() {
        let invocation = Invocation::new("caller-0001", 9)
            .method("stake")
            .arg("amount", "10");
        assert_eq!(
            Request::parse(&invocation.args).unwrap(),
            Request::Stake { amount: 10 }
        );
    }
}
