use crate::error::RegistryError;
use crate::execution::Execution;
use crate::request::Args;
use std::fmt;

/// Methods owned by the threat attestation subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatMethod {
    SubmitThreatReport,
    VerifyThreatReport,
    GetThreatReport,
    GetGlobalThreatList,
}

impl ThreatMethod {
    pub const ALL: [ThreatMethod; 4] = [
        ThreatMethod::SubmitThreatReport,
        ThreatMethod::VerifyThreatReport,
        ThreatMethod::GetThreatReport,
        ThreatMethod::GetGlobalThreatList,
    ];

    pub fn method_name(self) -> &'static str {
        match self {
            ThreatMethod::SubmitThreatReport => "submitThreatReport",
            ThreatMethod::VerifyThreatReport => "verifyThreatReport",
            ThreatMethod::GetThreatReport => "getThreatReport",
            ThreatMethod::GetGlobalThreatList => "getGlobalThreatList",
        }
    }

    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.method_name() == name)
    }
}

impl fmt::Display for ThreatMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Pluggable handler for threat report methods.
///
/// SAFETY: The handler runs inside the caller's staged execution. Anything it
/// writes through `exec` commits or rolls back with the invocation.
pub trait ThreatAttestations: Send + Sync {
    fn handle(
        &self,
        method: ThreatMethod,
        exec: &mut Execution<'_>,
        args: &Args,
    ) -> Result<Vec<u8>, RegistryError>;
}

/// Installed when no attestation subsystem is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoThreatAttestations;

impl ThreatAttestations for NoThreatAttestations {
    fn handle(
        &self,
        method: ThreatMethod,
        _exec: &mut Execution<'_>,
        _args: &Args,
    ) -> Result<Vec<u8>, RegistryError> {
        Err(RegistryError::Unsupported(format!(
            "{} requires a threat attestation handler",
            method
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names_round_trip() {
        for method in ThreatMethod::ALL {
            assert_eq!(ThreatMethod::from_method_name(method.method_name()), Some(method));
        }
        assert_eq!(ThreatMethod::from_method_name("registerNode"), None);
    }
}
