// ============================================
// File: crates/display-registrar/src/models.rs
// ============================================
//! # Registry API Data Models
//!
//! Wire shapes for the registration endpoint. Field names are camelCase
//! on the wire to match the registry's API.

use serde::{Deserialize, Serialize};

use display_common::{Credential, DeviceIdentity};

/// Device identity report sent to the registry.
///
/// Constructed fresh from live system state on every attempt - the
/// identity is re-queried each time precisely so address changes are
/// captured.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// The device's shared secret, keying the registry record.
    pub api_key: String,
    /// Canonical hostname.
    pub hostname: String,
    /// Primary non-loopback IPv4 address, dotted-quad.
    pub ip: String,
}

impl RegisterRequest {
    /// Builds a report from a loaded credential and detected identity.
    #[must_use]
    pub fn new(credential: &Credential, identity: &DeviceIdentity) -> Self {
        Self {
            api_key: credential.as_str().to_string(),
            hostname: identity.hostname.clone(),
            ip: identity.ip.to_string(),
        }
    }
}

/// Registry response to a registration report.
///
/// Only `status` is contractually required; the registry may attach
/// additional fields which are ignored.
#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    /// `"new"` or `"updated"`.
    pub status: String,
}

/// How a single registration attempt concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The registry had no prior record for this credential.
    New,
    /// The registry refreshed an existing record.
    Updated,
    /// The registry refused the credential.
    Rejected {
        /// HTTP status the registry answered with (401 or 403).
        status: u16,
    },
    /// The network call itself failed (timeout, refused, DNS).
    Unreachable {
        /// Transport-level failure detail.
        reason: String,
    },
}

impl RegistrationOutcome {
    /// Returns `true` when the registry accepted the report.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::New | Self::Updated)
    }
}

impl std::fmt::Display for RegistrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "registered (new device)"),
            Self::Updated => write!(f, "registered (record updated)"),
            Self::Rejected { status } => write!(f, "rejected by registry (HTTP {status})"),
            Self::Unreachable { reason } => write!(f, "registry unreachable: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_request_serializes_camel_case() {
        let credential = Credential::new("abc123").unwrap();
        let identity = DeviceIdentity::new("kiosk-01", Ipv4Addr::new(10, 0, 0, 9)).unwrap();

        let json = serde_json::to_value(RegisterRequest::new(&credential, &identity)).unwrap();
        assert_eq!(json["apiKey"], "abc123");
        assert_eq!(json["hostname"], "kiosk-01");
        assert_eq!(json["ip"], "10.0.0.9");
    }

    #[test]
    fn test_response_ignores_extra_fields() {
        let resp: RegisterResponse =
            serde_json::from_str(r#"{"status":"updated","deviceCount":12}"#).unwrap();
        assert_eq!(resp.status, "updated");
    }

    #[test]
    fn test_outcome_success_classification() {
        assert!(RegistrationOutcome::New.is_success());
        assert!(RegistrationOutcome::Updated.is_success());
        assert!(!RegistrationOutcome::Rejected { status: 401 }.is_success());
        assert!(!RegistrationOutcome::Unreachable { reason: "refused".into() }.is_success());
    }
}
