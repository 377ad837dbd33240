// ============================================
// File: crates/display-registrar/src/error.rs
// ============================================
//! # Registrar Error Types

use thiserror::Error;

use display_common::CommonError;

/// Result type for registrar operations.
pub type Result<T> = std::result::Result<T, RegistrarError>;

/// Registration client error types.
///
/// Outcomes the registry can legitimately return (`rejected`,
/// `unreachable`) are *not* errors - they are
/// [`RegistrationOutcome`](crate::RegistrationOutcome) variants. Errors
/// cover local misconfiguration and protocol violations only.
#[derive(Error, Debug)]
pub enum RegistrarError {
    /// Credential or identity resolution failed before any network call.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// The registry answered 2xx with a body we could not interpret.
    #[error("Registry response is invalid: {reason}")]
    InvalidResponse {
        /// Why the body failed to parse or classify.
        reason: String,
    },

    /// The registry answered with a non-2xx status that is not an
    /// authentication rejection (e.g. a registry-side 500).
    #[error("Registry returned unexpected status {status}")]
    UnexpectedStatus {
        /// HTTP status code received.
        status: u16,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {reason}")]
    ClientBuild {
        /// Builder error detail.
        reason: String,
    },
}

impl RegistrarError {
    /// Creates an `InvalidResponse` error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Returns `true` when the failure is a local configuration problem
    /// rather than anything to do with the registry.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Common(e) if e.is_configuration_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_passthrough() {
        let err: RegistrarError = CommonError::credential_not_found("/etc/key").into();
        assert!(err.is_configuration_error());

        let err = RegistrarError::UnexpectedStatus { status: 500 };
        assert!(!err.is_configuration_error());
    }
}
