// ============================================
// File: crates/display-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Foundational error types shared by the registration client and the
//! command agent, enabling consistent error handling on both sides of
//! the device.
//!
//! ## Design Philosophy
//! - Use `thiserror` for ergonomic error definitions
//! - Each crate defines its own error type that wraps `CommonError`
//! - Errors carry paths and reasons, never the credential value itself
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never include the credential in error messages
//! - A missing credential is a *configuration* error, not an
//!   authentication error - callers rely on that distinction

use thiserror::Error;

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

/// Common error types shared across display appliance crates.
#[derive(Error, Debug)]
pub enum CommonError {
    /// No credential file exists at the configured path (or the legacy
    /// fallback location).
    #[error("Credential not found at '{path}'")]
    CredentialNotFound {
        /// Path that was checked.
        path: String,
    },

    /// A credential file exists but could not be read.
    #[error("Credential at '{path}' is unreadable: {source}")]
    CredentialUnreadable {
        /// Path that failed to read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A credential file exists but its contents are not a usable token.
    #[error("Credential is invalid: {reason}")]
    CredentialInvalid {
        /// What is wrong with the stored value (never the value itself).
        reason: String,
    },

    /// The device has no non-loopback IPv4 address to report.
    #[error("No usable non-loopback IPv4 address: {reason}")]
    NoUsableAddress {
        /// Why address discovery failed.
        reason: String,
    },

    /// The device hostname could not be determined.
    #[error("Hostname lookup failed: {reason}")]
    HostnameUnavailable {
        /// Why hostname lookup failed.
        reason: String,
    },

    /// System I/O error occurred.
    #[error("I/O error: {context}")]
    Io {
        /// What operation was being performed.
        context: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CommonError {
    /// Creates a `CredentialNotFound` error.
    pub fn credential_not_found(path: impl Into<String>) -> Self {
        Self::CredentialNotFound { path: path.into() }
    }

    /// Creates a `CredentialInvalid` error.
    pub fn credential_invalid(reason: impl Into<String>) -> Self {
        Self::CredentialInvalid {
            reason: reason.into(),
        }
    }

    /// Creates a `NoUsableAddress` error.
    pub fn no_usable_address(reason: impl Into<String>) -> Self {
        Self::NoUsableAddress {
            reason: reason.into(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` when the error means the device is misconfigured
    /// (missing or broken credential) rather than transiently failing.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::CredentialNotFound { .. }
                | Self::CredentialUnreadable { .. }
                | Self::CredentialInvalid { .. }
        )
    }
}
