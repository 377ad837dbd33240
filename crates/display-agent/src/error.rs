// ============================================
// File: crates/display-agent/src/error.rs
// ============================================
//! # Agent Error Types

use thiserror::Error;

use display_common::CommonError;

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Command agent error types.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Failed to load configuration from a file.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// Config file path.
        path: String,
        /// Why loading failed.
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The listener failed to start (e.g. port already bound).
    #[error("Agent failed to start: {reason}")]
    StartupFailed {
        /// Startup failure detail.
        reason: String,
    },

    /// The host reboot/shutdown invocation itself failed. By the time
    /// this happens the 200 acknowledgement is already sent, so it can
    /// only be logged.
    #[error("Host {action} failed: {reason}")]
    HostOperation {
        /// "reboot" or "shutdown".
        action: String,
        /// Invocation failure detail.
        reason: String,
    },

    /// Shared credential/identity error.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `StartupFailed` error.
    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    /// Creates a `HostOperation` error.
    pub fn host_operation(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HostOperation {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the agent cannot continue running.
    /// Per-request errors are never fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } | Self::StartupFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::config_load("/etc/inpatient-display/agent.toml", "file not found");
        assert!(err.to_string().contains("/etc/inpatient-display/agent.toml"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AgentError::startup_failed("port in use").is_fatal());
        assert!(!AgentError::host_operation("reboot", "spawn failed").is_fatal());
        let common: AgentError = CommonError::credential_not_found("/etc/key").into();
        assert!(!common.is_fatal());
    }
}
