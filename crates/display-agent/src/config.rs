// ============================================
// File: crates/display-agent/src/config.rs
// ============================================
//! # Agent Configuration
//!
//! ## Creation Reason
//! One explicit configuration struct, constructed once at process start
//! and passed by reference into the registration client and the command
//! agent - no ambient environment lookups scattered through logic.
//!
//! ## Configuration Sections
//! - `listener`: bind address and reboot delay
//! - `credential`: shared-secret file location (+ legacy fallback)
//! - `registry`: registry URL, timeout, cadence
//! - `logging`: log level
//!
//! ## Example Configuration
//! ```toml
//! [listener]
//! bind_addr = "0.0.0.0:8787"
//! reboot_delay_secs = 5
//!
//! [credential]
//! key_file = "/etc/inpatient-display/api-key"
//!
//! [registry]
//! base_url = "http://192.168.1.50:3000"
//! request_timeout_secs = 10
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## Environment Overrides
//! Applied exactly once via [`AgentConfig::apply_env_overrides`]:
//! - `DISPLAY_REGISTRY_URL` → `registry.base_url`
//! - `DISPLAY_AGENT_PORT` → `listener.bind_addr` port
//! - `DISPLAY_API_KEY_FILE` → `credential.key_file`

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use display_common::CredentialStore;
use display_registrar::RegistryConfig;

use crate::error::{AgentError, Result};

// ============================================
// AgentConfig
// ============================================

/// Whole-process configuration for the display appliance.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// Command listener configuration.
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Credential store configuration.
    #[serde(default)]
    pub credential: CredentialConfig,

    /// Registry configuration.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AgentConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, or fails
    /// validation.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AgentError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AgentError::config_load(&path_str, e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AgentError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides. Called exactly once at process
    /// start; nothing else in the codebase reads the environment.
    ///
    /// # Errors
    /// Returns error when an override value cannot be parsed.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("DISPLAY_REGISTRY_URL") {
            self.registry.base_url = url;
        }
        if let Ok(port) = std::env::var("DISPLAY_AGENT_PORT") {
            let port: u16 = port.parse().map_err(|_| {
                AgentError::config_invalid("DISPLAY_AGENT_PORT", "not a valid port number")
            })?;
            self.listener.bind_addr.set_port(port);
        }
        if let Ok(path) = std::env::var("DISPLAY_API_KEY_FILE") {
            self.credential.key_file = path;
        }
        self.validate()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.listener.validate()?;
        self.credential.validate()?;
        self.registry
            .validate()
            .map_err(|e| AgentError::config_invalid("registry", e))?;
        Ok(())
    }

    /// Builds the credential store described by this configuration.
    #[must_use]
    pub fn credential_store(&self) -> CredentialStore {
        let store = CredentialStore::new(&self.credential.key_file);
        match &self.credential.legacy_unit_file {
            Some(unit) => store.with_legacy_unit_file(unit),
            None => store,
        }
    }

    /// Serializes configuration to a TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================
// ListenerConfig
// ============================================

/// Command listener configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Listen address for the command agent.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Seconds between the 200 acknowledgement and the host action.
    #[serde(default = "default_reboot_delay")]
    pub reboot_delay_secs: u64,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8787))
}

fn default_reboot_delay() -> u64 {
    5
}

impl ListenerConfig {
    fn validate(&self) -> Result<()> {
        if self.bind_addr.port() == 0 {
            return Err(AgentError::config_invalid(
                "listener.bind_addr",
                "port cannot be 0",
            ));
        }
        if !(1..=60).contains(&self.reboot_delay_secs) {
            return Err(AgentError::config_invalid(
                "listener.reboot_delay_secs",
                "must be between 1 and 60",
            ));
        }
        Ok(())
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            reboot_delay_secs: default_reboot_delay(),
        }
    }
}

// ============================================
// CredentialConfig
// ============================================

/// Credential store configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Path to the shared-secret file.
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Legacy systemd unit file to extract the key from when the key
    /// file is absent.
    #[serde(default)]
    pub legacy_unit_file: Option<String>,
}

fn default_key_file() -> String {
    "/etc/inpatient-display/api-key".to_string()
}

impl CredentialConfig {
    fn validate(&self) -> Result<()> {
        if self.key_file.is_empty() {
            return Err(AgentError::config_invalid(
                "credential.key_file",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
            legacy_unit_file: None,
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================
