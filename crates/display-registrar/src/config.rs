// ============================================
// File: crates/display-registrar/src/config.rs
// ============================================
//! # Registry Configuration

use serde::{Deserialize, Serialize};

/// `[registry]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds. Bounds the outbound call so a
    /// network partition cannot hang an attempt past the next scheduled
    /// invocation.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Registration cadence in seconds. The cadence is enforced by the
    /// external scheduler (systemd timer / cron), not by this process;
    /// it is carried here for operator documentation and `status`
    /// output.
    #[serde(default = "default_register_interval")]
    pub register_interval_secs: u64,
}

fn default_base_url() -> String {
    "http://192.168.1.50:3000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_register_interval() -> u64 {
    300
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            register_interval_secs: default_register_interval(),
        }
    }
}

impl RegistryConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url cannot be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("base_url must start with http:// or https://".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }
        if self.register_interval_secs == 0 {
            return Err("register_interval_secs must be > 0".to_string());
        }
        Ok(())
    }

    /// Returns the registration endpoint URL.
    #[must_use]
    pub fn register_url(&self) -> String {
        format!("{}/api/register-pi", self.base_url.trim_end_matches('/'))
    }
}
