// ============================================
// File: crates/display-agent/src/host.rs
// ============================================
//! # Host Control
//!
//! ## Creation Reason
//! Abstracts the privileged reboot/shutdown invocation behind a trait
//! seam so authentication and scheduling logic can be exercised without
//! root privileges or an actual restart.
//!
//! ## Main Functionality
//! - `HostControl`: async reboot/shutdown capability
//! - `SystemdHost`: production implementation shelling out to systemctl
//! - `NoopHost`: counting mock for tests and dry runs
//!
//! ## ⚠️ Important Note for Next Developer
//! - The host operations are naturally idempotent: triggering reboot
//!   twice has the same observable effect as once

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tracing::info;

use crate::error::{AgentError, Result};

/// Capability to reboot or power off the host.
///
/// Implementations must be `Send + Sync`: the capability is shared
/// across concurrent request handlers and deferred tasks.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Initiates a host reboot.
    async fn reboot(&self) -> Result<()>;

    /// Initiates a host power-off.
    async fn shutdown(&self) -> Result<()>;
}

// ============================================
// SystemdHost
// ============================================

/// Production host control via `systemctl`.
#[derive(Debug, Default)]
pub struct SystemdHost;

impl SystemdHost {
    /// Creates the production host control.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, action: &'static str, verb: &'static str) -> Result<()> {
        info!(action, "Invoking host operation");
        let status = tokio::process::Command::new("systemctl")
            .arg(verb)
            .status()
            .await
            .map_err(|e| AgentError::host_operation(action, e.to_string()))?;

        if !status.success() {
            return Err(AgentError::host_operation(
                action,
                format!("systemctl exited with {status}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl HostControl for SystemdHost {
    async fn reboot(&self) -> Result<()> {
        self.run("reboot", "reboot").await
    }

    async fn shutdown(&self) -> Result<()> {
        self.run("shutdown", "poweroff").await
    }
}

// ============================================
// NoopHost
// ============================================

/// Host control that records invocations instead of performing them.
#[derive(Debug, Default)]
pub struct NoopHost {
    reboots: AtomicU32,
    shutdowns: AtomicU32,
}

impl NoopHost {
    /// Creates a fresh counting mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reboot invocations so far.
    #[must_use]
    pub fn reboot_count(&self) -> u32 {
        self.reboots.load(Ordering::SeqCst)
    }

    /// Number of shutdown invocations so far.
    #[must_use]
    pub fn shutdown_count(&self) -> u32 {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostControl for NoopHost {
    async fn reboot(&self) -> Result<()> {
        self.reboots.fetch_add(1, Ordering::SeqCst);
        info!("Dry-run: host reboot suppressed");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        info!("Dry-run: host shutdown suppressed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_host_counts_invocations() {
        let host = NoopHost::new();
        host.reboot().await.unwrap();
        host.reboot().await.unwrap();
        host.shutdown().await.unwrap();

        assert_eq!(host.reboot_count(), 2);
        assert_eq!(host.shutdown_count(), 1);
    }
}
