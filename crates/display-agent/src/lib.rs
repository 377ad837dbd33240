// ============================================
// File: crates/display-agent/src/lib.rs
// ============================================
//! # Display Agent Library
//!
//! ## Creation Reason
//! The locally-hosted privileged command surface of a display
//! appliance: a small authenticated HTTP listener through which the
//! registry (or an operator) can reboot or power off the device.
//!
//! ## Main Functionality
//! - [`config`]: Whole-process configuration (TOML + one-shot env overrides)
//! - [`server`]: `CommandAgent` listener orchestration
//! - [`auth`]: Per-request credential verification
//! - [`host`]: Host reboot/shutdown capability behind a trait seam
//! - [`scheduler`]: Deferred host actions decoupled from request handlers
//! - [`error`]: Agent-specific error types
//!
//! ## Request State Machine
//! ```text
//! Received → Authenticating → Authorized → Acknowledged(200)
//!                          │                   │ (delayed)
//!                          │                   ▼
//!                          │               Executing → Terminal
//!                          ├→ Unauthorized → Rejected(401)
//!                          └→ Misconfigured → Rejected(500)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The 200 acknowledgement is always sent before the host action
//!   runs; a spawn failure after the ack can only be logged
//! - Agent shutdown detaches pending deferred actions, it never
//!   cancels them - once a caller has been told "rebooting", the
//!   system follows through
//!
//! ## Last Modified
//! v0.3.0 - Initial agent implementation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod error;
pub mod host;
pub mod scheduler;
pub mod server;

// Re-export primary types
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use host::{HostControl, NoopHost, SystemdHost};
pub use server::CommandAgent;
