// ============================================
// File: crates/display-registrar/src/lib.rs
// ============================================
//! # Display Registrar - Device Registration Client
//!
//! ## Creation Reason
//! Keeps the central registry's record of this device's network
//! location fresh under DHCP churn: every invocation re-queries live
//! identity facts and reports them, authenticated by the device's
//! shared secret.
//!
//! ## Main Functionality
//! - [`client`]: `RegistryClient` issuing the registration report
//! - [`models`]: Wire shapes and the `RegistrationOutcome` classification
//! - [`config`]: `[registry]` configuration section
//! - [`error`]: Registrar-specific error types
//!
//! ## Protocol
//! ```text
//! POST {base_url}/api/register-pi
//!   { "apiKey": "...", "hostname": "...", "ip": "..." }
//! 2xx → { "status": "new" | "updated", ... }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every invocation is independent; retry belongs to the external
//!   scheduler, never to this crate
//! - No report is ever sent without a concrete non-loopback address

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::RegistryClient;
pub use config::RegistryConfig;
pub use error::{RegistrarError, Result};
pub use models::RegistrationOutcome;
