// ============================================
// File: crates/display-common/src/lib.rs
// ============================================
//! # Display Common - Shared Appliance Utilities
//!
//! ## Creation Reason
//! Provides the foundational types shared by the registration client and
//! the command agent, so both sides of the device authenticate against
//! provably the same credential.
//!
//! ## Main Functionality
//! - [`credential`]: Shared-secret loading and constant-time verification
//! - [`identity`]: Live hostname and primary-address discovery
//! - [`time`]: Unix timestamp helpers
//! - [`error`]: Common error types and result alias
//!
//! ## Architecture Position
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               display-agent                   │
//! │                     │                         │
//! │          ┌──────────┴──────────┐              │
//! │          ▼                     │              │
//! │   display-registrar            │              │
//! │          │                     │              │
//! │          └──────────┬──────────┘              │
//! │                     ▼                         │
//! │              display-common  ◄── You are here │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - keep dependencies minimal
//! - The credential value must never appear in logs or error messages
//! - Identity facts are queried live on every use, never cached
//!
//! ## Last Modified
//! v0.3.0 - Initial shared utilities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod credential;
pub mod error;
pub mod identity;
pub mod time;

// Re-export commonly used items at crate root
pub use credential::{Credential, CredentialStore};
pub use error::{CommonError, Result};
pub use identity::DeviceIdentity;
