// ============================================
// File: crates/display-common/src/credential.rs
// ============================================
//! # Credential Store
//!
//! ## Creation Reason
//! Both the registration client (outbound authentication) and the
//! command agent (inbound verification) must use the same shared
//! secret. Loading it through one store from one well-known path makes
//! that provably true.
//!
//! ## Main Functionality
//! - `Credential`: opaque token with redacted Debug and constant-time
//!   comparison
//! - `CredentialStore`: filesystem loader with a legacy service-unit
//!   fallback
//!
//! ## ⚠️ Important Note for Next Developer
//! - This module never *generates* a credential. Generation is an
//!   external provisioning step (32 random bytes, hex-encoded). A
//!   missing credential is a fatal configuration error for the caller.
//! - Rotation is an external operational action, never done here.

use std::fmt;
use std::path::{Path, PathBuf};

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::{CommonError, Result};

// ============================================
// Credential
// ============================================

/// The device's shared secret.
///
/// The inner value is deliberately inaccessible except through
/// [`Credential::as_str`] and [`Credential::matches`]; `Debug` output
/// is redacted so the token can never leak through logging.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token, rejecting values that cannot be a credential.
    ///
    /// # Errors
    /// Returns `CredentialInvalid` for empty tokens or tokens
    /// containing whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(CommonError::credential_invalid("token is empty"));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(CommonError::credential_invalid(
                "token contains whitespace",
            ));
        }
        Ok(Self(token))
    }

    /// Returns the token for outbound authentication.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares a presented token against this credential in constant
    /// time. Length differences do not short-circuit: both sides are
    /// padded to the longer length with distinct fill bytes before the
    /// comparison, and the length check itself is constant-time.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();

        let max_len = std::cmp::max(expected.len(), presented.len());
        let mut a = vec![0u8; max_len];
        let mut b = vec![0xFFu8; max_len];
        a[..expected.len()].copy_from_slice(expected);
        b[..presented.len()].copy_from_slice(presented);

        let lengths_equal = expected.len().ct_eq(&presented.len());
        let contents_equal = a.ct_eq(&b);
        (lengths_equal & contents_equal).into()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ============================================
// CredentialStore
// ============================================

/// Loads the shared secret from its well-known filesystem location.
///
/// # Lifecycle
/// The credential is created once at provisioning time and stays stable
/// across reboots and IP churn. The store only ever reads it.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    key_file: PathBuf,
    legacy_unit_file: Option<PathBuf>,
}

impl CredentialStore {
    /// Creates a store reading from `key_file` only.
    #[must_use]
    pub fn new(key_file: impl Into<PathBuf>) -> Self {
        Self {
            key_file: key_file.into(),
            legacy_unit_file: None,
        }
    }

    /// Adds a legacy systemd unit file to fall back to when the key
    /// file is absent. Older provisioning scripts embedded the key as
    /// `Environment=API_KEY=<value>` in the agent's unit file.
    #[must_use]
    pub fn with_legacy_unit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy_unit_file = Some(path.into());
        self
    }

    /// Returns the primary key file path.
    #[must_use]
    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    /// Returns `true` when a credential can currently be loaded.
    ///
    /// Used by the agent's health endpoint, which reports presence as a
    /// boolean only and never echoes the value.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.load().is_ok()
    }

    /// Loads the credential.
    ///
    /// # Errors
    /// - `CredentialNotFound` when neither the key file nor the legacy
    ///   unit file yields a token
    /// - `CredentialUnreadable` when the key file exists but cannot be
    ///   read
    /// - `CredentialInvalid` when the stored value is empty or contains
    ///   interior whitespace
    pub fn load(&self) -> Result<Credential> {
        match std::fs::read_to_string(&self.key_file) {
            Ok(content) => {
                debug!(path = %self.key_file.display(), "Loaded credential file");
                Credential::new(content.trim())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.load_from_legacy_unit(),
            Err(e) => Err(CommonError::CredentialUnreadable {
                path: self.key_file.display().to_string(),
                source: e,
            }),
        }
    }

    /// Extracts the key from a legacy service-unit file, if configured.
    fn load_from_legacy_unit(&self) -> Result<Credential> {
        let Some(unit_path) = &self.legacy_unit_file else {
            return Err(CommonError::credential_not_found(
                self.key_file.display().to_string(),
            ));
        };

        let content = std::fs::read_to_string(unit_path).map_err(|_| {
            CommonError::credential_not_found(self.key_file.display().to_string())
        })?;

        for line in content.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("Environment=") {
                if let Some(value) = rest.trim_matches('"').strip_prefix("API_KEY=") {
                    debug!(path = %unit_path.display(), "Loaded credential from legacy unit file");
                    return Credential::new(value.trim());
                }
            }
        }

        Err(CommonError::credential_not_found(
            self.key_file.display().to_string(),
        ))
    }
}

// ============================================
// Tests
// ============================================
