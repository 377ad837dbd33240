// ============================================
// File: crates/display-agent/src/auth.rs
// ============================================
//! # Request Authentication
//!
//! ## Creation Reason
//! Every privileged request is evaluated independently against the
//! current credential file contents - there is no cross-request state
//! and no cached verdict.
//!
//! ## Security Notes
//! - The 401 response is identical for a missing and a wrong key; the
//!   status code is the only information an unauthenticated caller gets
//! - A missing *server-side* credential is a distinct 500 so operators
//!   can tell "not configured" from "attacker guessed wrong"
//! - Comparison is constant-time (see `Credential::matches`)

use axum::http::{HeaderMap, Uri};

use display_common::CredentialStore;

/// Outcome of authenticating one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    /// Credential present and matching.
    Authorized,
    /// Credential missing or mismatched. Deliberately not distinguished
    /// further.
    Unauthorized,
    /// The agent itself has no credential configured.
    Misconfigured,
}

/// Header carrying the credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter equivalent of [`API_KEY_HEADER`].
pub const API_KEY_PARAM: &str = "api_key";

/// Authenticates a request against the credential store, loading the
/// stored value fresh.
#[must_use]
pub fn authenticate(store: &CredentialStore, headers: &HeaderMap, uri: &Uri) -> AuthVerdict {
    let credential = match store.load() {
        Ok(credential) => credential,
        Err(_) => return AuthVerdict::Misconfigured,
    };

    let Some(presented) = presented_key(headers, uri) else {
        return AuthVerdict::Unauthorized;
    };

    if credential.matches(&presented) {
        AuthVerdict::Authorized
    } else {
        AuthVerdict::Unauthorized
    }
}

/// Extracts the presented key from the `X-Api-Key` header or the
/// `api_key` query parameter.
fn presented_key(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(value) = headers.get(API_KEY_HEADER) {
        if let Ok(s) = value.to_str() {
            return Some(s.to_string());
        }
    }

    uri.query().and_then(|query| {
        query.split('&').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == API_KEY_PARAM).then(|| value.to_string())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn store_with_key(dir: &TempDir, key: &str) -> CredentialStore {
        let path = dir.path().join("api-key");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "{key}").unwrap();
        CredentialStore::new(path)
    }

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key.parse().unwrap());
        headers
    }

    #[test]
    fn test_matching_header_is_authorized() {
        let dir = tempfile::tempdir().unwrap();
        let key = "abc123".repeat(10) + "abcd";
        let store = store_with_key(&dir, &key);

        let verdict = authenticate(&store, &headers_with_key(&key), &Uri::from_static("/reboot"));
        assert_eq!(verdict, AuthVerdict::Authorized);
    }

    #[test]
    fn test_wrong_and_missing_key_are_indistinguishable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_key(&dir, "abc123");

        let wrong = authenticate(
            &store,
            &headers_with_key("wrong"),
            &Uri::from_static("/reboot"),
        );
        let missing = authenticate(&store, &HeaderMap::new(), &Uri::from_static("/reboot"));
        assert_eq!(wrong, AuthVerdict::Unauthorized);
        assert_eq!(missing, AuthVerdict::Unauthorized);
    }

    #[test]
    fn test_query_parameter_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_key(&dir, "abc123");

        let verdict = authenticate(
            &store,
            &HeaderMap::new(),
            &Uri::from_static("/reboot?api_key=abc123"),
        );
        assert_eq!(verdict, AuthVerdict::Authorized);
    }

    #[test]
    fn test_missing_server_credential_is_misconfigured() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("api-key"));

        let verdict = authenticate(
            &store,
            &headers_with_key("anything"),
            &Uri::from_static("/reboot"),
        );
        assert_eq!(verdict, AuthVerdict::Misconfigured);
    }
}
