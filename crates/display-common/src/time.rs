// ============================================
// File: crates/display-common/src/time.rs
// ============================================
//! # Time Utilities

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in seconds.
///
/// Clock-before-epoch is treated as zero rather than panicking.
#[must_use]
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
