// ============================================
// File: crates/display-common/src/identity.rs
// ============================================
//! # Device Identity
//!
//! ## Creation Reason
//! The registry tracks devices by hostname and address under DHCP
//! churn, so identity facts must be re-queried live on every
//! registration attempt - a cached address defeats the purpose of
//! periodic registration.
//!
//! ## Main Functionality
//! - `DeviceIdentity`: validated (hostname, primary IPv4) pair
//! - Address discovery via a routing-table probe (connected UDP socket,
//!   no packet is ever sent)
//!
//! ## ⚠️ Important Note for Next Developer
//! - A loopback or unspecified address must never enter a
//!   `DeviceIdentity` - a report with a placeholder address would
//!   corrupt the registry's record of reachability. The checked
//!   constructor is the only way to build one.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use crate::error::{CommonError, Result};

/// Well-known external address used to select the primary route.
/// The socket is only *connected*, never written to.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:53";

/// The facts a device reports about itself: canonical hostname and the
/// primary non-loopback IPv4 address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Canonical hostname.
    pub hostname: String,
    /// Primary non-loopback IPv4 address.
    pub ip: Ipv4Addr,
}

impl DeviceIdentity {
    /// Builds an identity, rejecting addresses the registry must never
    /// see.
    ///
    /// # Errors
    /// Returns `NoUsableAddress` for loopback, unspecified, or
    /// link-local addresses, and `HostnameUnavailable` for an empty
    /// hostname.
    pub fn new(hostname: impl Into<String>, ip: Ipv4Addr) -> Result<Self> {
        let hostname = hostname.into();
        if hostname.is_empty() {
            return Err(CommonError::HostnameUnavailable {
                reason: "hostname is empty".into(),
            });
        }
        if !is_usable(ip) {
            return Err(CommonError::no_usable_address(format!(
                "{ip} is not a reachable device address"
            )));
        }
        Ok(Self { hostname, ip })
    }

    /// Queries live system state for the current identity.
    ///
    /// # Errors
    /// Returns an error when the hostname cannot be read or no usable
    /// non-loopback IPv4 address is resolvable. Callers must abort
    /// before any network report is sent in that case.
    pub fn detect() -> Result<Self> {
        let hostname = hostname::get()
            .map_err(|e| CommonError::HostnameUnavailable {
                reason: e.to_string(),
            })?
            .to_string_lossy()
            .into_owned();

        let ip = primary_ipv4()?;
        Self::new(hostname, ip)
    }
}

/// Resolves the device's primary IPv4 address from the routing table.
///
/// Connecting a UDP socket selects the source address the kernel would
/// use for external traffic without transmitting anything.
fn primary_ipv4() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .map_err(|e| CommonError::no_usable_address(format!("socket bind failed: {e}")))?;
    socket
        .connect(ROUTE_PROBE_ADDR)
        .map_err(|e| CommonError::no_usable_address(format!("no default route: {e}")))?;

    match socket.local_addr() {
        Ok(SocketAddr::V4(addr)) if is_usable(*addr.ip()) => Ok(*addr.ip()),
        Ok(addr) => Err(CommonError::no_usable_address(format!(
            "resolved source address {addr} is not usable"
        ))),
        Err(e) => Err(CommonError::no_usable_address(format!(
            "local address lookup failed: {e}"
        ))),
    }
}

/// Whether an address is a concrete reachable device address.
fn is_usable(ip: Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_unspecified() && !ip.is_link_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_loopback() {
        let err = DeviceIdentity::new("kiosk-01", Ipv4Addr::LOCALHOST).unwrap_err();
        assert!(matches!(err, CommonError::NoUsableAddress { .. }));
    }

    #[test]
    fn test_rejects_unspecified_and_link_local() {
        assert!(DeviceIdentity::new("kiosk-01", Ipv4Addr::UNSPECIFIED).is_err());
        assert!(DeviceIdentity::new("kiosk-01", Ipv4Addr::new(169, 254, 0, 7)).is_err());
    }

    #[test]
    fn test_rejects_empty_hostname() {
        let err = DeviceIdentity::new("", Ipv4Addr::new(192, 168, 1, 20)).unwrap_err();
        assert!(matches!(err, CommonError::HostnameUnavailable { .. }));
    }

    #[test]
    fn test_accepts_private_address() {
        let id = DeviceIdentity::new("kiosk-01", Ipv4Addr::new(192, 168, 1, 20)).unwrap();
        assert_eq!(id.hostname, "kiosk-01");
        assert_eq!(id.ip, Ipv4Addr::new(192, 168, 1, 20));
    }
}
