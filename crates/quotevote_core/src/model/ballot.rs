//! Ballot domain model and voter identity derivation.
//!
//! # Invariants
//! - A `VoterIdentity` is never blank; missing or blank input maps to
//!   [`UNKNOWN_VOTER`].
//! - Identities derived from a socket address use the IP only.

use super::quote::QuoteId;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};

/// Sentinel identity for callers whose network address is unavailable.
pub const UNKNOWN_VOTER: &str = "unknown";

pub type BallotId = i64;

/// Identity string used to deduplicate ballots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VoterIdentity(String);

impl VoterIdentity {
    /// Wraps a raw identity, trimming it. Blank input becomes the sentinel.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::unknown()
        } else if trimmed.len() == value.len() {
            Self(value)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_VOTER.to_string())
    }

    /// Derives an identity from the caller's source address.
    pub fn from_peer(addr: Option<IpAddr>) -> Self {
        match addr {
            Some(ip) => Self(canonical_ip(ip).to_string()),
            None => Self::unknown(),
        }
    }

    /// Derives an identity from a transport socket address, dropping the port.
    pub fn from_socket_addr(addr: Option<SocketAddr>) -> Self {
        Self::from_peer(addr.map(|socket| socket.ip()))
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_VOTER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VoterIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// An IPv4 peer seen through a dual-stack socket arrives as `::ffff:a.b.c.d`;
// both spellings must dedupe to one voter.
fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

/// One recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub id: BallotId,
    pub quote_id: QuoteId,
    pub voter: VoterIdentity,
}

#[cfg(test)]
mod tests {
    use super::{VoterIdentity, UNKNOWN_VOTER};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    #[test]
    fn missing_address_maps_to_unknown() {
        assert_eq!(VoterIdentity::from_peer(None).as_str(), UNKNOWN_VOTER);
        assert!(VoterIdentity::new("  ").is_unknown());
    }

    #[test]
    fn socket_addresses_with_different_ports_share_identity() {
        let first: SocketAddr = "10.0.0.7:51000".parse().unwrap();
        let second: SocketAddr = "10.0.0.7:51001".parse().unwrap();
        assert_eq!(
            VoterIdentity::from_socket_addr(Some(first)),
            VoterIdentity::from_socket_addr(Some(second))
        );
    }

    #[test]
    fn ipv4_mapped_ipv6_collapses_to_ipv4() {
        let mapped: IpAddr = "::ffff:192.168.1.9".parse().unwrap();
        let plain = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9));
        assert_eq!(
            VoterIdentity::from_peer(Some(mapped)),
            VoterIdentity::from_peer(Some(plain))
        );
        assert_eq!(VoterIdentity::from_peer(Some(plain)).as_str(), "192.168.1.9");
    }

    #[test]
    fn identity_serializes_as_plain_string() {
        let json = serde_json::to_value(VoterIdentity::from_peer(None)).unwrap();
        assert_eq!(json, serde_json::json!(UNKNOWN_VOTER));
    }

    #[test]
    fn new_trims_surrounding_whitespace() {
        assert_eq!(VoterIdentity::new(" 1.2.3.4 ").as_str(), "1.2.3.4");
    }
}
