//! Peer registry.
//!
//! The set of gossip endpoints this node talks to. It starts from the
//! configured bootstrap list and grows with every sender a decoded packet
//! arrives from.

use std::net::{SocketAddr, ToSocketAddrs};

use parking_lot::RwLock;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::error::GossipError;

/// Highest port number considered reserved; peers must listen above it.
pub const MAX_RESERVED_PORT: u16 = 1024;

/// Parses and validates a peer address of the form `host:port`.
///
/// The host may be an IP literal or a resolvable name; the port must be
/// outside the reserved range.
pub fn parse_peer_address(address: &str) -> Result<SocketAddr, GossipError> {
    let trimmed = address.trim();
    let resolved = match trimmed.parse::<SocketAddr>() {
        Ok(addr) => addr,
        Err(_) => trimmed
            .to_socket_addrs()
            .map_err(|e| GossipError::InvalidAddress(format!("{trimmed}: {e}")))?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| {
                GossipError::InvalidAddress(format!("{trimmed}: no IPv4 address"))
            })?,
    };
    check_port(resolved)?;
    Ok(resolved)
}

fn check_port(address: SocketAddr) -> Result<(), GossipError> {
    if address.port() <= MAX_RESERVED_PORT {
        return Err(GossipError::InvalidAddress(format!(
            "{address}: port must be above {MAX_RESERVED_PORT}"
        )));
    }
    Ok(())
}

/// Thread-safe set of known peer addresses.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    /// Our own gossip address, never stored as a peer.
    local: Option<SocketAddr>,
    peers: RwLock<Vec<SocketAddr>>,
}

impl PeerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that ignores our own address.
    #[must_use]
    pub fn with_local(local: SocketAddr) -> Self {
        Self {
            local: Some(local),
            peers: RwLock::new(Vec::new()),
        }
    }

    /// Adds every valid address from a bootstrap list, skipping invalid ones.
    pub fn extend_from_list<S: AsRef<str>>(&self, addresses: &[S]) {
        for address in addresses {
            let address = address.as_ref();
            if address.trim().is_empty() {
                continue;
            }
            if let Err(e) = self.add_str(address) {
                warn!(address, error = %e, "ignoring bootstrap peer");
            }
        }
    }

    /// Adds a peer if it is valid, not ourselves and not already known.
    ///
    /// Returns true if the registry grew.
    pub fn add(&self, address: SocketAddr) -> bool {
        if Some(address) == self.local {
            return false;
        }
        if let Err(e) = check_port(address) {
            debug!(error = %e, "not adding peer");
            return false;
        }

        let mut peers = self.peers.write();
        if peers.contains(&address) {
            return false;
        }
        peers.push(address);
        true
    }

    /// Parses `host:port` and adds it.
    pub fn add_str(&self, address: &str) -> Result<bool, GossipError> {
        let parsed = parse_peer_address(address)?;
        Ok(self.add(parsed))
    }

    /// Returns true if the address is a known peer.
    #[must_use]
    pub fn contains(&self, address: &SocketAddr) -> bool {
        self.peers.read().contains(address)
    }

    /// Returns the number of known peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// Returns true if no peer is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Returns a snapshot of all known peers.
    #[must_use]
    pub fn all(&self) -> Vec<SocketAddr> {
        self.peers.read().clone()
    }

    /// Returns a snapshot of all known peers except one.
    #[must_use]
    pub fn all_except(&self, excluded: &SocketAddr) -> Vec<SocketAddr> {
        self.peers
            .read()
            .iter()
            .filter(|p| *p != excluded)
            .copied()
            .collect()
    }

    /// Picks a uniformly random peer, if any.
    #[must_use]
    pub fn random(&self) -> Option<SocketAddr> {
        self.random_with(&mut rand::thread_rng())
    }

    /// Picks a uniformly random peer using the given source of randomness.
    pub fn random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<SocketAddr> {
        self.peers.read().choose(rng).copied()
    }

    /// Picks a uniformly random peer other than `excluded`.
    ///
    /// Callers are expected to check that at least two peers are known;
    /// otherwise this returns [`GossipError::NotEnoughPeers`].
    pub fn random_except(&self, excluded: &SocketAddr) -> Result<SocketAddr, GossipError> {
        self.random_except_with(&mut rand::thread_rng(), excluded)
    }

    /// Like [`Self::random_except`] with an explicit source of randomness.
    pub fn random_except_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        excluded: &SocketAddr,
    ) -> Result<SocketAddr, GossipError> {
        let peers = self.peers.read();
        let not_enough = || GossipError::NotEnoughPeers {
            excluded: *excluded,
        };
        if peers.len() < 2 {
            return Err(not_enough());
        }
        let candidates: Vec<_> = peers.iter().filter(|p| *p != excluded).collect();
        candidates.choose(rng).map(|p| **p).ok_or_else(not_enough)
    }
}
