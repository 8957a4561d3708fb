//! Gossiper configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::GossipError;

/// Default hop limit of point-to-point packets.
pub const DEFAULT_HOP_LIMIT: u32 = 32;

/// Configuration consumed by a gossiper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipConfig {
    /// Name this node originates rumors under.
    pub name: String,
    /// Address of the peer-facing gossip socket.
    pub gossip_addr: SocketAddr,
    /// Address of the local client socket.
    pub client_addr: SocketAddr,
    /// Bootstrap peers, as `host:port` strings.
    pub peers: Vec<String>,
    /// Interval between anti-entropy status packets.
    pub anti_entropy_interval: Duration,
    /// How long mongering waits for a peer's status before moving on.
    pub ack_timeout: Duration,
    /// Interval between route rumors; `None` disables them.
    pub route_rumor_interval: Option<Duration>,
    /// Hop limit given to private messages we originate.
    pub hop_limit: u32,
    /// Broadcast client messages as simple messages instead of rumors.
    pub simple: bool,
    /// Seed for the coin flips and peer choices; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            name: "nodeA".to_string(),
            gossip_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            client_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            peers: Vec::new(),
            anti_entropy_interval: Duration::from_secs(1),
            ack_timeout: Duration::from_secs(1),
            route_rumor_interval: None,
            hop_limit: DEFAULT_HOP_LIMIT,
            simple: false,
            rng_seed: None,
        }
    }
}

impl GossipConfig {
    /// Creates a configuration for the node called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the gossip socket address.
    #[must_use]
    pub const fn with_gossip_addr(mut self, addr: SocketAddr) -> Self {
        self.gossip_addr = addr;
        self
    }

    /// Sets the client socket address.
    #[must_use]
    pub const fn with_client_addr(mut self, addr: SocketAddr) -> Self {
        self.client_addr = addr;
        self
    }

    /// Sets the bootstrap peers.
    #[must_use]
    pub fn with_peers(mut self, peers: Vec<String>) -> Self {
        self.peers = peers;
        self
    }

    /// Sets the anti-entropy interval.
    #[must_use]
    pub const fn with_anti_entropy_interval(mut self, interval: Duration) -> Self {
        self.anti_entropy_interval = interval;
        self
    }

    /// Sets the mongering ack timeout.
    #[must_use]
    pub const fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Enables route rumors at the given interval.
    #[must_use]
    pub const fn with_route_rumor_interval(mut self, interval: Duration) -> Self {
        self.route_rumor_interval = Some(interval);
        self
    }

    /// Sets the private message hop limit.
    #[must_use]
    pub const fn with_hop_limit(mut self, hop_limit: u32) -> Self {
        self.hop_limit = hop_limit;
        self
    }

    /// Switches simple broadcast mode on or off.
    #[must_use]
    pub const fn with_simple(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }

    /// Fixes the random seed.
    #[must_use]
    pub const fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or an interval or the hop limit is zero.
    pub fn validate(&self) -> Result<(), GossipError> {
        if self.name.trim().is_empty() {
            return Err(GossipError::Config("name cannot be empty".to_string()));
        }
        if self.anti_entropy_interval.is_zero() {
            return Err(GossipError::Config(
                "anti_entropy_interval must be greater than 0".to_string(),
            ));
        }
        if self.ack_timeout.is_zero() {
            return Err(GossipError::Config(
                "ack_timeout must be greater than 0".to_string(),
            ));
        }
        if self.route_rumor_interval.is_some_and(|i| i.is_zero()) {
            return Err(GossipError::Config(
                "route_rumor_interval must be greater than 0".to_string(),
            ));
        }
        if self.hop_limit == 0 {
            return Err(GossipError::Config(
                "hop_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let config = GossipConfig::default();
        assert_eq!(config.name, "nodeA");
        assert_eq!(config.gossip_addr.port(), 5000);
        assert_eq!(config.client_addr.port(), 8080);
        assert_eq!(config.anti_entropy_interval, Duration::from_secs(1));
        assert_eq!(config.ack_timeout, Duration::from_secs(1));
        assert_eq!(config.route_rumor_interval, None);
        assert_eq!(config.hop_limit, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let config = GossipConfig::new("nodeB")
            .with_peers(vec!["127.0.0.1:5001".to_string()])
            .with_ack_timeout(Duration::from_millis(50))
            .with_route_rumor_interval(Duration::from_secs(10))
            .with_simple(true)
            .with_rng_seed(42);

        assert_eq!(config.name, "nodeB");
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.ack_timeout, Duration::from_millis(50));
        assert_eq!(config.route_rumor_interval, Some(Duration::from_secs(10)));
        assert!(config.simple);
        assert_eq!(config.rng_seed, Some(42));
    }

    #[test]
    fn empty_name_is_invalid() {
        let err = GossipConfig::new("  ").validate().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn zero_durations_are_invalid() {
        assert!(
            GossipConfig::default()
                .with_anti_entropy_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            GossipConfig::default()
                .with_ack_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            GossipConfig::default()
                .with_route_rumor_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn zero_hop_limit_is_invalid() {
        assert!(GossipConfig::default().with_hop_limit(0).validate().is_err());
    }
}
