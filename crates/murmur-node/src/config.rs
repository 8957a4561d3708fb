//! Node configuration.
//!
//! A JSON file supplies the base configuration; every field is optional and
//! falls back to the defaults below. Command-line flags override the file.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use murmur_gossip::peers::MAX_RESERVED_PORT;
use murmur_gossip::{DEFAULT_HOP_LIMIT, GossipConfig, parse_peer_address};
use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// Main node configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    /// Name this node originates rumors under.
    pub name: String,
    /// `host:port` the gossip socket binds to.
    pub gossip_addr: String,
    /// Port of the local client socket, bound on 127.0.0.1.
    pub ui_port: u16,
    /// Bootstrap peers as `host:port`.
    pub peers: Vec<String>,
    /// Broadcast client messages as simple messages.
    pub simple: bool,
    /// Seconds between route rumors; 0 disables them.
    pub rtimer_secs: u64,
    /// Seconds between anti-entropy rounds.
    pub anti_entropy_secs: u64,
    /// Milliseconds mongering waits for an ack.
    pub ack_timeout_ms: u64,
    /// Hop limit of private messages we send.
    pub hop_limit: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "nodeA".to_string(),
            gossip_addr: "127.0.0.1:5000".to_string(),
            ui_port: 8080,
            peers: Vec::new(),
            simple: false,
            rtimer_secs: 0,
            anti_entropy_secs: 1,
            ack_timeout_ms: 1000,
            hop_limit: DEFAULT_HOP_LIMIT,
        }
    }
}

/// Values given on the command line; `None` keeps the file's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--name`.
    pub name: Option<String>,
    /// `--gossip-addr`.
    pub gossip_addr: Option<String>,
    /// `--ui-port`.
    pub ui_port: Option<u16>,
    /// `--peers`.
    pub peers: Option<Vec<String>>,
    /// `--simple`.
    pub simple: bool,
    /// `--rtimer`.
    pub rtimer_secs: Option<u64>,
}

impl NodeConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            NodeError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn from_json(content: &str) -> Result<Self, NodeError> {
        serde_json::from_str(content).map_err(|e| NodeError::Config(format!("invalid JSON: {e}")))
    }

    /// Applies command-line overrides.
    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(name) = overrides.name {
            self.name = name;
        }
        if let Some(gossip_addr) = overrides.gossip_addr {
            self.gossip_addr = gossip_addr;
        }
        if let Some(ui_port) = overrides.ui_port {
            self.ui_port = ui_port;
        }
        if let Some(peers) = overrides.peers {
            self.peers = peers.into_iter().filter(|p| !p.trim().is_empty()).collect();
        }
        if overrides.simple {
            self.simple = true;
        }
        if let Some(rtimer_secs) = overrides.rtimer_secs {
            self.rtimer_secs = rtimer_secs;
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.name.trim().is_empty() {
            return Err(NodeError::Config("node name cannot be empty".to_string()));
        }

        parse_peer_address(&self.gossip_addr)
            .map_err(|e| NodeError::Config(format!("gossip_addr: {e}")))?;

        if self.ui_port <= MAX_RESERVED_PORT {
            return Err(NodeError::Config(format!(
                "ui_port must be above {MAX_RESERVED_PORT}"
            )));
        }

        for peer in &self.peers {
            parse_peer_address(peer).map_err(|e| NodeError::Config(format!("peers: {e}")))?;
        }

        if self.anti_entropy_secs == 0 {
            return Err(NodeError::Config(
                "anti_entropy_secs must be greater than 0".to_string(),
            ));
        }

        if self.ack_timeout_ms == 0 {
            return Err(NodeError::Config(
                "ack_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.hop_limit == 0 {
            return Err(NodeError::Config(
                "hop_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Converts into the gossip core's configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn to_gossip_config(&self) -> Result<GossipConfig, NodeError> {
        self.validate()?;

        let gossip_addr = parse_peer_address(&self.gossip_addr)?;
        let client_addr = SocketAddr::from(([127, 0, 0, 1], self.ui_port));
        let mut config = GossipConfig::new(self.name.trim())
            .with_gossip_addr(gossip_addr)
            .with_client_addr(client_addr)
            .with_peers(self.peers.clone())
            .with_anti_entropy_interval(Duration::from_secs(self.anti_entropy_secs))
            .with_ack_timeout(Duration::from_millis(self.ack_timeout_ms))
            .with_hop_limit(self.hop_limit)
            .with_simple(self.simple);
        if self.rtimer_secs > 0 {
            config = config.with_route_rumor_interval(Duration::from_secs(self.rtimer_secs));
        }
        Ok(config)
    }
}
