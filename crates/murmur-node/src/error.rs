//! Error types for murmur-node.

use murmur_gossip::GossipError;
use thiserror::Error;

/// Errors that can occur while configuring or starting the node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Gossip core error.
    #[error("gossip error: {0}")]
    Gossip(#[from] GossipError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
