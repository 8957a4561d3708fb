//! Error types for murmur-gossip.

use thiserror::Error;

/// Errors that can occur in gossip operations.
#[derive(Debug, Error)]
pub enum GossipError {
    /// Address could not be parsed, resolved, or uses a reserved port.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A random peer other than `excluded` was requested but fewer than two peers are known.
    #[error("need at least two known peers to choose one other than {excluded}")]
    NotEnoughPeers {
        /// The address that had to be excluded from the choice.
        excluded: std::net::SocketAddr,
    },

    /// No route is known toward the given origin.
    #[error("no route to {0}")]
    UnknownRoute(String),

    /// Packet could not be decoded or did not carry exactly one variant.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The message log is missing a rumor that the vector clock says it holds.
    #[error("rumor {origin}#{sequence} should be logged but is missing")]
    MissingRumor {
        /// Origin of the missing rumor.
        origin: String,
        /// Sequence number of the missing rumor.
        sequence: u32,
    },

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
