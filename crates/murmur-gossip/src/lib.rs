//! # murmur-gossip
//!
//! Epidemic message dissemination for an unstructured peer-to-peer network.
//!
//! This crate provides:
//!
//! - Rumor mongering with ack waits and coin-flip continuation
//! - Anti-entropy status exchange that repairs gaps mongering misses
//! - A per-origin causal gate backed by a vector clock
//! - A routing table learned from rumor traffic, used by private messages
//! - A UDP runtime with a single serialized socket writer
//!
//! ## Core Types
//!
//! - [`Gossiper`]: shared node state and protocol logic
//! - [`GossipNode`]: a running node bound to its sockets
//! - [`GossipConfig`]: node configuration
//! - [`Packet`]: peer packets and their prost wire format
//! - [`PeerRegistry`]: known peer addresses
//! - [`RoutingTable`]: next hop per origin

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gossip;
pub mod outbound;
pub mod peers;
pub mod routing;
pub mod runtime;
pub mod shutdown;

pub use config::{DEFAULT_HOP_LIMIT, GossipConfig};
pub use error::GossipError;
pub use gossip::{
    AckKey, Acceptance, ClientRequest, Gossiper, MAX_PACKET_SIZE, MessageLog, MongerEnd, Packet,
    PacketHandler, PacketKind, PendingAcks, PrivateRecord, Rumor, RumorKey, RumorRecord,
    StatusEntry, StatusPacket, SyncOutcome, VectorClock,
};
pub use outbound::{Outbound, OutboundMessage, OutboundQueue};
pub use peers::{PeerRegistry, parse_peer_address};
pub use routing::RoutingTable;
pub use runtime::{GossipNode, NodeStats, NodeStatsSnapshot};
pub use shutdown::{Shutdown, ShutdownTrigger};
