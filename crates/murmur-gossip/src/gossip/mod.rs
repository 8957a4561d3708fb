//! Gossip dissemination and reconciliation.
//!
//! ## Architecture
//!
//! - [`Gossiper`]: node state shared by every task, and inbound dispatch
//! - [`MessageLog`]: causal gate plus append-only rumor archive
//! - [`VectorClock`] / [`StatusPacket`]: what a node has, and its wire snapshot
//! - [`PendingAcks`]: one waiter per `(origin, sequence, peer)` while mongering
//! - [`SyncOutcome`]: result of one reconciliation round
//! - [`Packet`]: typed peer packets and their prost envelope

mod acks;
mod anti_entropy;
mod clock;
mod handler;
mod log;
mod message;
mod monger;
mod node;
mod private;
mod rumor;
mod simple;
mod sync;

pub use acks::{AckKey, PendingAcks};
pub use anti_entropy::{run_anti_entropy, run_route_rumors};
pub use clock::{StatusEntry, StatusPacket, VectorClock};
pub use handler::{HandlerRegistry, PacketHandler};
pub use log::{Acceptance, MessageLog};
pub use message::{
    ClientRequest, DataReply, DataRequest, MAX_PACKET_SIZE, Packet, PacketKind, PrivateMessage,
    SearchReply, SearchRequest, SearchResult, SimpleMessage, wire,
};
pub use monger::{MongerEnd, continue_mongering};
pub use node::Gossiper;
pub use private::{PrivateInbox, PrivateRecord};
pub use rumor::{Rumor, RumorKey, RumorRecord};
pub use sync::SyncOutcome;
