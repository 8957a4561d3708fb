//! The gossiper: shared node state and inbound dispatch.
//!
//! A [`Gossiper`] is shared by reference counting between the receive loops,
//! the schedulers and every mongering task. Each table it owns carries its
//! own lock, so unrelated peers and origins never serialize on one another.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::acks::{AckKey, PendingAcks};
use super::clock::StatusPacket;
use super::handler::{HandlerRegistry, PacketHandler};
use super::log::{Acceptance, MessageLog};
use super::message::{ClientRequest, Packet, PacketKind};
use super::monger::continue_mongering;
use super::private::{PrivateInbox, PrivateRecord};
use super::rumor::{Rumor, RumorRecord};
use crate::config::GossipConfig;
use crate::error::GossipError;
use crate::outbound::Outbound;
use crate::peers::PeerRegistry;
use crate::routing::RoutingTable;
use crate::shutdown::Shutdown;

/// State of one gossip node.
#[derive(Debug)]
pub struct Gossiper {
    name: String,
    gossip_addr: SocketAddr,
    config: GossipConfig,
    pub(super) peers: PeerRegistry,
    pub(super) log: MessageLog,
    pub(super) routes: RoutingTable,
    pub(super) acks: PendingAcks,
    pub(super) privates: PrivateInbox,
    handlers: HandlerRegistry,
    outbound: Outbound,
    rng: Mutex<StdRng>,
    pub(super) shutdown: Shutdown,
}

impl Gossiper {
    /// Creates a gossiper that sends through `outbound`.
    ///
    /// Bootstrap peers from the configuration that fail validation are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: GossipConfig,
        outbound: Outbound,
        shutdown: Shutdown,
    ) -> Result<Self, GossipError> {
        config.validate()?;

        let peers = PeerRegistry::with_local(config.gossip_addr);
        peers.extend_from_list(&config.peers);
        let rng = config
            .rng_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(Self {
            name: config.name.clone(),
            gossip_addr: config.gossip_addr,
            routes: RoutingTable::new(config.name.clone()),
            config,
            peers,
            log: MessageLog::new(),
            acks: PendingAcks::new(),
            privates: PrivateInbox::new(),
            handlers: HandlerRegistry::new(),
            outbound,
            rng: Mutex::new(rng),
            shutdown,
        })
    }

    /// Returns the node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the gossip socket address.
    #[must_use]
    pub const fn gossip_addr(&self) -> SocketAddr {
        self.gossip_addr
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GossipConfig {
        &self.config
    }

    /// Returns the peer registry.
    #[must_use]
    pub const fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// Returns the message log.
    #[must_use]
    pub const fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Returns the routing table.
    #[must_use]
    pub const fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Returns the pending ack table.
    #[must_use]
    pub const fn acks(&self) -> &PendingAcks {
        &self.acks
    }

    // ========== Collaborator API ==========

    /// Enqueues a packet for sending.
    pub fn submit(&self, packet: Packet, destination: SocketAddr) -> bool {
        self.outbound.submit(packet, destination)
    }

    /// Returns the next hop toward `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`GossipError::UnknownRoute`] if no route is known.
    pub fn resolve_route(&self, origin: &str) -> Result<SocketAddr, GossipError> {
        self.routes.resolve(origin)
    }

    /// Returns a snapshot of the known peers.
    #[must_use]
    pub fn known_peers(&self) -> Vec<SocketAddr> {
        self.peers.all()
    }

    /// Picks a uniformly random peer, if any.
    #[must_use]
    pub fn random_peer(&self) -> Option<SocketAddr> {
        self.peers.random_with(&mut *self.rng.lock())
    }

    /// Picks a uniformly random peer other than `excluded`.
    ///
    /// # Errors
    ///
    /// Returns [`GossipError::NotEnoughPeers`] if fewer than two peers are known.
    pub fn random_peer_except(&self, excluded: &SocketAddr) -> Result<SocketAddr, GossipError> {
        self.peers.random_except_with(&mut *self.rng.lock(), excluded)
    }

    /// Returns the current vector clock as a status packet.
    #[must_use]
    pub fn current_status(&self) -> StatusPacket {
        self.log.snapshot()
    }

    /// Installs the handler for a collaborator packet kind.
    pub fn register_handler(&self, kind: PacketKind, handler: Arc<dyn PacketHandler>) {
        self.handlers.register(kind, handler);
    }

    // ========== Inbound Dispatch ==========

    /// Handles a decoded packet received from `from`.
    ///
    /// The sender is added to the peer registry before dispatch.
    pub fn handle_packet(self: &Arc<Self>, packet: Packet, from: SocketAddr) {
        if self.peers.add(from) {
            debug!(peer = %from, "learned peer from traffic");
        }

        match packet {
            Packet::Rumor(rumor) => self.on_rumor_received(rumor, from),
            Packet::Status(status) => self.on_status_received(status, from),
            Packet::Simple(message) => self.on_simple_received(message, from),
            Packet::Private(message) => self.on_private_received(message),
            other => {
                let kind = other.kind();
                if !self.handlers.dispatch(other, from) {
                    debug!(%kind, peer = %from, "no handler registered, dropping packet");
                }
            }
        }
    }

    /// Ingests a rumor from `from`.
    ///
    /// Rejected rumors are dropped without a reply. An accepted rumor updates
    /// the route to its origin, is acknowledged with our status and, if
    /// another peer is known, mongered onward.
    pub fn on_rumor_received(self: &Arc<Self>, rumor: Rumor, from: SocketAddr) {
        match self.log.try_accept(rumor.clone()) {
            Acceptance::Accepted => {}
            Acceptance::Duplicate => {
                debug!(origin = %rumor.origin, seq = rumor.sequence, peer = %from, "duplicate rumor dropped");
                return;
            }
            Acceptance::OutOfOrder { expected } => {
                debug!(
                    origin = %rumor.origin,
                    seq = rumor.sequence,
                    expected,
                    peer = %from,
                    "out-of-order rumor dropped"
                );
                return;
            }
        }

        info!(
            origin = %rumor.origin,
            from = %from,
            seq = rumor.sequence,
            contents = %rumor.text,
            peers = ?self.peers.all(),
            "RUMOR received"
        );
        self.routes.observe(&rumor.origin, from);
        self.send_status(from);

        if self.peers.len() >= 2 {
            match self.random_peer_except(&from) {
                Ok(peer) => self.spawn_monger(rumor, peer),
                Err(e) => debug!(error = %e, "not mongering"),
            }
        }
    }

    /// Handles a status packet from `from`.
    ///
    /// If it acknowledges a rumor we are mongering to `from`, it is handed
    /// to that waiter, which reconciles. Otherwise we reconcile here.
    pub fn on_status_received(self: &Arc<Self>, status: StatusPacket, from: SocketAddr) {
        info!(peer = %from, status = ?status.entries, "STATUS received");

        for entry in status.entries.iter().filter(|e| e.next_expected > 1) {
            let key = AckKey::new(entry.origin.clone(), entry.next_expected - 1, from);
            if self.acks.deliver(&key, status.clone()) {
                debug!(origin = %key.origin, seq = key.sequence, peer = %from, "ack delivered");
                return;
            }
        }

        if self.reconcile(&status, from).is_in_sync() {
            info!(peer = %from, "IN SYNC WITH");
        }
    }

    /// Handles a request from the local client.
    pub fn handle_client_request(self: &Arc<Self>, request: ClientRequest) {
        match request {
            ClientRequest::Message { contents } => {
                info!(contents = %contents, "CLIENT MESSAGE");
                if self.config.simple {
                    self.broadcast_simple(contents);
                } else {
                    self.originate(contents);
                }
            }
            ClientRequest::Private { text, destination } => {
                if let Err(e) = self.send_private(text, &destination) {
                    warn!(destination = %destination, error = %e, "private message dropped");
                }
            }
        }
    }

    // ========== Origination ==========

    /// Originates a rumor and mongers it toward one random peer, if any.
    pub fn originate(self: &Arc<Self>, text: impl Into<String>) -> Rumor {
        let rumor = self.log.originate(&self.name, text);
        debug!(seq = rumor.sequence, "originated rumor");
        if let Some(peer) = self.random_peer() {
            self.spawn_monger(rumor.clone(), peer);
        }
        rumor
    }

    /// Sends our status to `peer`.
    pub fn send_status(&self, peer: SocketAddr) {
        self.submit(Packet::Status(self.log.snapshot()), peer);
    }

    pub(super) fn flip_coin(&self) -> bool {
        continue_mongering(&mut *self.rng.lock())
    }

    // ========== Observation ==========

    /// Lists accepted rumors with text, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<RumorRecord> {
        self.log.messages()
    }

    /// Lists origins a route is known for, sorted.
    #[must_use]
    pub fn known_origins(&self) -> Vec<String> {
        self.routes.origins()
    }

    /// Lists the private conversation with `peer`, oldest first.
    #[must_use]
    pub fn private_messages(&self, peer: &str) -> Vec<PrivateRecord> {
        self.privates.conversation(peer)
    }
}
