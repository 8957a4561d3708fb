//! Private messages routed hop by hop over the learned routing table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::message::{Packet, PrivateMessage};
use super::node::Gossiper;
use crate::error::GossipError;

/// A private message sent or received by this node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateRecord {
    /// Sender name.
    pub origin: String,
    /// Recipient name.
    pub destination: String,
    /// Message text.
    pub text: String,
    /// When it was sent or delivered.
    pub at: DateTime<Utc>,
}

impl From<&PrivateMessage> for PrivateRecord {
    fn from(message: &PrivateMessage) -> Self {
        Self {
            origin: message.origin.clone(),
            destination: message.destination.clone(),
            text: message.text.clone(),
            at: Utc::now(),
        }
    }
}

/// Private conversations keyed by the other party's name.
#[derive(Debug, Default)]
pub struct PrivateInbox {
    conversations: RwLock<HashMap<String, Vec<PrivateRecord>>>,
}

impl PrivateInbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to the conversation with `peer`.
    pub fn record(&self, peer: &str, record: PrivateRecord) {
        self.conversations
            .write()
            .entry(peer.to_string())
            .or_default()
            .push(record);
    }

    /// Returns the conversation with `peer`, oldest first.
    #[must_use]
    pub fn conversation(&self, peer: &str) -> Vec<PrivateRecord> {
        self.conversations
            .read()
            .get(peer)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the names of everyone we have talked to, sorted.
    #[must_use]
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<_> = self.conversations.read().keys().cloned().collect();
        peers.sort();
        peers
    }
}

impl Gossiper {
    /// Sends a private message toward `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`GossipError::UnknownRoute`] if no route to the destination is known.
    pub fn send_private(&self, text: impl Into<String>, destination: &str) -> Result<(), GossipError> {
        let next_hop = self.resolve_route(destination)?;
        let message = PrivateMessage {
            origin: self.name().to_string(),
            id: 0,
            text: text.into(),
            destination: destination.to_string(),
            hop_limit: self.config().hop_limit,
        };

        self.privates.record(destination, PrivateRecord::from(&message));
        debug!(destination, next_hop = %next_hop, "sending private message");
        self.submit(Packet::Private(message), next_hop);
        Ok(())
    }

    /// Delivers a private message addressed to us or forwards it one hop.
    pub fn on_private_received(&self, mut message: PrivateMessage) {
        if message.destination == self.name() {
            info!(
                origin = %message.origin,
                hop_limit = message.hop_limit,
                contents = %message.text,
                "PRIVATE message"
            );
            let origin = message.origin.clone();
            self.privates.record(&origin, PrivateRecord::from(&message));
            return;
        }

        message.hop_limit = message.hop_limit.saturating_sub(1);
        if message.hop_limit == 0 {
            debug!(origin = %message.origin, destination = %message.destination, "hop limit exhausted, dropping private message");
            return;
        }

        match self.resolve_route(&message.destination) {
            Ok(next_hop) => {
                debug!(destination = %message.destination, next_hop = %next_hop, "forwarding private message");
                self.submit(Packet::Private(message), next_hop);
            }
            Err(e) => warn!(error = %e, "cannot forward private message"),
        }
    }
}
