//! Simple broadcast mode: messages flooded to every peer without sequencing.

use std::net::SocketAddr;

use tracing::info;

use super::message::{Packet, SimpleMessage};
use super::node::Gossiper;

impl Gossiper {
    /// Sends `contents` as a simple message to every known peer.
    ///
    /// Returns the number of peers it was sent to.
    pub fn broadcast_simple(&self, contents: impl Into<String>) -> usize {
        let message = SimpleMessage {
            original_name: self.name().to_string(),
            relay_peer_addr: self.gossip_addr().to_string(),
            contents: contents.into(),
        };
        let peers = self.known_peers();
        for peer in &peers {
            self.submit(Packet::Simple(message.clone()), *peer);
        }
        peers.len()
    }

    /// Logs a simple message and relays it to every peer but the last relay.
    ///
    /// An unparseable relay address falls back to the datagram's sender.
    pub fn on_simple_received(&self, mut message: SimpleMessage, from: SocketAddr) {
        info!(
            origin = %message.original_name,
            relay = %message.relay_peer_addr,
            contents = %message.contents,
            "SIMPLE MESSAGE"
        );

        let previous = message
            .relay_peer_addr
            .parse::<SocketAddr>()
            .unwrap_or(from);
        message.relay_peer_addr = self.gossip_addr().to_string();

        for peer in self.peers.all_except(&previous) {
            self.submit(Packet::Simple(message.clone()), peer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gossip::message::ClientRequest;
    use crate::gossip::node::tests::{addr, harness};

    #[tokio::test]
    async fn broadcast_reaches_every_peer() {
        let mut h = harness("A", &[5001, 5002]);
        assert_eq!(h.gossiper.broadcast_simple("hello"), 2);

        let destinations: Vec<_> = h.queue.drain().into_iter().map(|m| m.destination).collect();
        assert_eq!(destinations, vec![addr(5001), addr(5002)]);
    }

    #[tokio::test]
    async fn relay_is_rewritten_and_excluded() {
        let mut h = harness("B", &[5001, 5002, 5003]);
        let message = SimpleMessage {
            original_name: "A".to_string(),
            relay_peer_addr: addr(5001).to_string(),
            contents: "hello".to_string(),
        };
        h.gossiper.handle_packet(Packet::Simple(message), addr(5001));

        let sent = h.queue.drain();
        let destinations: Vec<_> = sent.iter().map(|m| m.destination).collect();
        assert_eq!(destinations, vec![addr(5002), addr(5003)]);
        for m in sent {
            let Packet::Simple(relayed) = m.packet else {
                panic!("expected simple message");
            };
            assert_eq!(relayed.relay_peer_addr, addr(5000).to_string());
            assert_eq!(relayed.original_name, "A");
        }
    }

    #[tokio::test]
    async fn simple_mode_client_message_is_broadcast() {
        let (outbound, mut queue) = crate::outbound::Outbound::channel();
        let (_trigger, shutdown) = crate::shutdown::channel();
        let config = crate::config::GossipConfig::new("A")
            .with_peers(vec![addr(5001).to_string()])
            .with_simple(true);
        let gossiper = std::sync::Arc::new(Gossiper::new(config, outbound, shutdown).unwrap());

        gossiper.handle_client_request(ClientRequest::Message {
            contents: "flood".to_string(),
        });

        let sent = queue.drain();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0].packet, Packet::Simple(_)));
        assert!(gossiper.log().is_empty());
    }
}
