//! Rumor mongering: push a rumor to one peer, wait for its status, and flip
//! a coin to decide whether to carry on with another peer.
//!
//! The chain of peers is walked in a loop inside a single task.

use std::net::SocketAddr;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use super::acks::AckKey;
use super::message::Packet;
use super::node::Gossiper;
use super::rumor::Rumor;

/// How a mongering task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MongerEnd {
    /// The ack showed a difference; reconciliation took over.
    Resolved,
    /// The coin said stop.
    CoinTails,
    /// The coin said go on but no other peer is known.
    NoOtherPeer,
    /// A mongering attempt for the same rumor and peer was already waiting.
    Suppressed,
    /// The node is shutting down.
    Stopped,
}

/// Decides whether mongering continues after an ack or a timeout.
pub fn continue_mongering<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen_bool(0.5)
}

impl Gossiper {
    /// Mongers `rumor` toward `peer` on a new task.
    pub fn spawn_monger(self: &Arc<Self>, rumor: Rumor, peer: SocketAddr) {
        let gossiper = Arc::clone(self);
        tokio::spawn(async move {
            let end = gossiper.monger(rumor, peer).await;
            debug!(?end, "mongering finished");
        });
    }

    /// Mongers `rumor` starting with `peer` until the chain ends.
    pub async fn monger(self: Arc<Self>, rumor: Rumor, mut peer: SocketAddr) -> MongerEnd {
        let mut shutdown = self.shutdown.clone();

        loop {
            info!(peer = %peer, origin = %rumor.origin, seq = rumor.sequence, "MONGERING with");
            self.submit(Packet::Rumor(rumor.clone()), peer);

            let key = AckKey::for_rumor(&rumor, peer);
            let Some(mut rx) = self.acks.register(key.clone()) else {
                debug!(peer = %peer, origin = %rumor.origin, seq = rumor.sequence, "already awaiting this ack");
                return MongerEnd::Suppressed;
            };

            let waited = tokio::select! {
                () = shutdown.requested() => None,
                waited = tokio::time::timeout(self.config().ack_timeout, &mut rx) => Some(waited),
            };

            let ack = match waited {
                None => {
                    self.acks.withdraw(&key, rx);
                    return MongerEnd::Stopped;
                }
                Some(Ok(Ok(status))) => Some(status),
                Some(_) => {
                    let late = self.acks.withdraw(&key, rx);
                    if late.is_none() {
                        debug!(peer = %peer, origin = %rumor.origin, seq = rumor.sequence, "ack timed out");
                    }
                    late
                }
            };

            if let Some(status) = ack {
                if !self.reconcile(&status, peer).is_in_sync() {
                    return MongerEnd::Resolved;
                }
                info!(peer = %peer, "IN SYNC WITH");
            }

            if !self.flip_coin() {
                return MongerEnd::CoinTails;
            }
            if self.peers.len() < 2 {
                return MongerEnd::NoOtherPeer;
            }
            match self.random_peer_except(&peer) {
                Ok(next) => {
                    info!(peer = %next, "FLIPPED COIN sending rumor to");
                    peer = next;
                }
                Err(_) => return MongerEnd::NoOtherPeer,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gossip::clock::{StatusEntry, StatusPacket};
    use crate::gossip::node::tests::{addr, harness};
    use crate::config::GossipConfig;
    use crate::outbound::{Outbound, OutboundQueue};
    use crate::shutdown::{self, ShutdownTrigger};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn seeded(peers: &[u16], seed: u64) -> (Arc<Gossiper>, OutboundQueue, ShutdownTrigger) {
        let config = GossipConfig::new("A")
            .with_gossip_addr(addr(5000))
            .with_peers(peers.iter().map(|p| addr(*p).to_string()).collect())
            .with_ack_timeout(Duration::from_millis(5))
            .with_rng_seed(seed);
        let (outbound, queue) = Outbound::channel();
        let (trigger, shutdown) = shutdown::channel();
        let gossiper = Arc::new(Gossiper::new(config, outbound, shutdown).unwrap());
        (gossiper, queue, trigger)
    }

    fn rumor_destinations(queue: &mut OutboundQueue) -> Vec<SocketAddr> {
        queue
            .drain()
            .into_iter()
            .filter(|m| matches!(m.packet, Packet::Rumor(_)))
            .map(|m| m.destination)
            .collect()
    }

    // ========== Coin Flip Tests ==========

    #[test]
    fn coin_flip_chain_is_geometric() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 20_000;
        let mut total_sends = 0u64;
        for _ in 0..trials {
            let mut sends = 1u64;
            while continue_mongering(&mut rng) {
                sends += 1;
            }
            total_sends += sends;
        }
        // Geometric with p = 1/2 has mean 2.
        let mean = total_sends as f64 / f64::from(trials);
        assert!((mean - 2.0).abs() < 0.1, "mean chain length {mean}");
    }

    // ========== Ack Wait Tests ==========

    #[tokio::test]
    async fn existing_waiter_suppresses_attempt() {
        let mut h = harness("A", &[5001]);
        let rumor = h.gossiper.log().originate("A", "hi");
        let _held = h
            .gossiper
            .acks()
            .register(AckKey::for_rumor(&rumor, addr(5001)))
            .unwrap();

        let end = Arc::clone(&h.gossiper).monger(rumor, addr(5001)).await;
        assert_eq!(end, MongerEnd::Suppressed);
        assert!(matches!(h.next().await.packet, Packet::Rumor(_)));
        assert_eq!(h.gossiper.acks().len(), 1);
    }

    #[tokio::test]
    async fn timeout_with_single_peer_ends_chain() {
        let mut h = harness("A", &[5001]);
        let rumor = h.gossiper.log().originate("A", "hi");

        let end = tokio::time::timeout(
            Duration::from_secs(2),
            Arc::clone(&h.gossiper).monger(rumor.clone(), addr(5001)),
        )
        .await
        .expect("mongering should end");

        assert!(matches!(end, MongerEnd::CoinTails | MongerEnd::NoOtherPeer));
        assert!(h.gossiper.acks().is_empty());
        let sent = h.next().await;
        assert_eq!(sent.packet, Packet::Rumor(rumor));
        assert!(h.queue.try_recv().is_none());
    }

    #[tokio::test]
    async fn continued_chain_never_repeats_the_last_peer() {
        let mut continued = 0;
        for seed in 0..20 {
            let (gossiper, mut queue, _trigger) = seeded(&[5001, 5002, 5003], seed);
            let rumor = gossiper.log().originate("A", "hi");

            let end = tokio::time::timeout(
                Duration::from_secs(5),
                Arc::clone(&gossiper).monger(rumor, addr(5001)),
            )
            .await
            .expect("mongering should end");
            assert_eq!(end, MongerEnd::CoinTails, "seed {seed}");

            let hops = rumor_destinations(&mut queue);
            assert_eq!(hops[0], addr(5001), "seed {seed}");
            assert!(
                hops.windows(2).all(|w| w[0] != w[1]),
                "seed {seed} repeated a peer: {hops:?}"
            );
            if hops.len() > 1 {
                continued += 1;
            }
        }
        assert!(continued > 0, "no seed continued the chain");
    }

    #[tokio::test]
    async fn in_sync_ack_flips_the_coin() {
        let mut continued = 0;
        for seed in 0..20 {
            let (gossiper, mut queue, _trigger) = seeded(&[5001, 5002], seed);
            let rumor = gossiper.log().originate("A", "hi");
            let task = tokio::spawn(Arc::clone(&gossiper).monger(rumor, addr(5001)));

            let key = AckKey::new("A", 1, addr(5001));
            while !gossiper.acks().contains(&key) {
                tokio::task::yield_now().await;
            }
            let ack = StatusPacket::new(vec![StatusEntry::new("A", 2)]);
            gossiper.handle_packet(Packet::Status(ack), addr(5001));

            let end = tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .expect("mongering should end")
                .unwrap();
            assert_eq!(end, MongerEnd::CoinTails, "seed {seed}");

            let sent = queue.drain();
            assert!(
                sent.iter().all(|m| matches!(m.packet, Packet::Rumor(_))),
                "seed {seed} answered an in-sync ack with a status"
            );
            if let Some(second) = sent.get(1) {
                assert_eq!(second.destination, addr(5002), "seed {seed}");
                continued += 1;
            }
        }
        assert!(continued > 0, "no seed continued after an in-sync ack");
    }

    #[tokio::test]
    async fn ack_showing_peer_ahead_resolves() {
        let mut h = harness("A", &[5001]);
        let rumor = h.gossiper.log().originate("A", "hi");
        let task = tokio::spawn(Arc::clone(&h.gossiper).monger(rumor, addr(5001)));

        // Wait for the rumor to go out, which happens before registration.
        h.next().await;
        let key = AckKey::new("A", 1, addr(5001));
        while !h.gossiper.acks().contains(&key) {
            tokio::task::yield_now().await;
        }

        let ack = StatusPacket::new(vec![StatusEntry::new("A", 2), StatusEntry::new("C", 3)]);
        h.gossiper.handle_packet(Packet::Status(ack), addr(5001));

        assert_eq!(task.await.unwrap(), MongerEnd::Resolved);
        let reply = h.next().await;
        assert_eq!(reply.destination, addr(5001));
        assert!(matches!(reply.packet, Packet::Status(_)));
    }

    #[tokio::test]
    async fn shutdown_interrupts_wait() {
        let h = harness("A", &[5001]);
        let rumor = h.gossiper.log().originate("A", "hi");
        let long_wait = Arc::new(
            Gossiper::new(
                h.gossiper
                    .config()
                    .clone()
                    .with_ack_timeout(Duration::from_secs(60)),
                crate::outbound::Outbound::channel().0,
                h.trigger.subscribe(),
            )
            .unwrap(),
        );
        let task = tokio::spawn(Arc::clone(&long_wait).monger(rumor, addr(5001)));

        let key = AckKey::new("A", 1, addr(5001));
        while !long_wait.acks().contains(&key) {
            tokio::task::yield_now().await;
        }
        h.trigger.trigger();

        let end = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("shutdown should end the wait")
            .unwrap();
        assert_eq!(end, MongerEnd::Stopped);
        assert!(long_wait.acks().is_empty());
    }
}
