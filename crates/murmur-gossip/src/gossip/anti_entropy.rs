//! Periodic background schedulers: anti-entropy and route rumors.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::message::Packet;
use super::node::Gossiper;
use crate::shutdown::Shutdown;

impl Gossiper {
    /// Sends our status to one random peer.
    ///
    /// Returns the chosen peer, or `None` if no peer is known.
    pub fn anti_entropy_round(&self) -> Option<SocketAddr> {
        let peer = self.random_peer()?;
        trace!(peer = %peer, "anti-entropy status");
        self.send_status(peer);
        Some(peer)
    }

    /// Originates an empty rumor and sends it to one random peer.
    ///
    /// Nothing is originated while no peer is known. Returns the chosen peer.
    pub fn send_route_rumor(&self) -> Option<SocketAddr> {
        let peer = self.random_peer()?;
        let rumor = self.log.originate(self.name(), "");
        debug!(peer = %peer, seq = rumor.sequence, "sending route rumor");
        self.submit(Packet::Rumor(rumor), peer);
        Some(peer)
    }
}

/// Runs anti-entropy rounds every configured interval until shutdown.
pub async fn run_anti_entropy(gossiper: Arc<Gossiper>, mut shutdown: Shutdown) {
    let period = gossiper.config().anti_entropy_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.requested() => break,
            _ = ticker.tick() => {
                gossiper.anti_entropy_round();
            }
        }
    }
    debug!("anti-entropy stopped");
}

/// Sends a route rumor now and then every `period` until shutdown.
pub async fn run_route_rumors(gossiper: Arc<Gossiper>, period: Duration, mut shutdown: Shutdown) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.requested() => break,
            _ = ticker.tick() => {
                gossiper.send_route_rumor();
            }
        }
    }
    debug!("route rumors stopped");
}
