//! UDP runtime wiring a [`Gossiper`] to its sockets and background tasks.
//!
//! - [`GossipNode`]: a running node and its task handles
//! - [`NodeStats`]: receive-side counters

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::GossipConfig;
use crate::error::GossipError;
use crate::gossip::{
    ClientRequest, Gossiper, MAX_PACKET_SIZE, Packet, run_anti_entropy, run_route_rumors,
};
use crate::outbound::{Outbound, run_sender};
use crate::shutdown::{self, Shutdown, ShutdownTrigger};

/// Receive-side counters of a running node.
#[derive(Debug, Default)]
pub struct NodeStats {
    packets_received: AtomicU64,
    malformed_packets: AtomicU64,
    client_requests: AtomicU64,
}

/// Point-in-time copy of [`NodeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStatsSnapshot {
    /// Datagrams read from the gossip socket.
    pub packets_received: u64,
    /// Gossip datagrams dropped because they did not decode.
    pub malformed_packets: u64,
    /// Well-formed client requests handled.
    pub client_requests: u64,
}

impl NodeStats {
    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> NodeStatsSnapshot {
        NodeStatsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            malformed_packets: self.malformed_packets.load(Ordering::Relaxed),
            client_requests: self.client_requests.load(Ordering::Relaxed),
        }
    }

    fn record_packet(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_malformed(&self) {
        self.malformed_packets.fetch_add(1, Ordering::Relaxed);
    }

    fn record_client_request(&self) {
        self.client_requests.fetch_add(1, Ordering::Relaxed);
    }
}

/// A running gossip node.
#[derive(Debug)]
pub struct GossipNode {
    gossiper: Arc<Gossiper>,
    client_addr: SocketAddr,
    stats: Arc<NodeStats>,
    trigger: ShutdownTrigger,
    tasks: Vec<JoinHandle<()>>,
}

impl GossipNode {
    /// Binds both sockets and starts every background task.
    ///
    /// Port 0 in either address binds an ephemeral port; the configuration
    /// the gossiper sees carries the addresses actually bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a socket cannot be bound.
    pub async fn start(mut config: GossipConfig) -> Result<Self, GossipError> {
        config.validate()?;

        let gossip_socket = Arc::new(UdpSocket::bind(config.gossip_addr).await?);
        let client_socket = UdpSocket::bind(config.client_addr).await?;
        config.gossip_addr = gossip_socket.local_addr()?;
        config.client_addr = client_socket.local_addr()?;

        let (trigger, shutdown) = shutdown::channel();
        let (outbound, queue) = Outbound::channel();
        let simple = config.simple;
        let route_rumor_interval = config.route_rumor_interval;
        let client_addr = config.client_addr;
        let gossiper = Arc::new(Gossiper::new(config, outbound, shutdown.clone())?);
        let stats = Arc::new(NodeStats::default());

        info!(
            name = %gossiper.name(),
            gossip_addr = %gossiper.gossip_addr(),
            client_addr = %client_addr,
            peers = ?gossiper.known_peers(),
            simple,
            "gossip node started"
        );

        let mut tasks = vec![
            tokio::spawn(run_sender(
                Arc::clone(&gossip_socket),
                queue,
                shutdown.clone(),
            )),
            tokio::spawn(run_gossip_receiver(
                Arc::clone(&gossiper),
                gossip_socket,
                Arc::clone(&stats),
                shutdown.clone(),
            )),
            tokio::spawn(run_client_receiver(
                Arc::clone(&gossiper),
                client_socket,
                Arc::clone(&stats),
                shutdown.clone(),
            )),
        ];
        if !simple {
            tasks.push(tokio::spawn(run_anti_entropy(
                Arc::clone(&gossiper),
                shutdown.clone(),
            )));
        }
        if let Some(period) = route_rumor_interval {
            tasks.push(tokio::spawn(run_route_rumors(
                Arc::clone(&gossiper),
                period,
                shutdown,
            )));
        }

        Ok(Self {
            gossiper,
            client_addr,
            stats,
            trigger,
            tasks,
        })
    }

    /// Returns the gossiper.
    #[must_use]
    pub const fn gossiper(&self) -> &Arc<Gossiper> {
        &self.gossiper
    }

    /// Returns the bound gossip address.
    #[must_use]
    pub fn gossip_addr(&self) -> SocketAddr {
        self.gossiper.gossip_addr()
    }

    /// Returns the bound client address.
    #[must_use]
    pub const fn client_addr(&self) -> SocketAddr {
        self.client_addr
    }

    /// Returns a snapshot of the receive counters.
    #[must_use]
    pub fn stats(&self) -> NodeStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops every background task and waits for them to finish.
    ///
    /// Mongering tasks observe the same signal and end at their next wait.
    pub async fn shutdown(self) {
        self.trigger.trigger();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "background task failed");
            }
        }
        info!(name = %self.gossiper.name(), "gossip node stopped");
    }
}

async fn run_gossip_receiver(
    gossiper: Arc<Gossiper>,
    socket: Arc<UdpSocket>,
    stats: Arc<NodeStats>,
    mut shutdown: Shutdown,
) {
    let mut buf = vec![0u8; MAX_PACKET_SIZE];
    loop {
        let received = tokio::select! {
            () = shutdown.requested() => break,
            received = socket.recv_from(&mut buf) => received,
        };
        let (len, from) = match received {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "gossip socket receive failed");
                continue;
            }
        };
        stats.record_packet();

        match Packet::decode_wire(&buf[..len]) {
            Ok(packet) => {
                let gossiper = Arc::clone(&gossiper);
                tokio::spawn(async move { gossiper.handle_packet(packet, from) });
            }
            Err(e) => {
                stats.record_malformed();
                warn!(peer = %from, error = %e, "dropping malformed packet");
            }
        }
    }
    debug!("gossip receiver stopped");
}

async fn run_client_receiver(
    gossiper: Arc<Gossiper>,
    socket: UdpSocket,
    stats: Arc<NodeStats>,
    mut shutdown: Shutdown,
) {
    let mut buf = vec![0u8; MAX_PACKET_SIZE];
    loop {
        let received = tokio::select! {
            () = shutdown.requested() => break,
            received = socket.recv_from(&mut buf) => received,
        };
        let (len, from) = match received {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "client socket receive failed");
                continue;
            }
        };

        match ClientRequest::decode_wire(&buf[..len]) {
            Ok(request) => {
                stats.record_client_request();
                gossiper.handle_client_request(request);
            }
            Err(e) => warn!(client = %from, error = %e, "dropping malformed client packet"),
        }
    }
    debug!("client receiver stopped");
}
