//! Outbound packet queue and the single socket writer draining it.
//!
//! Protocol code never writes to the socket itself: it submits
//! `(packet, destination)` pairs to an unbounded FIFO and one sender task
//! performs the writes in submission order.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::gossip::Packet;
use crate::shutdown::Shutdown;

/// A packet waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// The packet.
    pub packet: Packet,
    /// Where to send it.
    pub destination: SocketAddr,
}

/// Submitting half of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Outbound {
    /// Creates a connected submitter/queue pair.
    #[must_use]
    pub fn channel() -> (Self, OutboundQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, OutboundQueue { rx })
    }

    /// Enqueues a packet. Never blocks.
    ///
    /// Returns false if the sender task is gone, in which case the packet is dropped.
    pub fn submit(&self, packet: Packet, destination: SocketAddr) -> bool {
        let kind = packet.kind();
        if self
            .tx
            .send(OutboundMessage {
                packet,
                destination,
            })
            .is_err()
        {
            debug!(%kind, %destination, "outbound queue closed, dropping packet");
            return false;
        }
        true
    }
}

/// Receiving half of the queue.
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl OutboundQueue {
    /// Waits for the next message; `None` once every submitter is dropped.
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.rx.recv().await
    }

    /// Takes the next message if one is queued.
    pub fn try_recv(&mut self) -> Option<OutboundMessage> {
        self.rx.try_recv().ok()
    }

    /// Takes every queued message.
    pub fn drain(&mut self) -> Vec<OutboundMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Drains the queue onto the socket until shutdown or until every submitter is gone.
pub async fn run_sender(socket: Arc<UdpSocket>, mut queue: OutboundQueue, mut shutdown: Shutdown) {
    loop {
        let message = tokio::select! {
            () = shutdown.requested() => break,
            message = queue.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let bytes = message.packet.encode_wire();
        match socket.send_to(&bytes, message.destination).await {
            Ok(_) => trace!(
                kind = %message.packet.kind(),
                destination = %message.destination,
                "packet sent"
            ),
            Err(e) => warn!(
                destination = %message.destination,
                error = %e,
                "failed to send packet"
            ),
        }
    }
    debug!("outbound sender stopped");
}
