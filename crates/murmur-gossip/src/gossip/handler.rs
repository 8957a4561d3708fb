//! Handlers for packet kinds the gossip core does not interpret.
//!
//! Data transfer and search packets are decoded like everything else and then
//! handed to whichever handler was registered for their kind.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;

use super::message::{Packet, PacketKind};

/// Consumer of one packet kind.
pub trait PacketHandler: Send + Sync {
    /// Handles a packet received from `from`.
    fn handle(&self, packet: Packet, from: SocketAddr);
}

impl<F> PacketHandler for F
where
    F: Fn(Packet, SocketAddr) + Send + Sync,
{
    fn handle(&self, packet: Packet, from: SocketAddr) {
        self(packet, from);
    }
}

/// Handlers keyed by packet kind.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<PacketKind, Arc<dyn PacketHandler>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handler` for `kind`, replacing any previous one.
    pub fn register(&self, kind: PacketKind, handler: Arc<dyn PacketHandler>) {
        self.handlers.write().insert(kind, handler);
    }

    /// Passes the packet to its handler. Returns false if none is registered.
    pub fn dispatch(&self, packet: Packet, from: SocketAddr) -> bool {
        let handler = self.handlers.read().get(&packet.kind()).cloned();
        match handler {
            Some(handler) => {
                handler.handle(packet, from);
                true
            }
            None => false,
        }
    }

    /// Returns true if a handler is installed for `kind`.
    #[must_use]
    pub fn contains(&self, kind: PacketKind) -> bool {
        self.handlers.read().contains_key(&kind)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self
            .handlers
            .read()
            .keys()
            .map(ToString::to_string)
            .collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gossip::message::DataRequest;
    use parking_lot::Mutex;

    fn addr() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 5001))
    }

    fn data_request() -> Packet {
        Packet::DataRequest(DataRequest {
            origin: "nodeA".to_string(),
            destination: "nodeB".to_string(),
            hop_limit: 10,
            hash_value: vec![1, 2, 3],
        })
    }

    #[test]
    fn dispatches_to_registered_kind() {
        let registry = HandlerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.register(
            PacketKind::DataRequest,
            Arc::new(move |packet: Packet, from: SocketAddr| sink.lock().push((packet, from))),
        );

        assert!(registry.dispatch(data_request(), addr()));
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0].1, addr());
    }

    #[test]
    fn unregistered_kind_is_not_dispatched() {
        let registry = HandlerRegistry::new();
        assert!(!registry.contains(PacketKind::DataRequest));
        assert!(!registry.dispatch(data_request(), addr()));
    }

    #[test]
    fn debug_lists_kinds() {
        let registry = HandlerRegistry::new();
        registry.register(PacketKind::SearchReply, Arc::new(|_: Packet, _: SocketAddr| {}));
        assert!(format!("{registry:?}").contains("search-reply"));
    }
}
