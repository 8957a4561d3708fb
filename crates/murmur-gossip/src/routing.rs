//! Routing table learned from rumor traffic.
//!
//! For every origin we remember the address the last accepted rumor from that
//! origin arrived from. Last writer wins; flapping between two next hops is
//! accepted as is.

use std::collections::HashMap;
use std::net::SocketAddr;

use parking_lot::RwLock;
use tracing::info;

use crate::error::GossipError;

/// Per-origin next hop.
#[derive(Debug)]
pub struct RoutingTable {
    local_name: String,
    routes: RwLock<HashMap<String, SocketAddr>>,
}

impl RoutingTable {
    /// Creates an empty table for the node called `local_name`.
    #[must_use]
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Records that a rumor from `origin` arrived from `address`.
    ///
    /// Returns true if the route was created or changed. Routes to ourselves
    /// are never stored.
    pub fn observe(&self, origin: &str, address: SocketAddr) -> bool {
        if origin == self.local_name {
            return false;
        }

        let mut routes = self.routes.write();
        if routes.get(origin) == Some(&address) {
            return false;
        }
        routes.insert(origin.to_string(), address);
        drop(routes);

        info!(origin, next_hop = %address, "DSDV route updated");
        true
    }

    /// Returns the next hop toward `origin`.
    pub fn resolve(&self, origin: &str) -> Result<SocketAddr, GossipError> {
        self.routes
            .read()
            .get(origin)
            .copied()
            .ok_or_else(|| GossipError::UnknownRoute(origin.to_string()))
    }

    /// Returns every origin a route is known for, sorted by name.
    #[must_use]
    pub fn origins(&self) -> Vec<String> {
        let mut origins: Vec<_> = self.routes.read().keys().cloned().collect();
        origins.sort();
        origins
    }

    /// Returns the number of known routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    /// Returns true if no route is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}
