//! Pending acknowledgements of mongered rumors.
//!
//! A mongering attempt waits for the destination's next status packet. The
//! waiter is registered under a structured key, so distinct
//! `(origin, sequence, peer)` triples can never collide.

use std::collections::HashMap;
use std::net::SocketAddr;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::clock::StatusPacket;
use super::rumor::Rumor;

/// Identifies one mongering round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AckKey {
    /// Origin of the mongered rumor.
    pub origin: String,
    /// Sequence of the mongered rumor.
    pub sequence: u32,
    /// Peer the rumor was sent to.
    pub peer: SocketAddr,
}

impl AckKey {
    /// Creates a key.
    #[must_use]
    pub fn new(origin: impl Into<String>, sequence: u32, peer: SocketAddr) -> Self {
        Self {
            origin: origin.into(),
            sequence,
            peer,
        }
    }

    /// Key for `rumor` sent to `peer`.
    #[must_use]
    pub fn for_rumor(rumor: &Rumor, peer: SocketAddr) -> Self {
        Self::new(rumor.origin.clone(), rumor.sequence, peer)
    }
}

/// Table of live waiters, at most one per key.
#[derive(Debug, Default)]
pub struct PendingAcks {
    waiting: Mutex<HashMap<AckKey, oneshot::Sender<StatusPacket>>>,
}

impl PendingAcks {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for `key`.
    ///
    /// Returns `None` if a waiter for the same key is already live. The
    /// check and the insert happen under one lock.
    pub fn register(&self, key: AckKey) -> Option<oneshot::Receiver<StatusPacket>> {
        let mut waiting = self.waiting.lock();
        if waiting.contains_key(&key) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        waiting.insert(key, tx);
        Some(rx)
    }

    /// Hands `status` to the waiter for `key`, removing it.
    ///
    /// Returns false if nobody was waiting or the waiter already gave up.
    pub fn deliver(&self, key: &AckKey, status: StatusPacket) -> bool {
        let Some(tx) = self.waiting.lock().remove(key) else {
            return false;
        };
        tx.send(status).is_ok()
    }

    /// Withdraws a waiter that stopped waiting without an ack.
    ///
    /// The receiver is closed first, so a later `deliver` for `key` fails and
    /// the status goes through normal handling. A status that slipped in
    /// before the close is returned. The entry is removed only if its
    /// receiver is gone, so a newer waiter registered under the same key
    /// after a delivery is left in place.
    pub fn withdraw(
        &self,
        key: &AckKey,
        mut rx: oneshot::Receiver<StatusPacket>,
    ) -> Option<StatusPacket> {
        rx.close();
        let late = rx.try_recv().ok();
        drop(rx);
        let mut waiting = self.waiting.lock();
        if waiting.get(key).is_some_and(oneshot::Sender::is_closed) {
            waiting.remove(key);
        }
        late
    }

    /// Returns true if a waiter for `key` is live.
    #[must_use]
    pub fn contains(&self, key: &AckKey) -> bool {
        self.waiting.lock().contains_key(key)
    }

    /// Returns the number of live waiters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiting.lock().len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiting.lock().is_empty()
    }
}
