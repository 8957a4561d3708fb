//! Vector clocks and status packets.
//!
//! A [`VectorClock`] records, per origin, the next sequence number this node
//! expects. A [`StatusPacket`] is the snapshot of a clock that travels on the
//! wire.

use std::collections::BTreeMap;

/// One `(origin, next expected sequence)` pair of a status packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Origin name.
    pub origin: String,
    /// Next sequence number the sender expects from that origin.
    pub next_expected: u32,
}

impl StatusEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(origin: impl Into<String>, next_expected: u32) -> Self {
        Self {
            origin: origin.into(),
            next_expected,
        }
    }
}

/// Snapshot of a sender's whole vector clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPacket {
    /// One entry per origin known to the sender.
    pub entries: Vec<StatusEntry>,
}

impl StatusPacket {
    /// Creates a status packet from its entries.
    #[must_use]
    pub fn new(entries: Vec<StatusEntry>) -> Self {
        Self { entries }
    }

    /// Returns the advertised next sequence for an origin, if mentioned.
    #[must_use]
    pub fn next_expected(&self, origin: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.origin == origin)
            .map(|e| e.next_expected)
    }

    /// Returns true if the packet mentions the origin.
    #[must_use]
    pub fn mentions(&self, origin: &str) -> bool {
        self.entries.iter().any(|e| e.origin == origin)
    }

    /// Returns true if the packet has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-origin next-expected-sequence counters.
///
/// Unknown origins implicitly expect sequence 1. Counters only move forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorClock {
    next: BTreeMap<String, u32>,
}

impl VectorClock {
    /// Creates an empty clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next expected sequence for an origin (1 if unseen).
    #[must_use]
    pub fn next_expected(&self, origin: &str) -> u32 {
        self.get(origin).unwrap_or(1)
    }

    /// Returns the stored counter for an origin, or `None` if never seen.
    #[must_use]
    pub fn get(&self, origin: &str) -> Option<u32> {
        self.next.get(origin).copied()
    }

    /// Moves the counter of `origin` forward to `next`. Never moves it back.
    pub fn advance(&mut self, origin: &str, next: u32) {
        match self.next.get_mut(origin) {
            Some(current) => *current = (*current).max(next),
            None => {
                self.next.insert(origin.to_string(), next);
            }
        }
    }

    /// Iterates over `(origin, next expected)` pairs in origin order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.next.iter().map(|(o, n)| (o.as_str(), *n))
    }

    /// Returns the number of origins tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.next.len()
    }

    /// Returns true if no origin has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    /// Encodes the clock as a status packet.
    #[must_use]
    pub fn to_status(&self) -> StatusPacket {
        StatusPacket::new(
            self.iter()
                .map(|(origin, next)| StatusEntry::new(origin, next))
                .collect(),
        )
    }
}

impl From<&StatusPacket> for VectorClock {
    fn from(status: &StatusPacket) -> Self {
        let mut clock = Self::new();
        for entry in &status.entries {
            clock.advance(&entry.origin, entry.next_expected);
        }
        clock
    }
}
