//! Message log and vector clock.
//!
//! The log is append-only: a rumor slot is filled once and never rewritten.
//! The clock is advanced only after the matching rumor is stored, so any
//! reader that sees `next_expected(o) == n` can look up every `(o, s < n)`.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::clock::{StatusPacket, VectorClock};
use super::rumor::{Rumor, RumorKey, RumorRecord};
use crate::error::GossipError;

/// Outcome of offering a rumor to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Stored; the origin's counter advanced by one.
    Accepted,
    /// Already logged.
    Duplicate,
    /// Not the next expected sequence for its origin.
    OutOfOrder {
        /// The sequence that would have been accepted.
        expected: u32,
    },
}

impl Acceptance {
    /// Returns true if the rumor was stored.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Archive of accepted rumors plus the vector clock summarizing it.
#[derive(Debug, Default)]
pub struct MessageLog {
    clock: RwLock<VectorClock>,
    rumors: RwLock<HashMap<RumorKey, RumorRecord>>,
}

impl MessageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next expected sequence for an origin (1 if unseen).
    #[must_use]
    pub fn next_expected(&self, origin: &str) -> u32 {
        self.clock.read().next_expected(origin)
    }

    /// Accepts the rumor iff it is the next expected one for its origin.
    ///
    /// Rejections leave the log and clock untouched; there is no reordering
    /// buffer, so a gap stalls its origin until the missing rumor arrives.
    pub fn try_accept(&self, rumor: Rumor) -> Acceptance {
        let mut clock = self.clock.write();
        let key = rumor.key();
        let expected = clock.next_expected(&rumor.origin);

        let mut rumors = self.rumors.write();
        if rumors.contains_key(&key) {
            return Acceptance::Duplicate;
        }
        if rumor.sequence != expected {
            return Acceptance::OutOfOrder { expected };
        }

        let origin = rumor.origin.clone();
        rumors.insert(key, RumorRecord::now(rumor));
        drop(rumors);
        clock.advance(&origin, expected + 1);
        Acceptance::Accepted
    }

    /// Creates and stores the next rumor from a local origin.
    pub fn originate(&self, origin: &str, text: impl Into<String>) -> Rumor {
        let mut clock = self.clock.write();
        let sequence = clock.next_expected(origin);
        let rumor = Rumor::new(origin, sequence, text);

        self.rumors
            .write()
            .insert(rumor.key(), RumorRecord::now(rumor.clone()));
        clock.advance(origin, sequence + 1);
        rumor
    }

    /// Returns a logged rumor.
    ///
    /// A miss for a rumor the clock implies must be present is a broken log
    /// invariant, reported as [`GossipError::MissingRumor`].
    pub fn lookup(&self, origin: &str, sequence: u32) -> Result<Rumor, GossipError> {
        self.rumors
            .read()
            .get(&RumorKey::new(origin, sequence))
            .map(|record| record.rumor.clone())
            .ok_or_else(|| GossipError::MissingRumor {
                origin: origin.to_string(),
                sequence,
            })
    }

    /// Returns a copy of the vector clock.
    #[must_use]
    pub fn clock(&self) -> VectorClock {
        self.clock.read().clone()
    }

    /// Encodes the current vector clock as a status packet.
    #[must_use]
    pub fn snapshot(&self) -> StatusPacket {
        self.clock.read().to_status()
    }

    /// Returns the number of logged rumors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rumors.read().len()
    }

    /// Returns true if nothing is logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rumors.read().is_empty()
    }

    /// Lists logged rumors with text, oldest first. Route rumors are hidden.
    #[must_use]
    pub fn messages(&self) -> Vec<RumorRecord> {
        let mut records: Vec<_> = self
            .rumors
            .read()
            .values()
            .filter(|r| !r.rumor.is_route_rumor())
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.received_at
                .cmp(&b.received_at)
                .then_with(|| a.rumor.key().cmp(&b.rumor.key()))
        });
        records
    }
}
