//! Rumors and their archived form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single originated message, identified by `(origin, sequence)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rumor {
    /// Name of the gossiper that originated the rumor.
    pub origin: String,
    /// Per-origin sequence number, starting at 1.
    pub sequence: u32,
    /// Message text. Empty for route rumors.
    pub text: String,
}

impl Rumor {
    /// Creates a new rumor.
    #[must_use]
    pub fn new(origin: impl Into<String>, sequence: u32, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            sequence,
            text: text.into(),
        }
    }

    /// Returns the log key of this rumor.
    #[must_use]
    pub fn key(&self) -> RumorKey {
        RumorKey::new(self.origin.clone(), self.sequence)
    }

    /// Returns true for route rumors, which carry no text and only exist so
    /// that other nodes learn a route to the origin.
    #[must_use]
    pub fn is_route_rumor(&self) -> bool {
        self.text.is_empty()
    }
}

/// Structured `(origin, sequence)` key into the message log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RumorKey {
    /// Origin of the rumor.
    pub origin: String,
    /// Sequence number of the rumor.
    pub sequence: u32,
}

impl RumorKey {
    /// Creates a new key.
    #[must_use]
    pub fn new(origin: impl Into<String>, sequence: u32) -> Self {
        Self {
            origin: origin.into(),
            sequence,
        }
    }
}

impl fmt::Display for RumorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.origin, self.sequence)
    }
}

/// A logged rumor together with the time it was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RumorRecord {
    /// The rumor.
    pub rumor: Rumor,
    /// When this node accepted it.
    pub received_at: DateTime<Utc>,
}

impl RumorRecord {
    /// Wraps a rumor accepted now.
    #[must_use]
    pub fn now(rumor: Rumor) -> Self {
        Self {
            rumor,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_matches_rumor() {
        let rumor = Rumor::new("nodeA", 4, "hi");
        assert_eq!(rumor.key(), RumorKey::new("nodeA", 4));
    }

    #[test]
    fn keys_do_not_alias_across_fields() {
        // "A1" + 2 and "A" + 12 concatenate to the same string.
        assert_ne!(RumorKey::new("A1", 2), RumorKey::new("A", 12));
    }

    #[test]
    fn empty_text_is_route_rumor() {
        assert!(Rumor::new("nodeA", 1, "").is_route_rumor());
        assert!(!Rumor::new("nodeA", 1, "hello").is_route_rumor());
    }

    #[test]
    fn record_serializes_for_ui() {
        let record = RumorRecord::now(Rumor::new("nodeA", 1, "hello"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["rumor"]["origin"], "nodeA");
        assert_eq!(json["rumor"]["sequence"], 1);
        assert!(json["received_at"].is_string());
    }
}
