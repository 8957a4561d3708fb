//! Status reconciliation between our vector clock and a peer's.
//!
//! Each round repairs at most one difference: either one rumor is mongered
//! toward the peer, or our status is echoed back so the peer does the same
//! for us. Convergence comes from repeating rounds.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, error};

use super::clock::StatusPacket;
use super::node::Gossiper;

/// Result of comparing our clock with a peer's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Neither side is missing anything the other has.
    InSync,
    /// The peer lacks a rumor we hold; it is being mongered to them.
    PeerBehind {
        /// Origin of the resent rumor.
        origin: String,
        /// Sequence of the resent rumor.
        sequence: u32,
    },
    /// The peer holds rumors we lack; our status was sent back.
    PeerAhead,
    /// Our log is missing a rumor our clock claims; the round was abandoned.
    Inconsistent,
}

impl SyncOutcome {
    /// Returns true if nothing is missing on either side.
    #[must_use]
    pub const fn is_in_sync(&self) -> bool {
        matches!(self, Self::InSync)
    }
}

impl Gossiper {
    /// Reconciles our state with `remote`, the status of `peer`.
    ///
    /// Our surplus is repaired first; the peer's surplus is only looked at
    /// once we have nothing to send.
    pub fn reconcile(self: &Arc<Self>, remote: &StatusPacket, peer: SocketAddr) -> SyncOutcome {
        let outcome = self.sync_peer_with_me(remote, peer);
        if !outcome.is_in_sync() {
            return outcome;
        }
        self.sync_me_with_peer(remote, peer)
    }

    /// Mongers the first rumor `peer` is missing, if any.
    ///
    /// Origins the peer does not mention count as unseen by the peer.
    pub fn sync_peer_with_me(
        self: &Arc<Self>,
        remote: &StatusPacket,
        peer: SocketAddr,
    ) -> SyncOutcome {
        let local = self.log.clock();

        for entry in &remote.entries {
            let wanted = entry.next_expected.max(1);
            if local.next_expected(&entry.origin) > wanted {
                return self.resend(&entry.origin, wanted, peer);
            }
        }

        for (origin, next) in local.iter() {
            if next > 1 && !remote.mentions(origin) {
                return self.resend(origin, 1, peer);
            }
        }

        SyncOutcome::InSync
    }

    /// Echoes our status to `peer` if it advertises rumors we lack.
    ///
    /// An origin we have never seen expects sequence 1, so the peer is only
    /// ahead on it when it advertises more than 1.
    pub fn sync_me_with_peer(&self, remote: &StatusPacket, peer: SocketAddr) -> SyncOutcome {
        let local = self.log.clock();
        let ahead = remote
            .entries
            .iter()
            .find(|e| e.next_expected > local.next_expected(&e.origin));

        match ahead {
            Some(entry) => {
                debug!(
                    peer = %peer,
                    origin = %entry.origin,
                    theirs = entry.next_expected,
                    ours = local.next_expected(&entry.origin),
                    "peer is ahead, sending status"
                );
                self.send_status(peer);
                SyncOutcome::PeerAhead
            }
            None => SyncOutcome::InSync,
        }
    }

    fn resend(self: &Arc<Self>, origin: &str, sequence: u32, peer: SocketAddr) -> SyncOutcome {
        match self.log.lookup(origin, sequence) {
            Ok(rumor) => {
                debug!(peer = %peer, origin, seq = sequence, "peer is behind, resending rumor");
                self.spawn_monger(rumor, peer);
                SyncOutcome::PeerBehind {
                    origin: origin.to_string(),
                    sequence,
                }
            }
            Err(e) => {
                error!(peer = %peer, error = %e, "message log inconsistent with vector clock");
                SyncOutcome::Inconsistent
            }
        }
    }
}
