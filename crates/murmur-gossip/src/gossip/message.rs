//! Gossip packets and their prost wire format.
//!
//! On the wire a packet is a [`wire::GossipPacket`] envelope with one optional
//! field per variant. Exactly one field must be set; anything else is
//! rejected as malformed. Inside the crate packets are the typed [`Packet`]
//! enum.

use prost::Message;
use std::fmt;

use super::clock::{StatusEntry, StatusPacket};
use super::rumor::Rumor;
use crate::error::GossipError;

/// Largest datagram a node reads: a full data chunk plus header room.
pub const MAX_PACKET_SIZE: usize = 8192 + 1088;

/// Prost definitions of everything that crosses a socket.
pub mod wire {
    use prost::Message;

    /// Envelope for peer-to-peer traffic.
    #[derive(Clone, PartialEq, Message)]
    pub struct GossipPacket {
        /// Simple broadcast message.
        #[prost(message, optional, tag = "1")]
        pub simple: Option<SimpleMessage>,
        /// Rumor.
        #[prost(message, optional, tag = "2")]
        pub rumor: Option<RumorMessage>,
        /// Vector clock snapshot.
        #[prost(message, optional, tag = "3")]
        pub status: Option<StatusPacket>,
        /// Point-to-point private message.
        #[prost(message, optional, tag = "4")]
        pub private: Option<PrivateMessage>,
        /// Request for a data chunk.
        #[prost(message, optional, tag = "5")]
        pub data_request: Option<DataRequest>,
        /// Reply carrying a data chunk.
        #[prost(message, optional, tag = "6")]
        pub data_reply: Option<DataReply>,
        /// Keyword search request.
        #[prost(message, optional, tag = "7")]
        pub search_request: Option<SearchRequest>,
        /// Keyword search reply.
        #[prost(message, optional, tag = "8")]
        pub search_reply: Option<SearchReply>,
    }

    /// Message relayed to every peer, without sequencing.
    #[derive(Clone, PartialEq, Message)]
    pub struct SimpleMessage {
        /// Name of the node that created the message.
        #[prost(string, tag = "1")]
        pub original_name: String,
        /// Gossip address of the node that relayed it last.
        #[prost(string, tag = "2")]
        pub relay_peer_addr: String,
        /// Message text.
        #[prost(string, tag = "3")]
        pub contents: String,
    }

    /// Wire form of a rumor.
    #[derive(Clone, PartialEq, Message)]
    pub struct RumorMessage {
        /// Origin name.
        #[prost(string, tag = "1")]
        pub origin: String,
        /// Sequence number.
        #[prost(uint32, tag = "2")]
        pub id: u32,
        /// Text.
        #[prost(string, tag = "3")]
        pub text: String,
    }

    /// One entry of a status packet.
    #[derive(Clone, PartialEq, Message)]
    pub struct PeerStatus {
        /// Origin name.
        #[prost(string, tag = "1")]
        pub identifier: String,
        /// Next expected sequence.
        #[prost(uint32, tag = "2")]
        pub next_id: u32,
    }

    /// Wire form of a vector clock.
    #[derive(Clone, PartialEq, Message)]
    pub struct StatusPacket {
        /// One entry per known origin.
        #[prost(message, repeated, tag = "1")]
        pub want: Vec<PeerStatus>,
    }

    /// Point-to-point message routed hop by hop.
    #[derive(Clone, PartialEq, Message)]
    pub struct PrivateMessage {
        /// Sender name.
        #[prost(string, tag = "1")]
        pub origin: String,
        /// Always 0; private messages are not sequenced.
        #[prost(uint32, tag = "2")]
        pub id: u32,
        /// Text.
        #[prost(string, tag = "3")]
        pub text: String,
        /// Destination name.
        #[prost(string, tag = "4")]
        pub destination: String,
        /// Remaining hops.
        #[prost(uint32, tag = "5")]
        pub hop_limit: u32,
    }

    /// Request for the chunk or metafile with the given hash.
    #[derive(Clone, PartialEq, Message)]
    pub struct DataRequest {
        /// Requester name.
        #[prost(string, tag = "1")]
        pub origin: String,
        /// Name of the node holding the data.
        #[prost(string, tag = "2")]
        pub destination: String,
        /// Remaining hops.
        #[prost(uint32, tag = "3")]
        pub hop_limit: u32,
        /// Hash of the requested data.
        #[prost(bytes = "vec", tag = "4")]
        pub hash_value: Vec<u8>,
    }

    /// Reply to a [`DataRequest`].
    #[derive(Clone, PartialEq, Message)]
    pub struct DataReply {
        /// Name of the node sending the data.
        #[prost(string, tag = "1")]
        pub origin: String,
        /// Requester name.
        #[prost(string, tag = "2")]
        pub destination: String,
        /// Remaining hops.
        #[prost(uint32, tag = "3")]
        pub hop_limit: u32,
        /// Hash of the data.
        #[prost(bytes = "vec", tag = "4")]
        pub hash_value: Vec<u8>,
        /// The data itself.
        #[prost(bytes = "vec", tag = "5")]
        pub data: Vec<u8>,
    }

    /// Keyword search flooded with a budget.
    #[derive(Clone, PartialEq, Message)]
    pub struct SearchRequest {
        /// Searcher name.
        #[prost(string, tag = "1")]
        pub origin: String,
        /// Remaining budget.
        #[prost(uint64, tag = "2")]
        pub budget: u64,
        /// Keywords.
        #[prost(string, repeated, tag = "3")]
        pub keywords: Vec<String>,
    }

    /// One match in a [`SearchReply`].
    #[derive(Clone, PartialEq, Message)]
    pub struct SearchResult {
        /// Matching file name.
        #[prost(string, tag = "1")]
        pub file_name: String,
        /// Hash of the file's metafile.
        #[prost(bytes = "vec", tag = "2")]
        pub metafile_hash: Vec<u8>,
        /// Chunks held by the replier.
        #[prost(uint64, repeated, tag = "3")]
        pub chunk_map: Vec<u64>,
        /// Total chunk count of the file.
        #[prost(uint64, tag = "4")]
        pub chunk_count: u64,
    }

    /// Reply to a [`SearchRequest`].
    #[derive(Clone, PartialEq, Message)]
    pub struct SearchReply {
        /// Replier name.
        #[prost(string, tag = "1")]
        pub origin: String,
        /// Searcher name.
        #[prost(string, tag = "2")]
        pub destination: String,
        /// Remaining hops.
        #[prost(uint32, tag = "3")]
        pub hop_limit: u32,
        /// Matches.
        #[prost(message, repeated, tag = "4")]
        pub results: Vec<SearchResult>,
    }

    /// Envelope for traffic from the local client.
    #[derive(Clone, PartialEq, Message)]
    pub struct ClientPacket {
        /// Message to gossip (or broadcast in simple mode).
        #[prost(message, optional, tag = "1")]
        pub simple: Option<ClientMessage>,
        /// Private message to send.
        #[prost(message, optional, tag = "2")]
        pub private: Option<ClientPrivate>,
    }

    /// Client request to publish a message.
    #[derive(Clone, PartialEq, Message)]
    pub struct ClientMessage {
        /// Message text.
        #[prost(string, tag = "1")]
        pub contents: String,
    }

    /// Client request to send a private message.
    #[derive(Clone, PartialEq, Message)]
    pub struct ClientPrivate {
        /// Message text.
        #[prost(string, tag = "1")]
        pub text: String,
        /// Destination name.
        #[prost(string, tag = "2")]
        pub destination: String,
    }
}

pub use wire::{
    DataReply, DataRequest, PrivateMessage, SearchReply, SearchRequest, SearchResult,
    SimpleMessage,
};

/// Discriminant of a [`Packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// [`Packet::Simple`].
    Simple,
    /// [`Packet::Rumor`].
    Rumor,
    /// [`Packet::Status`].
    Status,
    /// [`Packet::Private`].
    Private,
    /// [`Packet::DataRequest`].
    DataRequest,
    /// [`Packet::DataReply`].
    DataReply,
    /// [`Packet::SearchRequest`].
    SearchRequest,
    /// [`Packet::SearchReply`].
    SearchReply,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple => "simple",
            Self::Rumor => "rumor",
            Self::Status => "status",
            Self::Private => "private",
            Self::DataRequest => "data-request",
            Self::DataReply => "data-reply",
            Self::SearchRequest => "search-request",
            Self::SearchReply => "search-reply",
        };
        f.write_str(name)
    }
}

/// A decoded peer packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Simple broadcast message.
    Simple(SimpleMessage),
    /// Rumor.
    Rumor(Rumor),
    /// Vector clock snapshot.
    Status(StatusPacket),
    /// Private message.
    Private(PrivateMessage),
    /// Data request.
    DataRequest(DataRequest),
    /// Data reply.
    DataReply(DataReply),
    /// Search request.
    SearchRequest(SearchRequest),
    /// Search reply.
    SearchReply(SearchReply),
}

impl Packet {
    /// Returns the packet kind.
    #[must_use]
    pub const fn kind(&self) -> PacketKind {
        match self {
            Self::Simple(_) => PacketKind::Simple,
            Self::Rumor(_) => PacketKind::Rumor,
            Self::Status(_) => PacketKind::Status,
            Self::Private(_) => PacketKind::Private,
            Self::DataRequest(_) => PacketKind::DataRequest,
            Self::DataReply(_) => PacketKind::DataReply,
            Self::SearchRequest(_) => PacketKind::SearchRequest,
            Self::SearchReply(_) => PacketKind::SearchReply,
        }
    }

    /// Encodes the packet to prost wire format.
    #[must_use]
    pub fn encode_wire(&self) -> Vec<u8> {
        wire::GossipPacket::from(self.clone()).encode_to_vec()
    }

    /// Decodes a packet from prost wire format.
    ///
    /// # Errors
    ///
    /// Returns [`GossipError::MalformedPacket`] if the bytes do not decode or
    /// the envelope does not carry exactly one variant.
    pub fn decode_wire(bytes: &[u8]) -> Result<Self, GossipError> {
        let envelope = wire::GossipPacket::decode(bytes)
            .map_err(|e| GossipError::MalformedPacket(format!("failed to decode: {e}")))?;
        Self::try_from(envelope)
    }
}

impl From<Rumor> for wire::RumorMessage {
    fn from(rumor: Rumor) -> Self {
        Self {
            origin: rumor.origin,
            id: rumor.sequence,
            text: rumor.text,
        }
    }
}

impl From<wire::RumorMessage> for Rumor {
    fn from(msg: wire::RumorMessage) -> Self {
        Self::new(msg.origin, msg.id, msg.text)
    }
}

impl From<StatusPacket> for wire::StatusPacket {
    fn from(status: StatusPacket) -> Self {
        Self {
            want: status
                .entries
                .into_iter()
                .map(|e| wire::PeerStatus {
                    identifier: e.origin,
                    next_id: e.next_expected,
                })
                .collect(),
        }
    }
}

impl From<wire::StatusPacket> for StatusPacket {
    fn from(status: wire::StatusPacket) -> Self {
        Self::new(
            status
                .want
                .into_iter()
                .map(|s| StatusEntry::new(s.identifier, s.next_id))
                .collect(),
        )
    }
}

impl From<Packet> for wire::GossipPacket {
    fn from(packet: Packet) -> Self {
        let mut envelope = Self::default();
        match packet {
            Packet::Simple(m) => envelope.simple = Some(m),
            Packet::Rumor(r) => envelope.rumor = Some(r.into()),
            Packet::Status(s) => envelope.status = Some(s.into()),
            Packet::Private(m) => envelope.private = Some(m),
            Packet::DataRequest(m) => envelope.data_request = Some(m),
            Packet::DataReply(m) => envelope.data_reply = Some(m),
            Packet::SearchRequest(m) => envelope.search_request = Some(m),
            Packet::SearchReply(m) => envelope.search_reply = Some(m),
        }
        envelope
    }
}

impl TryFrom<wire::GossipPacket> for Packet {
    type Error = GossipError;

    fn try_from(envelope: wire::GossipPacket) -> Result<Self, Self::Error> {
        let wire::GossipPacket {
            simple,
            rumor,
            status,
            private,
            data_request,
            data_reply,
            search_request,
            search_reply,
        } = envelope;

        let variants = [
            simple.map(Packet::Simple),
            rumor.map(|r| Packet::Rumor(r.into())),
            status.map(|s| Packet::Status(s.into())),
            private.map(Packet::Private),
            data_request.map(Packet::DataRequest),
            data_reply.map(Packet::DataReply),
            search_request.map(Packet::SearchRequest),
            search_reply.map(Packet::SearchReply),
        ];
        exactly_one(variants)
    }
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    /// Publish a message.
    Message {
        /// Message text.
        contents: String,
    },
    /// Send a private message.
    Private {
        /// Message text.
        text: String,
        /// Destination name.
        destination: String,
    },
}

impl ClientRequest {
    /// Encodes the request to prost wire format.
    #[must_use]
    pub fn encode_wire(&self) -> Vec<u8> {
        let mut envelope = wire::ClientPacket::default();
        match self.clone() {
            Self::Message { contents } => {
                envelope.simple = Some(wire::ClientMessage { contents });
            }
            Self::Private { text, destination } => {
                envelope.private = Some(wire::ClientPrivate { text, destination });
            }
        }
        envelope.encode_to_vec()
    }

    /// Decodes a request from prost wire format.
    ///
    /// # Errors
    ///
    /// Returns [`GossipError::MalformedPacket`] if the bytes do not decode or
    /// the envelope does not carry exactly one request.
    pub fn decode_wire(bytes: &[u8]) -> Result<Self, GossipError> {
        let envelope = wire::ClientPacket::decode(bytes)
            .map_err(|e| GossipError::MalformedPacket(format!("failed to decode: {e}")))?;
        exactly_one([
            envelope
                .simple
                .map(|m| Self::Message { contents: m.contents }),
            envelope.private.map(|p| Self::Private {
                text: p.text,
                destination: p.destination,
            }),
        ])
    }
}

fn exactly_one<T, const N: usize>(variants: [Option<T>; N]) -> Result<T, GossipError> {
    let mut present = variants.into_iter().flatten();
    let first = present
        .next()
        .ok_or_else(|| GossipError::MalformedPacket("no variant populated".to_string()))?;
    let extra = present.count();
    if extra > 0 {
        return Err(GossipError::MalformedPacket(format!(
            "{} variants populated, expected exactly one",
            extra + 1
        )));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(entries: &[(&str, u32)]) -> StatusPacket {
        StatusPacket::new(
            entries
                .iter()
                .map(|(o, n)| StatusEntry::new(*o, *n))
                .collect(),
        )
    }

    // ========== Wire Roundtrip Tests ==========

    #[test]
    fn rumor_roundtrip() {
        let packet = Packet::Rumor(Rumor::new("nodeA", 3, "hello"));
        let decoded = Packet::decode_wire(&packet.encode_wire()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn status_roundtrip_keeps_entry_order() {
        let packet = Packet::Status(status(&[("b", 2), ("a", 9)]));
        let decoded = Packet::decode_wire(&packet.encode_wire()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn empty_status_is_still_a_status() {
        let packet = Packet::Status(StatusPacket::default());
        let decoded = Packet::decode_wire(&packet.encode_wire()).unwrap();
        assert_eq!(decoded.kind(), PacketKind::Status);
    }

    #[test]
    fn collaborator_variants_survive_decoding() {
        let packet = Packet::SearchReply(SearchReply {
            origin: "nodeB".to_string(),
            destination: "nodeA".to_string(),
            hop_limit: 10,
            results: vec![SearchResult {
                file_name: "cat.png".to_string(),
                metafile_hash: vec![1, 2, 3],
                chunk_map: vec![1, 2],
                chunk_count: 2,
            }],
        });
        let decoded = Packet::decode_wire(&packet.encode_wire()).unwrap();
        assert_eq!(decoded, packet);
    }

    // ========== Malformed Packet Tests ==========

    #[test]
    fn empty_envelope_is_rejected() {
        let bytes = wire::GossipPacket::default().encode_to_vec();
        let err = Packet::decode_wire(&bytes).unwrap_err();
        assert!(matches!(err, GossipError::MalformedPacket(_)));
    }

    #[test]
    fn two_variants_are_rejected() {
        let envelope = wire::GossipPacket {
            rumor: Some(Rumor::new("a", 1, "x").into()),
            status: Some(wire::StatusPacket::default()),
            ..Default::default()
        };
        let err = Packet::decode_wire(&envelope.encode_to_vec()).unwrap_err();
        assert!(err.to_string().contains("2 variants"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Packet::decode_wire(&[0xff, 0xff, 0xff, 0xff]).is_err());
    }

    // ========== Client Packet Tests ==========

    #[test]
    fn client_message_roundtrip() {
        let request = ClientRequest::Message {
            contents: "hi".to_string(),
        };
        assert_eq!(
            ClientRequest::decode_wire(&request.encode_wire()).unwrap(),
            request
        );
    }

    #[test]
    fn client_private_roundtrip() {
        let request = ClientRequest::Private {
            text: "psst".to_string(),
            destination: "nodeC".to_string(),
        };
        assert_eq!(
            ClientRequest::decode_wire(&request.encode_wire()).unwrap(),
            request
        );
    }

    #[test]
    fn client_packet_with_both_fields_is_rejected() {
        let envelope = wire::ClientPacket {
            simple: Some(wire::ClientMessage::default()),
            private: Some(wire::ClientPrivate::default()),
        };
        assert!(ClientRequest::decode_wire(&envelope.encode_to_vec()).is_err());
    }

    #[test]
    fn packet_kind_display() {
        assert_eq!(PacketKind::DataRequest.to_string(), "data-request");
        assert_eq!(Packet::Status(StatusPacket::default()).kind(), PacketKind::Status);
    }
}
