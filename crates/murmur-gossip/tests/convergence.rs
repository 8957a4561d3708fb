//! Loopback tests of rumor dissemination across real nodes.
//!
//! These tests verify:
//! 1. A rumor originated before any peer is known still reaches a later peer
//! 2. Rumors cross a node that relays them
//! 3. Vector clocks converge on every node
//! 4. Routes learned from rumors carry private messages

mod helpers;

use helpers::{eventually, start_node};
use murmur_gossip::ClientRequest;
use tokio::net::UdpSocket;

// ============================================================================
// Two Nodes
// ============================================================================

#[tokio::test]
async fn rumor_from_before_the_peer_existed_is_delivered() {
    let a = start_node("A", &[]).await;
    let rumor = a.gossiper().originate("hello");
    assert_eq!(rumor.sequence, 1);

    // B only knows A; A learns B from B's anti-entropy status and resends.
    let b = start_node("B", &[a.gossip_addr()]).await;
    eventually("B to accept A#1", || b.gossiper().log().next_expected("A") == 2).await;

    let messages = b.gossiper().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].rumor.text, "hello");
    assert_eq!(b.gossiper().resolve_route("A").unwrap(), a.gossip_addr());
    assert!(a.gossiper().peers().contains(&b.gossip_addr()));

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test]
async fn both_directions_converge() {
    let a = start_node("A", &[]).await;
    let b = start_node("B", &[a.gossip_addr()]).await;

    for text in ["a1", "a2", "a3"] {
        a.gossiper().originate(text);
    }
    for text in ["b1", "b2"] {
        b.gossiper().originate(text);
    }

    eventually("clocks to match", || {
        a.gossiper().current_status().next_expected("B") == Some(3)
            && b.gossiper().current_status().next_expected("A") == Some(4)
    })
    .await;
    assert_eq!(a.gossiper().log().clock(), b.gossiper().log().clock());

    a.shutdown().await;
    b.shutdown().await;
}

// ============================================================================
// Three Nodes in a Line
// ============================================================================

#[tokio::test]
async fn rumors_cross_a_relay_and_routes_follow() {
    let b = start_node("B", &[]).await;
    let a = start_node("A", &[b.gossip_addr()]).await;
    let c = start_node("C", &[b.gossip_addr()]).await;

    let client = UdpSocket::bind(helpers::loopback()).await.unwrap();
    let request = ClientRequest::Message {
        contents: "from a".to_string(),
    };
    client
        .send_to(&request.encode_wire(), a.client_addr())
        .await
        .unwrap();
    c.gossiper().originate("from c");

    eventually("every node to hold both rumors", || {
        [&a, &b, &c].iter().all(|n| {
            let log = n.gossiper().log();
            log.next_expected("A") == 2 && log.next_expected("C") == 2
        })
    })
    .await;

    // C never talked to A directly, so its route to A goes through B.
    assert_eq!(c.gossiper().resolve_route("A").unwrap(), b.gossip_addr());
    assert_eq!(a.gossiper().resolve_route("C").unwrap(), b.gossip_addr());
    assert_eq!(b.gossiper().known_origins(), vec!["A".to_string(), "C".to_string()]);

    c.gossiper().send_private("psst", "A").unwrap();
    eventually("A to receive the private message", || {
        !a.gossiper().private_messages("C").is_empty()
    })
    .await;
    let delivered = a.gossiper().private_messages("C");
    assert_eq!(delivered[0].text, "psst");
    assert_eq!(c.gossiper().private_messages("A").len(), 1);

    for node in [a, b, c] {
        node.shutdown().await;
    }
}
