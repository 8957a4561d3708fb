//! Test helpers for loopback gossip tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use murmur_gossip::{GossipConfig, GossipNode};

/// Default test timeout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Loopback address with an ephemeral port.
pub fn loopback() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

/// Configuration with short intervals so tests converge quickly.
pub fn fast_config(name: &str, peers: &[SocketAddr]) -> GossipConfig {
    GossipConfig::new(name)
        .with_gossip_addr(loopback())
        .with_client_addr(loopback())
        .with_peers(peers.iter().map(ToString::to_string).collect())
        .with_anti_entropy_interval(Duration::from_millis(50))
        .with_ack_timeout(Duration::from_millis(100))
}

/// Start a node on loopback that knows `peers`.
pub async fn start_node(name: &str, peers: &[SocketAddr]) -> GossipNode {
    GossipNode::start(fast_config(name, peers))
        .await
        .expect("node should start")
}

/// Poll `check` until it holds, panicking after [`TEST_TIMEOUT`].
pub async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    let polled = tokio::time::timeout(TEST_TIMEOUT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {what}");
}
