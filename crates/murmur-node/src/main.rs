//! murmur-node - gossip daemon
//!
//! Runs one gossiper: a peer-facing UDP socket that spreads rumors and a
//! local client socket that accepts messages to publish.

use std::path::PathBuf;

use clap::Parser;
use murmur_gossip::GossipNode;
use murmur_node::{CliOverrides, NodeConfig, logging};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*};

#[derive(Parser)]
#[command(name = "murmur-node")]
#[command(about = "Gossip daemon spreading rumors over UDP")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, env = "MURMUR_CONFIG")]
    config: Option<PathBuf>,

    /// Name of this gossiper
    #[arg(long)]
    name: Option<String>,

    /// ip:port of the gossip socket
    #[arg(long)]
    gossip_addr: Option<String>,

    /// Port of the local client socket
    #[arg(long)]
    ui_port: Option<u16>,

    /// Comma-separated list of peers as ip:port
    #[arg(long, value_delimiter = ',')]
    peers: Option<Vec<String>>,

    /// Broadcast client messages as simple messages
    #[arg(long)]
    simple: bool,

    /// Seconds between route rumors (0 disables them)
    #[arg(long)]
    rtimer: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            name: self.name.clone(),
            gossip_addr: self.gossip_addr.clone(),
            ui_port: self.ui_port,
            peers: self.peers.clone(),
            simple: self.simple,
            rtimer_secs: self.rtimer,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(logging::env_filter(
            std::env::var("RUST_LOG").ok().as_deref(),
        ))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!(config = %path.display(), "loading config");
            NodeConfig::from_file(path)?
        }
        None => NodeConfig::default(),
    };
    config.apply_overrides(cli.overrides());
    let gossip_config = config.to_gossip_config()?;

    let node = GossipNode::start(gossip_config).await?;
    info!(
        name = %config.name,
        gossip_addr = %node.gossip_addr(),
        client_addr = %node.client_addr(),
        "murmur-node running, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    node.shutdown().await;

    Ok(())
}
