//! # murmur-node
//!
//! Configuration, error types and log setup for the `murmur-node` gossiper daemon.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CliOverrides, NodeConfig};
pub use error::NodeError;
