//! Commons governance node.
//!
//! Hosts one [`GovernanceEngine`](commons_governance::GovernanceEngine)
//! behind a single writer:
//! - every mutating [`Command`] goes through one tokio task, in order
//! - queries read the engine concurrently under a shared lock
//! - [`NodeConfig`] loads identities and parameters from TOML

pub mod config;
pub mod error;
pub mod service;

pub use config::NodeConfig;
pub use error::NodeError;
pub use service::{Command, GovernanceHandle, GovernanceService, Outcome};
