//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use commons_governance::EngineSetup;
use commons_types::{Address, Amount, GovernanceParams, PublicKey};
use commons_utils::LogFormat;

use crate::NodeError;

/// Configuration for a governance node.
///
/// Identities are hex strings (optionally `0x`-prefixed). They are parsed and
/// checked by [`NodeConfig::engine_setup`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Commands buffered before submitters wait.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    /// Administrator identity.
    #[serde(default)]
    pub admin: String,

    /// Vote-manager Ed25519 public key.
    #[serde(default)]
    pub manager_key: String,

    #[serde(default = "default_ledger_address")]
    pub ledger_address: String,

    /// Bound into every ballot commitment; changing it invalidates committed ballots.
    #[serde(default = "default_coordinator_address")]
    pub coordinator_address: String,

    /// Treasury balance at start-up, in raw units.
    #[serde(default)]
    pub treasury: Amount,

    #[serde(default)]
    pub governance: GovernanceParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_queue_depth() -> usize {
    256
}

fn default_ledger_address() -> String {
    format!("{:064x}", 1)
}

fn default_coordinator_address() -> String {
    format!("{:064x}", 2)
}

// ── Impl ───────────────────────────────────────────────────────────────

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, NodeError>
where
    T::Err: std::fmt::Display,
{
    if value.is_empty() {
        return Err(NodeError::Config(format!("{field} is not set")));
    }
    value
        .parse()
        .map_err(|e| NodeError::Config(format!("{field}: {e}")))
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Parse identities and check parameters.
    pub fn engine_setup(&self) -> Result<EngineSetup, NodeError> {
        let admin: Address = parse_field("admin", &self.admin)?;
        let manager_key: PublicKey = parse_field("manager_key", &self.manager_key)?;
        let ledger_address: Address = parse_field("ledger_address", &self.ledger_address)?;
        let coordinator_address: Address =
            parse_field("coordinator_address", &self.coordinator_address)?;

        for (field, address) in [
            ("admin", &admin),
            ("ledger_address", &ledger_address),
            ("coordinator_address", &coordinator_address),
        ] {
            if address.is_zero() {
                return Err(NodeError::Config(format!("{field} must not be zero")));
            }
        }
        if ledger_address == coordinator_address {
            return Err(NodeError::Config(
                "ledger and coordinator need distinct identities".into(),
            ));
        }
        self.governance
            .validate()
            .map_err(|e| NodeError::Config(format!("governance: {e}")))?;

        Ok(EngineSetup {
            ledger_address,
            coordinator_address,
            admin,
            manager_key,
            params: self.governance.clone(),
            treasury: self.treasury,
        })
    }

    /// Full check of the configuration, as run by `commons config check`.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.queue_depth == 0 {
            return Err(NodeError::Config("queue_depth must be positive".into()));
        }
        self.engine_setup().map(|_| ())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            queue_depth: default_queue_depth(),
            admin: String::new(),
            manager_key: String::new(),
            ledger_address: default_ledger_address(),
            coordinator_address: default_coordinator_address(),
            treasury: Amount::ZERO,
            governance: GovernanceParams::default(),
        }
    }
}
