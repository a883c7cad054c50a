// Chaincode Configuration
//
// Loaded from an optional JSON file; every field has a default so an empty
// object (or no file at all) gives the stock loan-application behaviour.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::events::EVENT_CHANNEL;

/// Role allowed to create loan applications
pub const DEFAULT_ADMIN_ROLE: &str = "Bank_Home_Loan_Admin";

/// What to do when event emission fails after the record was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPolicy {
    /// Log a warning and report success; the write stands
    BestEffort,
    /// Report `WriteFailed`; the write still stands
    Strict,
}

impl Default for EventPolicy {
    fn default() -> Self {
        Self::BestEffort
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaincodeConfig {
    /// Value of the `role` attribute required for Create
    pub admin_role: String,

    /// Channel lifecycle notices are published on
    pub event_channel: String,

    pub event_policy: EventPolicy,

    /// Reject Create when the supplied bytes do not decode as a record
    pub validate_on_create: bool,

    /// Write the host transaction timestamp into `lastModifiedDate` on Update
    pub stamp_last_modified: bool,

    /// Default filter for the log subscriber when RUST_LOG is unset
    pub log_level: String,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            admin_role: DEFAULT_ADMIN_ROLE.to_string(),
            event_channel: EVENT_CHANNEL.to_string(),
            event_policy: EventPolicy::default(),
            validate_on_create: true,
            stamp_last_modified: false,
            log_level: "debug".to_string(),
        }
    }
}

impl ChaincodeConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_json_str(&raw).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: ChaincodeConfig =
            serde_json::from_str(raw).context("Failed to parse chaincode config")?;
        Ok(config)
    }

    /// Config from `path` if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }
}
