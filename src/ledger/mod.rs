// Ledger Gateway - the narrow stub the host ledger exposes to chaincode
//
// The core consumes state get/put, event emission and credential attributes.
// Consensus, persistence and endorsement live on the host side.

pub mod memory;
pub mod sqlite;

pub use memory::{EmittedEvent, FaultMode, MemoryLedger};
pub use sqlite::{SqliteLedger, SqliteStub, StoredEvent};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Gateway failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no state stored under key {0}")]
    NotFound(String),

    #[error("{0}")]
    ReadFailed(String),

    #[error("{0}")]
    WriteFailed(String),

    #[error("attribute {0} not present in caller certificate")]
    AttributeNotFound(String),
}

/// Host ledger operations available to one invocation
///
/// Only single-key atomicity is assumed. Concurrent invocations on the same
/// key are linearized by the host, not by implementors of this trait.
pub trait LedgerStub {
    /// Fetch the value under `key`; absent or empty values are `NotFound`
    fn get_state(&self, key: &str) -> Result<Vec<u8>, LedgerError>;

    /// Store `value` under `key`, replacing any previous value
    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError>;

    /// Publish a notification event on `channel`
    fn set_event(&mut self, channel: &str, payload: &[u8]) -> Result<(), LedgerError>;

    /// Read a named attribute from the caller's certificate
    fn read_cert_attribute(&self, name: &str) -> Result<Vec<u8>, LedgerError>;

    /// Transaction timestamp assigned by the host, when it provides one
    fn tx_timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

// ============================================================================
// CALLER IDENTITY
// ============================================================================

/// Attributes embedded in the caller's certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub attributes: BTreeMap<String, String>,
}

impl CallerIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity carrying the `username` and `role` attributes
    pub fn with_role(username: &str, role: &str) -> Self {
        Self::new()
            .attribute("username", username)
            .attribute("role", role)
    }

    /// Builder-style attribute insert
    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Attribute lookup with the gateway's error contract
    pub fn lookup(&self, name: &str) -> Result<Vec<u8>, LedgerError> {
        self.attributes
            .get(name)
            .map(|v| v.as_bytes().to_vec())
            .ok_or_else(|| LedgerError::AttributeNotFound(name.to_string()))
    }
}
