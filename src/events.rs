// Lifecycle notices published on the event channel after a mutation

use serde::{Deserialize, Serialize};

use crate::error::{ChaincodeError, ChaincodeResult};

/// Default channel name the host listens on
pub const EVENT_CHANNEL: &str = "evtSender";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanEventType {
    #[serde(rename = "loanApplicationCreation")]
    Creation,
    #[serde(rename = "loanApplicationUpdate")]
    Update,
}

impl LoanEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanEventType::Creation => "loanApplicationCreation",
            LoanEventType::Update => "loanApplicationUpdate",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            LoanEventType::Creation => "created",
            LoanEventType::Update => "updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanEvent {
    #[serde(rename = "type")]
    pub event_type: LoanEventType,
    pub description: String,
}

impl LoanEvent {
    pub fn creation(id: &str) -> Self {
        Self::new(LoanEventType::Creation, id)
    }

    pub fn update(id: &str) -> Self {
        Self::new(LoanEventType::Update, id)
    }

    fn new(event_type: LoanEventType, id: &str) -> Self {
        Self {
            description: format!("{} Successfully {}", id, event_type.verb()),
            event_type,
        }
    }

    pub fn to_bytes(&self) -> ChaincodeResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ChaincodeError::WriteFailed(e.to_string()))
    }
}
