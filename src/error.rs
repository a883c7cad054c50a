// Chaincode Error Types
// Every failure aborts the current invocation and is handed back to the host.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors surfaced to the host runtime as the terminal result of an invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChaincodeError {
    /// Wrong argument count or empty key
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Caller does not hold the admin role
    #[error("{username} with role {role} does not have correct permissions")]
    PermissionDenied { username: String, role: String },

    /// Credential attribute could not be read
    #[error("Couldn't get attribute {name}. Error: {cause}")]
    AttributeUnavailable { name: String, cause: String },

    /// Stored or supplied bytes are not a loan application
    #[error("Malformed loan application record: {0}")]
    MalformedRecord(String),

    /// No record under the key
    #[error("Loan application not found: {0}")]
    NotFound(String),

    #[error("Could not read from ledger: {0}")]
    ReadFailed(String),

    #[error("Could not write to ledger: {0}")]
    WriteFailed(String),

    /// Function name outside the dispatch table
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Mutating function invoked on the query path
    #[error("Function {0} modifies the ledger and cannot be run as a query")]
    NotAQuery(String),
}

/// Chaincode result type
pub type ChaincodeResult<T> = Result<T, ChaincodeError>;

impl ChaincodeError {
    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            ChaincodeError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            ChaincodeError::PermissionDenied { .. } => "PERMISSION_DENIED",
            ChaincodeError::AttributeUnavailable { .. } => "ATTRIBUTE_UNAVAILABLE",
            ChaincodeError::MalformedRecord(_) => "MALFORMED_RECORD",
            ChaincodeError::NotFound(_) => "NOT_FOUND",
            ChaincodeError::ReadFailed(_) => "READ_FAILED",
            ChaincodeError::WriteFailed(_) => "WRITE_FAILED",
            ChaincodeError::UnknownFunction(_) => "UNKNOWN_FUNCTION",
            ChaincodeError::NotAQuery(_) => "NOT_A_QUERY",
        }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        ChaincodeError::InvalidArguments(message.into())
    }
}

impl From<LedgerError> for ChaincodeError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(key) => ChaincodeError::NotFound(key),
            LedgerError::ReadFailed(msg) => ChaincodeError::ReadFailed(msg),
            LedgerError::WriteFailed(msg) => ChaincodeError::WriteFailed(msg),
            LedgerError::AttributeNotFound(name) => ChaincodeError::AttributeUnavailable {
                cause: format!("attribute {} not present in caller certificate", name),
                name,
            },
        }
    }
}

impl From<serde_json::Error> for ChaincodeError {
    fn from(err: serde_json::Error) -> Self {
        ChaincodeError::MalformedRecord(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
