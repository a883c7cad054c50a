// Loan Application Chaincode - Core Library
// Exposes the handler, record codec and ledger gateways for the CLI, server and tests

pub mod access;
pub mod chaincode;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod ledger;
pub mod record;

// Re-export commonly used types
pub use access::{authorize_admin, get_identity_attribute, AuthorizedCaller};
pub use chaincode::LoanChaincode;
pub use config::{ChaincodeConfig, EventPolicy, DEFAULT_ADMIN_ROLE};
pub use dispatch::Function;
pub use error::{ChaincodeError, ChaincodeResult};
pub use events::{LoanEvent, LoanEventType, EVENT_CHANNEL};
pub use ledger::{
    CallerIdentity, EmittedEvent, FaultMode, LedgerError, LedgerStub, MemoryLedger,
    SqliteLedger, SqliteStub, StoredEvent,
};
pub use record::{decode, encode, patch_status, FinancialInfo, LoanApplication, LoanStatus, PersonalInfo};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the fmt log subscriber, honouring RUST_LOG before `default_level`
pub fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // A second install (tests, embedding hosts) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
