// 📄 Loan Application Chaincode - lifecycle handler
//
// Create -> Read -> Update over a single record type keyed by `id`.
// Every call is stateless: all state is read back through the ledger stub,
// and nothing is cached between invocations.
//
// Read-modify-write on Update has no compare-and-swap; concurrent updates to
// one key rely on the host serializing transactions.

use tracing::Span;

use crate::access::authorize_admin;
use crate::config::{ChaincodeConfig, EventPolicy};
use crate::dispatch::Function;
use crate::error::{ChaincodeError, ChaincodeResult};
use crate::events::LoanEvent;
use crate::ledger::LedgerStub;
use crate::record::{decode, patch_status, LoanStatus};

pub struct LoanChaincode {
    config: ChaincodeConfig,
    /// Logging capability handed in at construction; every record is emitted inside it
    span: Span,
}

impl LoanChaincode {
    pub fn new(config: ChaincodeConfig) -> Self {
        let span = tracing::info_span!("loan_chaincode");
        Self::with_span(config, span)
    }

    pub fn with_span(config: ChaincodeConfig, span: Span) -> Self {
        Self { config, span }
    }

    // ========================================================================
    // HOST ENTRY POINTS
    // ========================================================================

    /// Instantiation hook; nothing to set up
    pub fn init(&self, _stub: &mut dyn LedgerStub, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let _entered = self.span.enter();
        tracing::debug!(function, args = args.len(), "init");
        Ok(Vec::new())
    }

    /// Transaction path: every function is allowed
    pub fn invoke(&self, stub: &mut dyn LedgerStub, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let _entered = self.span.enter();
        let function = function.parse::<Function>().map_err(|e| {
            tracing::error!(error = %e, "rejected invocation");
            e
        })?;

        match function {
            Function::CreateLoanApplication => self.create_loan_application(stub, args),
            Function::GetLoanApplication => self.get_loan_application(stub, args),
            Function::UpdateLoanApplication => self.update_loan_application(stub, args),
        }
    }

    /// Query path: read-only functions only
    pub fn query(&self, stub: &dyn LedgerStub, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let _entered = self.span.enter();
        let function = function.parse::<Function>()?;

        if function.is_mutation() {
            tracing::error!(%function, "mutation attempted on query path");
            return Err(ChaincodeError::NotAQuery(function.name().to_string()));
        }

        self.get_loan_application(stub, args)
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Store a new application under `args[0]`; admin role required
    ///
    /// The caller's bytes are stored verbatim so Read returns exactly what was
    /// submitted. With `validate_on_create` they must decode as a record whose
    /// `id` (if present) matches the key.
    fn create_loan_application(&self, stub: &mut dyn LedgerStub, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        tracing::debug!("Entering CreateLoanApplication");

        if args.len() < 2 {
            tracing::error!(args = args.len(), "Invalid number of args");
            return Err(ChaincodeError::invalid_arguments("Expected at least 2 arguments"));
        }

        let loan_app_id = require_id(&args[0])?;
        let loan_app_input = &args[1];

        let caller = authorize_admin(stub, &self.config.admin_role).map_err(|e| {
            tracing::error!(error = %e, "Create rejected");
            e
        })?;

        if self.config.validate_on_create {
            let record = decode(loan_app_input.as_bytes()).map_err(|e| {
                tracing::error!(id = loan_app_id, error = %e, "Loan application input does not decode");
                e
            })?;

            if !record.id.is_empty() && record.id != loan_app_id {
                tracing::error!(id = loan_app_id, record_id = %record.id, "Record id does not match key");
                return Err(ChaincodeError::invalid_arguments(format!(
                    "record id {} does not match key {}",
                    record.id, loan_app_id
                )));
            }
        }

        stub.put_state(loan_app_id, loan_app_input.as_bytes()).map_err(|e| {
            tracing::error!(id = loan_app_id, error = %e, "Could not save loan application to ledger");
            ChaincodeError::from(e)
        })?;

        self.emit(stub, &LoanEvent::creation(loan_app_id))?;

        tracing::info!(id = loan_app_id, username = %caller.username, role = %caller.role, "Successfully saved loan application");
        Ok(Vec::new())
    }

    /// Stored bytes for `args[0]`, returned without decoding
    fn get_loan_application(&self, stub: &dyn LedgerStub, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        tracing::debug!("Entering GetLoanApplication");

        if args.len() != 1 {
            tracing::error!(args = args.len(), "Invalid number of arguments");
            return Err(ChaincodeError::invalid_arguments(if args.is_empty() {
                "Missing loan application ID"
            } else {
                "Expected exactly 1 argument"
            }));
        }

        let loan_app_id = require_id(&args[0])?;

        stub.get_state(loan_app_id).map_err(|e| {
            tracing::error!(id = loan_app_id, error = %e, "Could not fetch loan application from ledger");
            ChaincodeError::from(e)
        })
    }

    /// Set `status` on the record under `args[0]`, leaving every other field alone
    fn update_loan_application(&self, stub: &mut dyn LedgerStub, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        tracing::debug!("Entering UpdateLoanApplication");

        if args.len() < 2 {
            tracing::error!(args = args.len(), "Invalid number of args");
            return Err(ChaincodeError::invalid_arguments(
                "Expected at least 2 arguments for loan application update",
            ));
        }

        let loan_app_id = require_id(&args[0])?;
        let status = &args[1];

        let la_bytes = stub.get_state(loan_app_id).map_err(|e| {
            tracing::error!(id = loan_app_id, error = %e, "Could not fetch loan application from ledger");
            ChaincodeError::from(e)
        })?;

        if LoanStatus::parse(status).is_none() {
            tracing::warn!(id = loan_app_id, status = %status, "Status is not a known review state");
        }

        let last_modified = if self.config.stamp_last_modified {
            stub.tx_timestamp().map(|ts| ts.to_rfc3339())
        } else {
            None
        };

        let la_bytes = patch_status(&la_bytes, status, last_modified).map_err(|e| {
            tracing::error!(id = loan_app_id, error = %e, "Stored loan application does not decode");
            e
        })?;

        stub.put_state(loan_app_id, &la_bytes).map_err(|e| {
            tracing::error!(id = loan_app_id, error = %e, "Could not save loan application post update");
            ChaincodeError::from(e)
        })?;

        self.emit(stub, &LoanEvent::update(loan_app_id))?;

        tracing::info!(id = loan_app_id, status = %status, "Successfully updated loan application");
        Ok(Vec::new())
    }

    /// Publish a lifecycle notice after a committed write
    fn emit(&self, stub: &mut dyn LedgerStub, event: &LoanEvent) -> ChaincodeResult<()> {
        let payload = event.to_bytes()?;

        match stub.set_event(&self.config.event_channel, &payload) {
            Ok(()) => Ok(()),
            Err(e) => match self.config.event_policy {
                EventPolicy::BestEffort => {
                    tracing::warn!(
                        event = event.event_type.as_str(),
                        error = %e,
                        "Event emission failed; record already written"
                    );
                    Ok(())
                }
                EventPolicy::Strict => {
                    tracing::error!(event = event.event_type.as_str(), error = %e, "Event emission failed");
                    Err(ChaincodeError::WriteFailed(e.to_string()))
                }
            },
        }
    }
}

impl Default for LoanChaincode {
    fn default() -> Self {
        Self::new(ChaincodeConfig::default())
    }
}

fn require_id(id: &str) -> ChaincodeResult<&str> {
    if id.is_empty() {
        tracing::error!("Empty loan application ID");
        return Err(ChaincodeError::invalid_arguments("Loan application ID must not be empty"));
    }
    Ok(id)
}

// ============================================================================
// TESTS
// ============================================================================
