// Access Check - certificate attributes and the admin gate
//
// Attributes come straight from the ledger stub on every call; nothing is
// cached and the attribute format is not checked.

use crate::error::{ChaincodeError, ChaincodeResult};
use crate::ledger::LedgerStub;

pub const USERNAME_ATTRIBUTE: &str = "username";
pub const ROLE_ATTRIBUTE: &str = "role";

/// Read a named attribute from the caller's certificate as a string
pub fn get_identity_attribute(
    stub: &dyn LedgerStub,
    attribute_name: &str,
) -> ChaincodeResult<String> {
    tracing::debug!(attribute = attribute_name, "Entering get_identity_attribute");

    let raw = stub
        .read_cert_attribute(attribute_name)
        .map_err(|e| ChaincodeError::AttributeUnavailable {
            name: attribute_name.to_string(),
            cause: e.to_string(),
        })?;

    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Caller that passed the admin gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedCaller {
    pub username: String,
    pub role: String,
}

/// Require the caller's `role` attribute to equal `admin_role`
///
/// An unreadable attribute counts as a mismatch; the denial message carries
/// whatever username and role could be read (empty when unavailable).
pub fn authorize_admin(stub: &dyn LedgerStub, admin_role: &str) -> ChaincodeResult<AuthorizedCaller> {
    let username = get_identity_attribute(stub, USERNAME_ATTRIBUTE).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "caller username unavailable");
        String::new()
    });

    let role = match get_identity_attribute(stub, ROLE_ATTRIBUTE) {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!(error = %e, "caller role unavailable");
            String::new()
        }
    };

    if !role.is_empty() && role == admin_role {
        Ok(AuthorizedCaller { username, role })
    } else {
        Err(ChaincodeError::PermissionDenied { username, role })
    }
}
