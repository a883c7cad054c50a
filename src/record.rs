// 🏠 Loan Application Record - JSON codec for the ledger value
//
// Identity: `id` (the ledger key, never changes once created)
// Values: everything else, including the embedded personal and financial info
//
// Field names on the wire are case-preserving and match the records already
// on the ledger. Missing and `null` fields decode to zero/empty. Status patches
// go through the raw JSON document so unknown fields, key order and number
// precision survive the rewrite.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ChaincodeError, ChaincodeResult};

// ============================================================================
// LOAN STATUS
// ============================================================================

/// Known review states. The record stores status as a free string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Submitted => "Submitted",
            LoanStatus::UnderReview => "UnderReview",
            LoanStatus::Approved => "Approved",
            LoanStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Submitted" => Some(LoanStatus::Submitted),
            "UnderReview" | "Under Review" => Some(LoanStatus::UnderReview),
            "Approved" => Some(LoanStatus::Approved),
            "Rejected" => Some(LoanStatus::Rejected),
            _ => None,
        }
    }
}

// ============================================================================
// EMBEDDED VALUE OBJECTS
// ============================================================================

/// `null` decodes like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    #[serde(rename = "firstname")]
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,

    #[serde(rename = "lastname")]
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,

    #[serde(rename = "DOB")]
    #[serde(deserialize_with = "null_as_default")]
    pub date_of_birth: String,

    #[serde(deserialize_with = "null_as_default")]
    pub email: String,

    #[serde(deserialize_with = "null_as_default")]
    pub mobile: String,
}

/// Monthly figures supplied by the applicant. Units are not fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_salary: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_rent: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub other_expenditure: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_loan_payment: i64,
}

// ============================================================================
// LOAN APPLICATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanApplication {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(rename = "PropertyID")]
    #[serde(deserialize_with = "null_as_default")]
    pub property_id: String,

    #[serde(rename = "LandID")]
    #[serde(deserialize_with = "null_as_default")]
    pub land_id: String,

    #[serde(rename = "PermitID")]
    #[serde(deserialize_with = "null_as_default")]
    pub permit_id: String,

    #[serde(rename = "BuyerID")]
    #[serde(deserialize_with = "null_as_default")]
    pub buyer_id: String,

    #[serde(rename = "SalesContractID")]
    #[serde(deserialize_with = "null_as_default")]
    pub sales_contract_id: String,

    #[serde(rename = "personalInfo")]
    #[serde(deserialize_with = "null_as_default")]
    pub personal_info: PersonalInfo,

    #[serde(rename = "financialInfo")]
    #[serde(deserialize_with = "null_as_default")]
    pub financial_info: FinancialInfo,

    #[serde(deserialize_with = "null_as_default")]
    pub status: String,

    #[serde(rename = "requestedAmount")]
    #[serde(deserialize_with = "null_as_default")]
    pub requested_amount: i64,

    #[serde(rename = "fairMarketValue")]
    #[serde(deserialize_with = "null_as_default")]
    pub fair_market_value: i64,

    #[serde(rename = "approvedAmount")]
    #[serde(deserialize_with = "null_as_default")]
    pub approved_amount: i64,

    /// Set by the review workflow, outside this chaincode
    #[serde(rename = "ReviewerID")]
    #[serde(deserialize_with = "null_as_default")]
    pub reviewer_id: String,

    #[serde(rename = "lastModifiedDate")]
    #[serde(deserialize_with = "null_as_default")]
    pub last_modified_date: String,
}

impl LoanApplication {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// Status as a known state, if it is one
    pub fn status_kind(&self) -> Option<LoanStatus> {
        LoanStatus::parse(&self.status)
    }
}

/// Serialize a record to its ledger bytes
pub fn encode(record: &LoanApplication) -> ChaincodeResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(ChaincodeError::from)
}

/// Parse ledger bytes into a record
pub fn decode(bytes: &[u8]) -> ChaincodeResult<LoanApplication> {
    serde_json::from_slice(bytes).map_err(ChaincodeError::from)
}

/// Rewrite `status` (and optionally `lastModifiedDate`) in stored record bytes
///
/// The bytes must decode as a record. Every other key is written back as it
/// was read, in the same order and with the same number text.
pub fn patch_status(
    bytes: &[u8],
    status: &str,
    last_modified: Option<String>,
) -> ChaincodeResult<Vec<u8>> {
    decode(bytes)?;

    let mut document: serde_json::Value = serde_json::from_slice(bytes)?;
    let fields = document
        .as_object_mut()
        .ok_or_else(|| ChaincodeError::MalformedRecord("record is not a JSON object".to_string()))?;

    fields.insert("status".to_string(), serde_json::Value::from(status));
    if let Some(ts) = last_modified {
        fields.insert("lastModifiedDate".to_string(), serde_json::Value::from(ts));
    }

    serde_json::to_vec(&document).map_err(ChaincodeError::from)
}

// ============================================================================
// TESTS
// ============================================================================
