// Invocable functions - closed set, resolved from the host's function name

use std::fmt;
use std::str::FromStr;

use crate::error::ChaincodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    CreateLoanApplication,
    GetLoanApplication,
    UpdateLoanApplication,
}

/// Host-facing name for every function
const FUNCTION_TABLE: &[(&str, Function)] = &[
    ("CreateLoanApplication", Function::CreateLoanApplication),
    ("GetLoanApplication", Function::GetLoanApplication),
    ("UpdateLoanApplication", Function::UpdateLoanApplication),
];

impl Function {
    pub fn all() -> impl Iterator<Item = Function> {
        FUNCTION_TABLE.iter().map(|(_, f)| *f)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::CreateLoanApplication => "CreateLoanApplication",
            Function::GetLoanApplication => "GetLoanApplication",
            Function::UpdateLoanApplication => "UpdateLoanApplication",
        }
    }

    /// Whether the function writes to the ledger
    pub fn is_mutation(&self) -> bool {
        match self {
            Function::CreateLoanApplication | Function::UpdateLoanApplication => true,
            Function::GetLoanApplication => false,
        }
    }
}

impl FromStr for Function {
    type Err = ChaincodeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        FUNCTION_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or_else(|| ChaincodeError::UnknownFunction(name.to_string()))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
