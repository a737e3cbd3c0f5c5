use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Direction of a ledger entry.
///
/// Serialized in upper case (`"INCOME"` / `"EXPENSE"`) to match the shape the
/// bookkeeping front-end already stores. Deserialization goes through
/// [`FromStr`], so hand-written ledgers may use any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Income => f.write_str("INCOME"),
            TransactionKind::Expense => f.write_str("EXPENSE"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = CoreError;

    /// Case-insensitive, so `"income"` and `"Income"` are both accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            other => Err(CoreError::InvalidInput(
                "transaction kind".to_string(),
                other.to_string(),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for TransactionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
