use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::enums::TransactionKind;

/// Identifier of the user owning a ledger. Assigned by the surrounding application.
pub type UserId = i64;

fn default_currency() -> String {
    "BDT".to_string()
}

/// A single dated ledger entry.
///
/// `amount` is always non-negative; the sign comes from `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Generated when a hand-written ledger leaves it out.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Transaction {
    /// Creates a new transaction with a fresh id and the default currency.
    pub fn new(
        user_id: UserId,
        kind: TransactionKind,
        amount: Decimal,
        date: NaiveDate,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            currency: default_currency(),
            date,
            category: category.into(),
            description: None,
        }
    }

    /// The amount with the sign of its kind: positive for income, negative for expense.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }
}

/// Net value (income minus expense) of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub value: Decimal,
}

impl MonthlyPoint {
    /// The first day of the month this point covers.
    pub fn month_start(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

/// The pair of rates applied to a taxable base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRates {
    pub vat_rate: Decimal,
    pub tax_rate: Decimal,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            vat_rate: dec!(0.15),
            tax_rate: dec!(0.0),
        }
    }
}

/// A per-(user, year) override of the default tax rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    pub user_id: UserId,
    pub year: i32,
    pub vat_rate: Decimal,
    pub tax_rate: Decimal,
    /// Free-form named thresholds kept alongside the rates. Not applied by the calculator.
    #[serde(default)]
    pub thresholds: HashMap<String, Decimal>,
}

impl TaxConfig {
    pub fn rates(&self) -> TaxRates {
        TaxRates {
            vat_rate: self.vat_rate,
            tax_rate: self.tax_rate,
        }
    }
}

/// A computed tax liability for one user-month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    pub taxable_amount: Decimal,
    pub vat_amount: Decimal,
    pub tax_amount: Decimal,
    pub payable: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid: bool,
    pub generated_at: DateTime<Utc>,
}

/// A request to be reminded about a related record at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    pub user_id: UserId,
    /// What kind of record the reminder points at, e.g. `"tax"`.
    pub related_type: String,
    pub related_id: Uuid,
    pub remind_at: DateTime<Utc>,
}

/// A stored reminder. `sent` flips from `false` to `true` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: UserId,
    pub related_type: String,
    pub related_id: Uuid,
    pub remind_at: DateTime<Utc>,
    #[serde(default)]
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    /// Materializes a pending reminder from a scheduling request.
    pub fn from_request(request: NewReminder, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            related_type: request.related_type,
            related_id: request.related_id,
            remind_at: request.remind_at,
            sent: false,
            created_at,
        }
    }

    /// True when the reminder is still pending and its time has come.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.sent && self.remind_at <= now
    }
}
