use crate::error::DbError;
use core_types::{Reminder, TaxConfig, TaxRecord, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Everything a [`crate::MemoryStore`] holds, in the shape written to disk.
///
/// Every section may be omitted from the file, so a hand-written ledger can be
/// just `{"transactions": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub tax_configs: Vec<TaxConfig>,
    #[serde(default)]
    pub tax_records: Vec<TaxRecord>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl Snapshot {
    /// Reads and validates a snapshot file.
    pub async fn load(path: &Path) -> Result<Self, DbError> {
        let raw = tokio::fs::read(path).await?;
        let snapshot: Snapshot = serde_json::from_slice(&raw)?;
        snapshot.validate()?;
        tracing::debug!(
            path = %path.display(),
            transactions = snapshot.transactions.len(),
            tax_records = snapshot.tax_records.len(),
            reminders = snapshot.reminders.len(),
            "Loaded snapshot."
        );
        Ok(snapshot)
    }

    /// Writes the snapshot as pretty JSON, replacing the file in one rename.
    pub async fn save(&self, path: &Path) -> Result<(), DbError> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::debug!(path = %path.display(), "Saved snapshot.");
        Ok(())
    }

    /// Rejects data no store operation could have produced.
    pub fn validate(&self) -> Result<(), DbError> {
        if let Some(tx) = self.transactions.iter().find(|tx| tx.amount.is_sign_negative()) {
            return Err(DbError::InvalidSnapshot(format!(
                "transaction {} has a negative amount",
                tx.id
            )));
        }
        if let Some(r) = self.tax_records.iter().find(|r| !(1..=12).contains(&r.month)) {
            return Err(DbError::InvalidSnapshot(format!(
                "tax record {} has month {}",
                r.id, r.month
            )));
        }
        ensure_unique("transaction", self.transactions.iter().map(|tx| tx.id))?;
        ensure_unique("tax record", self.tax_records.iter().map(|r| r.id))?;
        ensure_unique("reminder", self.reminders.iter().map(|r| r.id))?;
        Ok(())
    }
}

fn ensure_unique(kind: &str, ids: impl Iterator<Item = Uuid>) -> Result<(), DbError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DbError::InvalidSnapshot(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(())
}
