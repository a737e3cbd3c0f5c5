use crate::error::DbError;
use crate::snapshot::Snapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Reminder, StoreError, TaxConfig, TaxRecord, Transaction, UserId};
use dashboard::LedgerSource;
use reminders::ReminderStore;
use std::path::Path;
use tax::TaxStore;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A process-local store backing the ledger, tax and reminder capabilities.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already validated snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Loads `path`, or starts empty when the file does not exist yet.
    pub async fn open(path: &Path) -> Result<Self, DbError> {
        match Snapshot::load(path).await {
            Ok(snapshot) => Ok(Self::from_snapshot(snapshot)),
            Err(DbError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No snapshot found; starting empty.");
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    /// A copy of the current contents.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    pub async fn save(&self, path: &Path) -> Result<(), DbError> {
        self.snapshot().await.save(path).await
    }

    pub async fn add_transaction(&self, transaction: Transaction) -> Result<Transaction, StoreError> {
        if transaction.amount.is_sign_negative() {
            return Err(StoreError::Backend(format!(
                "transaction amount must be non-negative, got {}",
                transaction.amount
            )));
        }
        self.state.write().await.transactions.push(transaction.clone());
        Ok(transaction)
    }
}

#[async_trait]
impl LedgerSource for MemoryStore {
    async fn get_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .transactions
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaxStore for MemoryStore {
    async fn get_tax_config(
        &self,
        user_id: UserId,
        year: i32,
    ) -> Result<Option<TaxConfig>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .tax_configs
            .iter()
            .find(|c| c.user_id == user_id && c.year == year)
            .cloned())
    }

    async fn save_tax_config(&self, config: TaxConfig) -> Result<TaxConfig, StoreError> {
        let mut state = self.state.write().await;
        match state
            .tax_configs
            .iter()
            .position(|c| c.user_id == config.user_id && c.year == config.year)
        {
            Some(index) => state.tax_configs[index] = config.clone(),
            None => state.tax_configs.push(config.clone()),
        }
        Ok(config)
    }

    async fn persist_tax_record(&self, record: TaxRecord) -> Result<TaxRecord, StoreError> {
        self.state.write().await.tax_records.push(record.clone());
        Ok(record)
    }

    async fn find_tax_record(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Option<TaxRecord>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .tax_records
            .iter()
            .find(|r| r.user_id == user_id && r.year == year && r.month == month)
            .cloned())
    }

    async fn list_unpaid(&self, user_id: UserId) -> Result<Vec<TaxRecord>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .tax_records
            .iter()
            .filter(|r| r.user_id == user_id && !r.paid)
            .cloned()
            .collect())
    }

    async fn mark_paid(&self, user_id: UserId, record_id: Uuid) -> Result<TaxRecord, StoreError> {
        let mut state = self.state.write().await;
        let record = state
            .tax_records
            .iter_mut()
            .find(|r| r.id == record_id && r.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        record.paid = true;
        Ok(record.clone())
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn create_reminder(&self, reminder: Reminder) -> Result<Reminder, StoreError> {
        self.state.write().await.reminders.push(reminder.clone());
        Ok(reminder)
    }

    async fn list_pending_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, StoreError> {
        let mut due: Vec<Reminder> = self
            .state
            .read()
            .await
            .reminders
            .iter()
            .filter(|r| r.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|r| r.remind_at);
        Ok(due)
    }

    async fn mark_sent(&self, reminder_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let reminder = state
            .reminders
            .iter_mut()
            .find(|r| r.id == reminder_id)
            .ok_or(StoreError::NotFound)?;
        reminder.sent = true;
        Ok(())
    }

    async fn list_reminders(&self, user_id: UserId) -> Result<Vec<Reminder>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}
