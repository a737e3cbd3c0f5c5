use crate::error::DbError;
use crate::memory::MemoryStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Reminder, StoreError, UserId};
use reminders::ReminderStore;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

/// A [`ReminderStore`] that reads the snapshot file on every call and writes
/// it back after every change.
///
/// A long-running scheduler over this store sees reminders other processes
/// add to the file, and its sent flags survive a crash. Writes from this
/// instance are serialized; a write from another process between our read and
/// our rename is lost.
#[derive(Debug)]
pub struct SnapshotFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<MemoryStore, StoreError> {
        MemoryStore::open(&self.path).await.map_err(backend)
    }

    async fn persist(&self, store: &MemoryStore) -> Result<(), StoreError> {
        store.save(&self.path).await.map_err(backend)
    }
}

fn backend(e: DbError) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl ReminderStore for SnapshotFileStore {
    async fn create_reminder(&self, reminder: Reminder) -> Result<Reminder, StoreError> {
        let _guard = self.write_lock.lock().await;
        let store = self.load().await?;
        let reminder = store.create_reminder(reminder).await?;
        self.persist(&store).await?;
        Ok(reminder)
    }

    async fn list_pending_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, StoreError> {
        self.load().await?.list_pending_reminders(now).await
    }

    async fn mark_sent(&self, reminder_id: Uuid) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let store = self.load().await?;
        store.mark_sent(reminder_id).await?;
        self.persist(&store).await?;
        tracing::debug!(%reminder_id, path = %self.path.display(), "Recorded sent reminder.");
        Ok(())
    }

    async fn list_reminders(&self, user_id: UserId) -> Result<Vec<Reminder>, StoreError> {
        self.load().await?.list_reminders(user_id).await
    }
}
