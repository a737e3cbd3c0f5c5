use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Reminder, StoreError, UserId};
use uuid::Uuid;

/// Storage capability for reminders.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn create_reminder(&self, reminder: Reminder) -> Result<Reminder, StoreError>;

    /// Reminders with `sent == false` and `remind_at <= now`.
    async fn list_pending_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, StoreError>;

    /// Flags a reminder as sent. Marking an already sent reminder is not an error.
    async fn mark_sent(&self, reminder_id: Uuid) -> Result<(), StoreError>;

    async fn list_reminders(&self, user_id: UserId) -> Result<Vec<Reminder>, StoreError>;
}
