use crate::error::ReminderError;
use crate::store::ReminderStore;
use alerter::Notifier;
use chrono::{DateTime, Utc};
use core_types::{NewReminder, Reminder, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Fires reminders whose time has come.
///
/// Every tick lists pending reminders, delivers each through the [`Notifier`] and
/// only then marks it sent. A crash between the two steps means the reminder is
/// delivered again on the next tick: delivery is at-least-once, never lost.
pub struct ReminderScheduler {
    store: Arc<dyn ReminderStore>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    /// Serializes ticks, whether they come from the background loop or a caller.
    tick_lock: Mutex<()>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            interval,
            tick_lock: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stores a new pending reminder.
    pub async fn schedule(&self, request: NewReminder) -> Result<Reminder, ReminderError> {
        if request.related_type.trim().is_empty() {
            return Err(ReminderError::InvalidRequest(
                "related_type must not be empty".to_string(),
            ));
        }
        let reminder = self
            .store
            .create_reminder(Reminder::from_request(request, Utc::now()))
            .await?;
        tracing::info!(
            reminder_id = %reminder.id,
            user_id = reminder.user_id,
            remind_at = %reminder.remind_at,
            "Reminder scheduled."
        );
        Ok(reminder)
    }

    pub async fn reminders_for(&self, user_id: UserId) -> Result<Vec<Reminder>, ReminderError> {
        Ok(self.store.list_reminders(user_id).await?)
    }

    /// Runs one scan-and-deliver pass and returns how many reminders were delivered.
    ///
    /// A failed delivery leaves its reminder pending for the next tick and does not
    /// stop the others. Only a failure to list pending reminders is returned as an
    /// error.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<usize, ReminderError> {
        let _tick = self.tick_lock.lock().await;

        let pending = self.store.list_pending_reminders(now).await?;
        let mut fired = 0;

        for reminder in pending.iter().filter(|r| r.is_due(now)) {
            if let Err(e) = self.notifier.deliver(reminder).await {
                tracing::warn!(
                    reminder_id = %reminder.id,
                    error = %e,
                    "Reminder delivery failed; will retry next tick."
                );
                continue;
            }
            fired += 1;

            if let Err(e) = self.store.mark_sent(reminder.id).await {
                tracing::error!(
                    reminder_id = %reminder.id,
                    error = %e,
                    "Delivered reminder could not be marked sent; it will fire again."
                );
            }
        }

        if !pending.is_empty() {
            tracing::info!(pending = pending.len(), fired, "Reminder tick complete.");
        }
        Ok(fired)
    }

    /// Starts the background loop on the current tokio runtime.
    ///
    /// The first tick runs immediately. A tick that overruns the interval delays
    /// the next one instead of stacking.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(interval = ?self.interval, "Reminder scheduler started.");
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                // Fires on an explicit stop and when the handle is dropped.
                // Checked first so a pending stop wins over a ready tick.
                _ = shutdown.changed() => break,
                _ = timer.tick() => {}
            }

            if let Err(e) = self.run_tick(Utc::now()).await {
                tracing::error!(error = %e, "Reminder tick failed.");
            }
        }

        tracing::info!("Reminder scheduler stopped.");
    }
}

/// Owner of a running scheduler loop.
///
/// Dropping the handle also stops the loop after its current tick.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops scheduling new ticks and waits for an in-flight tick to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Reminder scheduler task ended abnormally.");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
