//! # BizPilot Alerter
//!
//! Delivery channels for due reminders. The scheduler only sees the [`Notifier`]
//! trait; which channel sits behind it is decided by the binary.
//!
//! A channel is responsible for bounding its own latency: a stalled delivery must
//! fail rather than hold up the scheduler's tick.

use crate::error::AlerterError;
use async_trait::async_trait;
use configuration::TelegramConfig;
use core_types::Reminder;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
pub mod error;

/// Something that can tell a user about a reminder.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, reminder: &Reminder) -> Result<(), AlerterError>;
}

/// Writes each reminder to the log. The default channel when no real one is set up.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, reminder: &Reminder) -> Result<(), AlerterError> {
        tracing::info!(
            reminder_id = %reminder.id,
            user_id = reminder.user_id,
            related_type = %reminder.related_type,
            related_id = %reminder.related_id,
            remind_at = %reminder.remind_at,
            "Sending reminder."
        );
        Ok(())
    }
}

/// Keeps every delivered reminder in memory. Useful for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<Reminder>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn delivered(&self) -> Vec<Reminder> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, reminder: &Reminder) -> Result<(), AlerterError> {
        self.delivered.lock().await.push(reminder.clone());
        Ok(())
    }
}

/// The JSON payload for the Telegram `sendMessage` endpoint.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str, // To allow for formatting like bold, italics etc.
}

/// A client for sending reminder messages to the Telegram Bot API.
pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a new `TelegramNotifier`.
    ///
    /// Returns `None` if the token or chat_id is missing from the configuration,
    /// allowing the system to fall back to another channel.
    pub fn new(config: &TelegramConfig) -> Option<Self> {
        if config.token.is_empty() || config.chat_id.is_empty() {
            tracing::warn!("Telegram notifier is not configured (missing token or chat_id).");
            return None;
        }
        let client = match Client::builder().timeout(config.timeout).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build the Telegram HTTP client.");
                return None;
            }
        };
        Some(Self {
            client,
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Sends a text message to the configured Telegram chat.
    pub async fn send_message(&self, message: &str) -> Result<(), AlerterError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "MarkdownV2",
        };

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlerterError::ApiError(error_text));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, reminder: &Reminder) -> Result<(), AlerterError> {
        self.send_message(&format_reminder(reminder)).await
    }
}

/// Renders a reminder as a MarkdownV2 message.
pub fn format_reminder(reminder: &Reminder) -> String {
    format!(
        "⏰ *Reminder*: {} `{}`\nUser {} · due {}",
        escape_markdown(&reminder.related_type),
        reminder.related_id,
        reminder.user_id,
        escape_markdown(&reminder.remind_at.format("%Y-%m-%d %H:%M UTC").to_string()),
    )
}

/// Escapes characters that have special meaning in Telegram's MarkdownV2.
fn escape_markdown(text: &str) -> String {
    let special_chars = r"_*[]()~`>#+-=|{}.!";
    special_chars
        .chars()
        .fold(text.to_string(), |s, c| s.replace(c, &format!("\\{}", c)))
}
