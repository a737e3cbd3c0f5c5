//! # BizPilot Reminders
//!
//! A periodic scheduler that delivers due reminders.
//!
//! ## Architectural Principles
//!
//! - **Single owner:** one spawned task drives the interval loop. Ticks never
//!   overlap; a slow tick pushes the next one back.
//! - **At-least-once:** a reminder is marked sent only after its delivery
//!   succeeds. Failed deliveries stay pending and are retried on the next tick.
//! - **Capabilities in, not globals:** storage and delivery arrive as
//!   [`ReminderStore`] and [`alerter::Notifier`] trait objects.
//!
//! ## Public API
//!
//! - [`ReminderScheduler`]: `schedule`, `run_tick` and `spawn`.
//! - [`SchedulerHandle`]: stops a spawned scheduler.

pub mod error;
pub mod scheduler;
pub mod store;

// Re-export the main types for convenience.
pub use error::ReminderError;
pub use scheduler::{ReminderScheduler, SchedulerHandle};
pub use store::ReminderStore;
