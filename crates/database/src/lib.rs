//! # BizPilot Database Crate
//!
//! An in-memory implementation of every storage capability the workspace
//! declares, persisted as a single JSON snapshot.
//!
//! ## Architectural Principles
//!
//! - **Adapter only:** the traits belong to their consumers
//!   ([`dashboard::LedgerSource`], [`tax::TaxStore`], [`reminders::ReminderStore`]);
//!   this crate only implements them. Swapping in a real database means writing
//!   another adapter, not touching the services.
//! - **Shared state behind async locks:** one [`MemoryStore`] can back the
//!   dashboard, the tax calculator and the reminder scheduler at the same time.
//!
//! ## Public API
//!
//! - [`MemoryStore`]: the store, with `open`/`save` for snapshot files.
//! - [`SnapshotFileStore`]: a reminder store that re-reads and re-writes the
//!   snapshot file on every call, for long-running schedulers.
//! - [`Snapshot`]: the serializable contents of a store.
//! - [`DbError`]: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod file;
pub mod memory;
pub mod snapshot;

// Re-export the key components to create a clean, public-facing API.
pub use error::DbError;
pub use file::SnapshotFileStore;
pub use memory::MemoryStore;
pub use snapshot::Snapshot;
