//! # flowsmith-store
//!
//! Storage engine for Flowsmith.
//!
//! Provides SQLite-backed persistence in WAL mode, a small key-value table
//! for state that must survive restarts, and the usage counters shown to
//! the user.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  UsageStore  (generated / successful)   │
//! ├─────────────────────────────────────────┤
//! │  KvStore     (string key → JSON text)   │
//! ├─────────────────────────────────────────┤
//! │  Database (rusqlite WAL, kv_state)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use flowsmith_store::{Database, UsageStore};
//!
//! let db = Database::open("data/flowsmith.db").await?;
//! let usage = UsageStore::new(db);
//! let stats = usage.record(true).await?;
//! ```

pub mod db;
pub mod error;
pub mod kv;
pub mod usage;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::{Database, SCHEMA_VERSION};
pub use error::{StoreError, StoreResult};
pub use kv::KvStore;
pub use usage::{UsageStats, UsageStore};
