//! Students API - CRUD Service over SQLite or Postgres
//!
//! TigerStyle: One storage contract, interchangeable SQL backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  http (axum)      │ decode, validate, envelope, status codes │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StorageBackend   │ create / get / list / update / delete    │
//! ├───────────────────┬───────────────────┬─────────────────────┤
//! │  SqliteBackend    │  PostgresBackend  │  SimStorageBackend  │
//! │  (embedded)       │  (server)         │  (testing)          │
//! └───────────────────┴───────────────────┴─────────────────────┘
//! ```
//!
//! The backend is chosen once at startup from a single data-source locator
//! (see [`storage::StorageLocator`]) and shared by every request handler.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod http;
pub mod storage;

pub use config::{Config, ConfigError};
pub use storage::{
    NewStudent, SimStorageBackend, StorageBackend, StorageError, StorageLocator, StorageResult,
    Student,
};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Application name
pub const APP_NAME: &str = "students-api";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
