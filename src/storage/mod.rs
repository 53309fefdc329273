//! Storage - Backend Trait and Implementations
//!
//! TigerStyle: One contract, identical behavior across SQL dialects.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StorageBackend Trait                      │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                    ↑                    ↑
//!          │                    │                    │
//! ┌────────┴────────┐  ┌────────┴────────┐  ┌───────┴────────┐
//! │SimStorageBackend│  │  SqliteBackend  │  │ PostgresBackend│
//! │   (testing)     │  │   (embedded)    │  │   (server)     │
//! └─────────────────┘  └─────────────────┘  └────────────────┘
//! ```
//!
//! # Dialects
//!
//! | Concern        | SQLite                 | Postgres              |
//! |----------------|------------------------|-----------------------|
//! | Placeholders   | `?`                    | `$1..$n`              |
//! | Generated id   | `last_insert_rowid()`  | `RETURNING id`        |
//! | Auto-increment | `AUTOINCREMENT`        | `BIGSERIAL`           |
//!
//! Rows affected by update/delete are surfaced as `u64` by both.

mod backend;
mod error;
mod locator;
mod postgres;
mod sim;
mod sqlite;
mod student;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use locator::{connect, StorageLocator};
pub use postgres::PostgresBackend;
pub use sim::{SimConfig, SimStorageBackend};
pub use sqlite::SqliteBackend;
pub use student::{
    validate, FieldError, NewStudent, Student, ValidationRule, STUDENT_AGE_MAX, STUDENT_AGE_MIN,
};
