//! SqliteBackend - Embedded Storage
//!
//! TigerStyle: Single file database, self-provisioning schema.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS students (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     name TEXT NOT NULL,
//!     email TEXT NOT NULL,
//!     age INTEGER NOT NULL
//! );
//! ```
//!
//! The generated id comes from `last_insert_rowid()` of the insert's own
//! result, which sqlx reads on the connection that executed the statement.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;

use super::backend::{require_id, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::student::{NewStudent, Student};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Pool size for file databases
pub const SQLITE_CONNECTIONS_MAX: u32 = 8;

/// How long a writer waits on a locked database before failing
pub const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        age INTEGER NOT NULL
    )
"#;

// =============================================================================
// SqliteBackend
// =============================================================================

/// SQLite storage backend.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    /// Returns `Connection` if the file cannot be opened or the table
    /// cannot be created.
    pub async fn open(path: &Path) -> StorageResult<Self> {
        assert!(!path.as_os_str().is_empty(), "sqlite path cannot be empty");

        Self::open_file(SqliteConnectOptions::new().filename(path)).await
    }

    /// Open from a `sqlite:` URL.
    ///
    /// A URL naming a file gets the same treatment as [`open`](Self::open).
    /// In-memory URLs (`:memory:` or `mode=memory`) are opened as given.
    ///
    /// # Errors
    /// Returns `Connection` if the URL is malformed or the database cannot be
    /// opened.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::connection(format!("invalid sqlite url {url}"), e))?;

        if !is_memory_url(url) {
            return Self::open_file(options).await;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_CONNECTIONS_MAX)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::connection(format!("failed to open {url}"), e))?;

        Self::from_pool(pool).await
    }

    /// Shared setup for file databases.
    ///
    /// Missing parent directories are created. WAL mode lets readers proceed
    /// while a single writer holds the lock.
    async fn open_file(options: SqliteConnectOptions) -> StorageResult<Self> {
        let path = options.clone().get_filename().into_owned();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::connection(format!("failed to create {}", parent.display()), e)
            })?;
        }

        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS));

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_CONNECTIONS_MAX)
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::connection(format!("failed to open {}", path.display()), e)
            })?;

        tracing::debug!("Opened sqlite database at {}", path.display());
        Self::from_pool(pool).await
    }

    /// Private in-memory database.
    ///
    /// Every connection to `:memory:` is its own database, so the pool holds
    /// exactly one connection and never retires it.
    ///
    /// # Errors
    /// Returns `Connection` if the table cannot be created.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::connection("invalid in-memory url", e))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::connection("failed to open in-memory database", e))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, ensuring the table exists.
    ///
    /// # Errors
    /// Returns `Connection` if the table cannot be created.
    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        let backend = Self { pool };
        backend.init_schema().await?;
        Ok(backend)
    }

    async fn init_schema(&self) -> StorageResult<()> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::connection("failed to create students table", e))?;
        Ok(())
    }

    /// Get the connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

// =============================================================================
// Row Mapping
// =============================================================================

fn row_to_student(row: &SqliteRow) -> Result<Student, sqlx::Error> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        age: row.try_get("age")?,
    })
}

// =============================================================================
// StorageBackend Implementation
// =============================================================================

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn create_student(&self, student: &NewStudent) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO students (name, email, age) VALUES (?, ?, ?)")
            .bind(&student.name)
            .bind(&student.email)
            .bind(student.age)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::query("create_student", e))?;

        let id = result.last_insert_rowid();

        // Postcondition
        assert!(id > 0, "sqlite rowid must be positive, got {id}");

        tracing::debug!(id, "Created student");
        Ok(id)
    }

    async fn get_student_by_id(&self, id: i64) -> StorageResult<Student> {
        let row = sqlx::query("SELECT id, name, email, age FROM students WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::query("get_student_by_id", e))?;

        let Some(row) = row else {
            return Err(StorageError::NotFound { id });
        };
        let student =
            row_to_student(&row).map_err(|e| StorageError::query("get_student_by_id", e))?;

        // Postcondition
        assert_eq!(student.id, id, "returned student must match requested id");

        Ok(student)
    }

    async fn get_students(&self) -> StorageResult<Vec<Student>> {
        let rows = sqlx::query("SELECT id, name, email, age FROM students ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::query("get_students", e))?;

        rows.iter()
            .map(row_to_student)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::query("get_students", e))
    }

    async fn update_student(&self, student: &Student) -> StorageResult<u64> {
        require_id(student.id)?;

        let result = sqlx::query("UPDATE students SET name = ?, email = ?, age = ? WHERE id = ?")
            .bind(&student.name)
            .bind(&student.email)
            .bind(student.age)
            .bind(student.id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::query("update_student", e))?;

        let affected = result.rows_affected();

        // Postcondition: id is the primary key
        assert!(affected <= 1, "update touched {affected} rows for one id");

        tracing::debug!(id = student.id, affected, "Updated student");
        Ok(affected)
    }

    async fn delete_student(&self, id: i64) -> StorageResult<i64> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::query("delete_student", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { id });
        }

        tracing::debug!(id, "Deleted student");
        Ok(id)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_ids_autoincrement() {
        let backend = SqliteBackend::in_memory().await.unwrap();

        let first = backend
            .create_student(&NewStudent::new("Ana", "ana@example.com", 22))
            .await
            .unwrap();
        let second = backend
            .create_student(&NewStudent::new("Bo", "bo@example.com", 31))
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);

        // AUTOINCREMENT never reuses a deleted id
        backend.delete_student(second).await.unwrap();
        let third = backend
            .create_student(&NewStudent::new("Cy", "cy@example.com", 40))
            .await
            .unwrap();
        assert_eq!(third, 3);

        backend.close().await;
    }

    #[tokio::test]
    async fn test_sqlite_schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("students.db");

        let backend = SqliteBackend::open(&path).await.unwrap();
        let id = backend
            .create_student(&NewStudent::new("Ana", "ana@example.com", 22))
            .await
            .unwrap();
        backend.close().await;

        // Reopening must keep existing rows
        let backend = SqliteBackend::open(&path).await.unwrap();
        let student = backend.get_student_by_id(id).await.unwrap();
        assert_eq!(student.name, "Ana");
        backend.close().await;
    }

    async fn journal_mode(backend: &SqliteBackend) -> String {
        sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(backend.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_url_matches_file_setup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("students.db");
        let url = format!("sqlite://{}", path.display());

        let backend = SqliteBackend::connect(&url).await.unwrap();
        assert!(path.exists(), "missing parent must be created");
        assert_eq!(journal_mode(&backend).await.to_lowercase(), "wal");

        let id = backend
            .create_student(&NewStudent::new("Ana", "ana@example.com", 22))
            .await
            .unwrap();
        backend.close().await;

        // Same file reached as a plain path
        let backend = SqliteBackend::open(&path).await.unwrap();
        assert_eq!(journal_mode(&backend).await.to_lowercase(), "wal");
        assert_eq!(backend.get_student_by_id(id).await.unwrap().name, "Ana");
        backend.close().await;
    }

    #[tokio::test]
    async fn test_sqlite_memory_url_skips_file_setup() {
        assert!(is_memory_url("sqlite://students?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite://data/students.db?mode=rwc"));

        let backend = SqliteBackend::connect("sqlite://students?mode=memory&cache=shared")
            .await
            .unwrap();
        assert_eq!(journal_mode(&backend).await.to_lowercase(), "memory");
        backend.close().await;
    }

    #[tokio::test]
    async fn test_sqlite_extra_columns_do_not_break_reads() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        sqlx::query("ALTER TABLE students ADD COLUMN nickname TEXT")
            .execute(backend.pool())
            .await
            .unwrap();

        let id = backend
            .create_student(&NewStudent::new("Ana", "ana@example.com", 22))
            .await
            .unwrap();
        let student = backend.get_student_by_id(id).await.unwrap();
        assert_eq!(student, Student::new(id, "Ana", "ana@example.com", 22));
    }

    #[tokio::test]
    async fn test_sqlite_injection_is_inert() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let hostile = "x'); DROP TABLE students; --";

        let id = backend
            .create_student(&NewStudent::new(hostile, "ana@example.com", 22))
            .await
            .unwrap();

        let student = backend.get_student_by_id(id).await.unwrap();
        assert_eq!(student.name, hostile);
        assert_eq!(backend.get_students().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_closed_pool_is_query_error() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        backend.close().await;

        let err = backend.get_students().await.unwrap_err();
        assert!(matches!(err, StorageError::Query { operation: "get_students", .. }));
    }
}
