//! StorageLocator - backend selection from one data-source string

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::backend::StorageBackend;
use super::error::{StorageError, StorageResult};
use super::postgres::PostgresBackend;
use super::sqlite::SqliteBackend;

/// Where the students table lives, and therefore which backend serves it.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageLocator {
    /// SQLite database file (created if missing)
    SqliteFile(PathBuf),
    /// `sqlite:` URL passed to the driver as-is
    SqliteUrl(String),
    /// Private in-memory SQLite database
    SqliteMemory,
    /// `postgres://` or `postgresql://` connection string
    Postgres(String),
}

impl StorageLocator {
    /// Classify a locator string.
    ///
    /// A leading `~` in a file path is expanded to the home directory.
    ///
    /// # Errors
    /// Returns `Connection` for an empty locator.
    pub fn parse(locator: &str) -> StorageResult<Self> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(StorageError::connection_msg("storage locator is empty"));
        }

        if locator.starts_with("postgres://") || locator.starts_with("postgresql://") {
            return Ok(Self::Postgres(locator.to_string()));
        }
        if locator == ":memory:" || locator == "sqlite::memory:" {
            return Ok(Self::SqliteMemory);
        }
        if locator.starts_with("sqlite:") {
            return Ok(Self::SqliteUrl(locator.to_string()));
        }

        let expanded = shellexpand::tilde(locator);
        Ok(Self::SqliteFile(PathBuf::from(expanded.as_ref())))
    }

    /// Backend name this locator selects.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::SqliteFile(_) | Self::SqliteUrl(_) | Self::SqliteMemory => "sqlite",
        }
    }
}

/// Connection strings may carry passwords in the user info or the query, so
/// neither is shown.
impl fmt::Debug for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SqliteFile(path) => write!(f, "sqlite file {}", path.display()),
            Self::SqliteUrl(url) => write!(f, "sqlite url {}", without_query(url)),
            Self::SqliteMemory => write!(f, "sqlite in-memory"),
            Self::Postgres(url) => {
                let host = url
                    .split_once("://")
                    .map(|(_, rest)| {
                        let rest = without_query(rest);
                        rest.rsplit_once('@').map_or(rest, |(_, host)| host)
                    })
                    .unwrap_or_default();
                write!(f, "postgres {host}")
            }
        }
    }
}

fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Open the backend a locator selects and provision its table.
///
/// Called once at startup; the returned handle is shared by every request.
///
/// # Errors
/// Returns `Connection` if the store is unreachable or the table cannot be
/// created.
pub async fn connect(locator: &StorageLocator) -> StorageResult<Arc<dyn StorageBackend>> {
    tracing::info!("Opening storage: {}", locator);

    let backend: Arc<dyn StorageBackend> = match locator {
        StorageLocator::SqliteFile(path) => Arc::new(SqliteBackend::open(path).await?),
        StorageLocator::SqliteUrl(url) => Arc::new(SqliteBackend::connect(url).await?),
        StorageLocator::SqliteMemory => Arc::new(SqliteBackend::in_memory().await?),
        StorageLocator::Postgres(url) => Arc::new(PostgresBackend::new(url).await?),
    };

    // Postcondition
    assert_eq!(
        backend.backend_name(),
        locator.backend_name(),
        "opened backend must match locator"
    );

    Ok(backend)
}
