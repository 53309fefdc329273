//! Configuration
//!
//! TigerStyle: Flags, then environment, then defaults.
//!
//! Every flag has an environment variable, and `main` loads a `.env` file
//! before parsing, so any of these work:
//!
//! ```bash
//! students-api --storage-path postgres://localhost/students
//! STORAGE_PATH=~/students.db students-api
//! echo 'STUDENTS_ENV=production' > .env && students-api
//! ```

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use clap::Parser;

use crate::storage::{StorageError, StorageLocator};
use crate::APP_NAME;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Default HTTP bind address
pub const HTTP_ADDRESS_DEFAULT: &str = "127.0.0.1:8082";

/// Default data-source locator
pub const STORAGE_PATH_DEFAULT: &str = "storage/storage.db";

/// Default deployment environment
pub const ENV_DEFAULT: &str = "dev";

/// Environment in which storage error detail is withheld from clients
pub const ENV_PRODUCTION: &str = "production";

/// Default grace period for in-flight requests on shutdown
pub const SHUTDOWN_GRACE_SECS_DEFAULT: u64 = 5;

/// Upper bound on the shutdown grace period
pub const SHUTDOWN_GRACE_SECS_MAX: u64 = 300;

// =============================================================================
// Config
// =============================================================================

/// Students CRUD API over SQLite or Postgres
#[derive(Parser, Debug, Clone)]
#[command(name = APP_NAME)]
#[command(about = "Students CRUD API over SQLite or Postgres")]
#[command(version)]
pub struct Config {
    /// Deployment environment (`production` hides storage error detail)
    #[arg(long = "env", env = "STUDENTS_ENV", default_value = ENV_DEFAULT)]
    pub env: String,

    /// SQLite file path, `sqlite:` URL, `:memory:`, or `postgres://` URL
    #[arg(long, env = "STORAGE_PATH", default_value = STORAGE_PATH_DEFAULT)]
    pub storage_path: String,

    /// HTTP bind address
    #[arg(short, long, env = "HTTP_ADDRESS", default_value = HTTP_ADDRESS_DEFAULT)]
    pub address: String,

    /// Seconds in-flight requests may run after a shutdown signal
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = SHUTDOWN_GRACE_SECS_DEFAULT)]
    pub shutdown_grace_secs: u64,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Configuration that parsed but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Bind address is not `host:port`, or the host does not resolve
    #[error("invalid address {address:?}: {source}")]
    InvalidAddress {
        /// The rejected value
        address: String,
        /// Parse or lookup failure
        source: io::Error,
    },

    /// Storage locator is unusable
    #[error("invalid storage path: {0}")]
    InvalidStorage(#[from] StorageError),

    /// Grace period above the allowed maximum
    #[error("shutdown grace {got}s exceeds max {max}s")]
    GraceTooLong {
        /// Configured seconds
        got: u64,
        /// Allowed seconds
        max: u64,
    },
}

impl Config {
    /// Configuration with all defaults and the given locator, for tests and
    /// embedding.
    #[must_use]
    pub fn with_storage_path(storage_path: impl Into<String>) -> Self {
        Self {
            env: ENV_DEFAULT.to_string(),
            storage_path: storage_path.into(),
            address: HTTP_ADDRESS_DEFAULT.to_string(),
            shutdown_grace_secs: SHUTDOWN_GRACE_SECS_DEFAULT,
            verbose: 0,
        }
    }

    /// Resolved bind addresses. The host may be an IP or a name.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the address is not `host:port` or the
    /// host resolves to nothing.
    pub fn socket_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        let invalid = |source| ConfigError::InvalidAddress {
            address: self.address.clone(),
            source,
        };

        let addrs: Vec<SocketAddr> = self.address.to_socket_addrs().map_err(invalid)?.collect();
        if addrs.is_empty() {
            return Err(invalid(io::Error::new(
                io::ErrorKind::NotFound,
                "host resolved to no addresses",
            )));
        }
        Ok(addrs)
    }

    /// Parsed data-source locator.
    ///
    /// # Errors
    /// Returns `InvalidStorage` for an empty locator.
    pub fn storage_locator(&self) -> Result<StorageLocator, ConfigError> {
        Ok(StorageLocator::parse(&self.storage_path)?)
    }

    /// Shutdown grace period.
    ///
    /// # Errors
    /// Returns `GraceTooLong` above [`SHUTDOWN_GRACE_SECS_MAX`].
    pub fn shutdown_grace(&self) -> Result<Duration, ConfigError> {
        if self.shutdown_grace_secs > SHUTDOWN_GRACE_SECS_MAX {
            return Err(ConfigError::GraceTooLong {
                got: self.shutdown_grace_secs,
                max: SHUTDOWN_GRACE_SECS_MAX,
            });
        }
        Ok(Duration::from_secs(self.shutdown_grace_secs))
    }

    /// Whether storage error detail may be sent to clients.
    #[must_use]
    pub fn expose_errors(&self) -> bool {
        !self.env.eq_ignore_ascii_case(ENV_PRODUCTION)
    }

    /// Default tracing filter for the verbosity level.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info,sqlx=warn",
            1 => "debug,sqlx=info",
            _ => "trace",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
