//! SimStorageBackend - In-memory storage with fault injection
//!
//! TigerStyle: Deterministic simulation of the storage contract.
//!
//! Behaves exactly like the SQL backends (ids start at 1, are never reused,
//! listing is in id order) and can fail any operation with a seeded
//! probability so callers' error paths can be tested without a database.
//!
//! Run with an explicit seed for reproducibility:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::RwLock;

use super::backend::{require_id, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::student::{NewStudent, Student};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Environment variable holding the fault RNG seed
pub const DST_SEED_ENV: &str = "DST_SEED";

/// Seed used when `DST_SEED` is unset
pub const DST_SEED_DEFAULT: u64 = 42;

// =============================================================================
// Config
// =============================================================================

/// Simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// RNG seed for fault decisions
    pub seed: u64,
    /// Probability in [0, 1] that any single operation fails
    pub fault_probability: f64,
}

impl SimConfig {
    /// No faults, seed taken from `DST_SEED` or the default.
    #[must_use]
    pub fn from_env() -> Self {
        let seed = std::env::var(DST_SEED_ENV)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DST_SEED_DEFAULT);
        Self::with_seed(seed)
    }

    /// No faults with an explicit seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            fault_probability: 0.0,
        }
    }

    /// Fail operations with the given probability.
    ///
    /// # Panics
    /// Panics if the probability is outside [0, 1].
    #[must_use]
    pub fn with_fault_probability(mut self, probability: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "fault probability {probability} must be in [0, 1]"
        );
        self.fault_probability = probability;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Error injected in place of a driver failure.
#[derive(Debug, thiserror::Error)]
#[error("injected fault (seed {seed})")]
pub struct InjectedFault {
    seed: u64,
}

// =============================================================================
// SimStorageBackend
// =============================================================================

#[derive(Debug, Default)]
struct SimTable {
    /// Next id to hand out; ids are never reused
    next_id: i64,
    rows: BTreeMap<i64, Student>,
    closed: bool,
}

/// In-memory implementation of [`StorageBackend`].
#[derive(Debug)]
pub struct SimStorageBackend {
    config: SimConfig,
    table: RwLock<SimTable>,
    rng: Mutex<ChaCha8Rng>,
}

impl SimStorageBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        tracing::debug!(seed = config.seed, "Sim storage seed");
        Self {
            config,
            table: RwLock::new(SimTable {
                next_id: 1,
                ..SimTable::default()
            }),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
        }
    }

    /// The active simulation parameters.
    #[must_use]
    pub fn config(&self) -> SimConfig {
        self.config
    }

    /// Roll for an injected fault, and fail if closed.
    fn check(&self, operation: &'static str, closed: bool) -> StorageResult<()> {
        if closed {
            return Err(StorageError::query(operation, "storage is closed"));
        }
        if self.config.fault_probability <= 0.0 {
            return Ok(());
        }
        let roll: f64 = {
            let mut rng = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            rng.gen()
        };
        if roll < self.config.fault_probability {
            tracing::debug!(operation, "Injected storage fault");
            return Err(StorageError::query(
                operation,
                InjectedFault {
                    seed: self.config.seed,
                },
            ));
        }
        Ok(())
    }
}

impl Default for SimStorageBackend {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

#[async_trait]
impl StorageBackend for SimStorageBackend {
    async fn create_student(&self, student: &NewStudent) -> StorageResult<i64> {
        let mut table = self.table.write().await;
        self.check("create_student", table.closed)?;

        let id = table.next_id;
        table.next_id += 1;
        table.rows.insert(id, student.clone().with_id(id));

        Ok(id)
    }

    async fn get_student_by_id(&self, id: i64) -> StorageResult<Student> {
        let table = self.table.read().await;
        self.check("get_student_by_id", table.closed)?;

        table
            .rows
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound { id })
    }

    async fn get_students(&self) -> StorageResult<Vec<Student>> {
        let table = self.table.read().await;
        self.check("get_students", table.closed)?;

        Ok(table.rows.values().cloned().collect())
    }

    async fn update_student(&self, student: &Student) -> StorageResult<u64> {
        require_id(student.id)?;

        let mut table = self.table.write().await;
        self.check("update_student", table.closed)?;

        match table.rows.get_mut(&student.id) {
            Some(row) => {
                *row = student.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_student(&self, id: i64) -> StorageResult<i64> {
        let mut table = self.table.write().await;
        self.check("delete_student", table.closed)?;

        table
            .rows
            .remove(&id)
            .map(|_| id)
            .ok_or(StorageError::NotFound { id })
    }

    fn backend_name(&self) -> &'static str {
        "sim"
    }

    async fn close(&self) {
        self.table.write().await.closed = true;
    }
}

// =============================================================================
// Tests
// =============================================================================
