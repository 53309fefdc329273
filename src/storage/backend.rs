//! StorageBackend - the contract every backend implements

use async_trait::async_trait;

use super::error::StorageResult;
use super::student::{NewStudent, Student};

/// Persistence contract for students.
///
/// Implementations must be observably identical: same errors for the same
/// inputs, same ordering, same affected counts. Values are bound as
/// parameters, never spliced into SQL text.
///
/// Implementations are shared across request tasks, so they must be
/// `Send + Sync` and rely on the store (or pool) for isolation.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Insert a pre-validated student and return the store-assigned id.
    async fn create_student(&self, student: &NewStudent) -> StorageResult<i64>;

    /// Point lookup.
    ///
    /// # Errors
    /// `NotFound` when no row has this id.
    async fn get_student_by_id(&self, id: i64) -> StorageResult<Student>;

    /// Every student, in insertion (id) order.
    async fn get_students(&self) -> StorageResult<Vec<Student>>;

    /// Overwrite all fields of the row with `student.id`.
    ///
    /// Returns the number of rows changed: 0 means no such id.
    ///
    /// # Errors
    /// `InvalidArgument` when the id is unset (zero or negative); the store
    /// is not touched.
    async fn update_student(&self, student: &Student) -> StorageResult<u64>;

    /// Delete by id and return the deleted id.
    ///
    /// # Errors
    /// `NotFound` when no row was deleted.
    async fn delete_student(&self, id: i64) -> StorageResult<i64>;

    /// Short backend identifier for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Release the underlying pool. Further calls fail with `Query`.
    async fn close(&self);
}

/// Reject unset ids before a store round trip.
pub(crate) fn require_id(id: i64) -> StorageResult<()> {
    if id <= 0 {
        return Err(super::StorageError::InvalidArgument(format!(
            "student id must be set to update, got {id}"
        )));
    }
    Ok(())
}
