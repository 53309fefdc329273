//! Student - The single persisted record
//!
//! TigerStyle: Explicit fields, constraints checked before storage is touched.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Minimum accepted age (inclusive)
pub const STUDENT_AGE_MIN: i32 = 18;

/// Maximum accepted age (inclusive)
pub const STUDENT_AGE_MAX: i32 = 100;

/// HTML living-standard email syntax.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("email pattern is a valid regex")
});

// =============================================================================
// Student
// =============================================================================

/// A persisted student row.
///
/// `id` is assigned by the store on insert and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    /// Store-assigned identifier
    pub id: i64,
    /// Display name, never empty
    pub name: String,
    /// Contact email, valid syntax
    pub email: String,
    /// Age in years, within [`STUDENT_AGE_MIN`, `STUDENT_AGE_MAX`]
    pub age: i32,
}

impl Student {
    /// Create a student with a known id.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>, age: i32) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Check the field constraints.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        validate(&self.name, &self.email, self.age)
    }

    /// The writable fields of this student, without the id.
    #[must_use]
    pub fn fields(&self) -> NewStudent {
        NewStudent::new(self.name.clone(), self.email.clone(), self.age)
    }
}

/// Fields supplied by a caller when creating a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStudent {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Age in years
    pub age: i32,
}

impl NewStudent {
    /// Create insert fields.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i32) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Check the field constraints.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        validate(&self.name, &self.email, self.age)
    }

    /// Attach a store-assigned id.
    #[must_use]
    pub fn with_id(self, id: i64) -> Student {
        Student {
            id,
            name: self.name,
            email: self.email,
            age: self.age,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// The rule a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// Field must be present and non-empty
    Required,
    /// Field must be a syntactically valid email address
    Email,
    /// Field must be greater than or equal to the bound
    Min(i32),
    /// Field must be less than or equal to the bound
    Max(i32),
}

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Lowercase field name as it appears in JSON
    pub field: &'static str,
    /// Which rule failed
    pub rule: ValidationRule,
}

impl FieldError {
    fn new(field: &'static str, rule: ValidationRule) -> Self {
        Self { field, rule }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            ValidationRule::Required => write!(f, "field '{}' is required", self.field),
            ValidationRule::Email => {
                write!(f, "field '{}' must be a valid email address", self.field)
            }
            ValidationRule::Min(bound) => write!(
                f,
                "field '{}' must be greater than or equal to {bound}",
                self.field
            ),
            ValidationRule::Max(bound) => write!(
                f,
                "field '{}' must be less than or equal to {bound}",
                self.field
            ),
        }
    }
}

/// Check every student field constraint.
///
/// Returns all failures in field order (name, email, age), not just the first.
pub fn validate(name: &str, email: &str, age: i32) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push(FieldError::new("name", ValidationRule::Required));
    }

    if email.trim().is_empty() {
        errors.push(FieldError::new("email", ValidationRule::Required));
    } else if !EMAIL_PATTERN.is_match(email) {
        errors.push(FieldError::new("email", ValidationRule::Email));
    }

    if age < STUDENT_AGE_MIN {
        errors.push(FieldError::new("age", ValidationRule::Min(STUDENT_AGE_MIN)));
    } else if age > STUDENT_AGE_MAX {
        errors.push(FieldError::new("age", ValidationRule::Max(STUDENT_AGE_MAX)));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// =============================================================================
// Tests
// =============================================================================
