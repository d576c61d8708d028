/// Store error taxonomy
///
/// Expected conditions (missing records, malformed ids, validation failures,
/// duplicate emails, missing referenced users) are returned as values. Only
/// the variants reported by [`StoreError::is_internal`] represent genuine
/// faults; the HTTP boundary logs those and answers with a generic message.

use crate::password::PasswordError;
use crate::validation::Violations;
use thiserror::Error;

/// Result alias used by every store operation
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Well-formed id with no record behind it
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid {entity} id: {value}")]
    InvalidIdentifier { entity: &'static str, value: String },

    #[error("{0}")]
    Validation(Violations),

    #[error("User with this email already exists")]
    DuplicateEmail,

    #[error("Assigned user not found")]
    AssignedUserNotFound,

    /// The hash comparison primitive itself failed (not a mismatch)
    #[error("Password comparison failed: {0}")]
    PasswordComparison(#[source] PasswordError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[source] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Background task failed: {0}")]
    Background(#[from] tokio::task::JoinError),
}

impl StoreError {
    /// True for faults the caller cannot fix by changing the request
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            StoreError::PasswordComparison(_)
                | StoreError::PasswordHash(_)
                | StoreError::Database(_)
                | StoreError::Migration(_)
                | StoreError::Background(_)
        )
    }
}

impl From<Violations> for StoreError {
    fn from(violations: Violations) -> Self {
        StoreError::Validation(violations)
    }
}
