/// Data shapes for Taskdesk
///
/// Each model module contains three separate things:
///
/// - the plain record (`User`, `Task`) as the backends persist it,
/// - input drafts (`NewUser`, `NewTask`, ...) with pure validation functions
///   that return every violated field,
/// - pure derivations (`Task::is_overdue`, `Task::progress`, ...) computed
///   from a snapshot.
///
/// Nothing here touches a database; persistence lives in [`crate::db`] and is
/// orchestrated by [`crate::stores`].
///
/// # Models
///
/// - `user`: User accounts, roles and aggregate statistics
/// - `task`: Tasks, comments, filters and resolved views

pub mod task;
pub mod user;

use crate::error::{StoreError, StoreResult};
use uuid::Uuid;

/// Parses a resource identifier taken from a URL or query string
///
/// A malformed id is an [`StoreError::InvalidIdentifier`], which the HTTP
/// layer reports as 400 rather than 404.
pub fn parse_id(entity: &'static str, raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| StoreError::InvalidIdentifier {
        entity,
        value: raw.to_string(),
    })
}

/// Raised when a string does not name a variant of one of the model enums
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{value}` is not a valid {kind}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Trims a free-text input, treating blank strings as absent
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
