/// Repository traits
///
/// Storage interface shared by the Postgres and in-memory backends. The
/// stores only ever talk to these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::task::{Comment, Task, TaskFilter, TaskStatus};
use crate::models::user::{RoleCount, User};

/// Storage operations for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; a taken email fails with `DuplicateEmail`
    async fn insert(&self, user: &User) -> StoreResult<()>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Fetch several users at once; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    /// Case-insensitive email lookup
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Overwrite a stored user; returns false if it no longer exists
    async fn update(&self, user: &User) -> StoreResult<bool>;

    /// Newest first
    async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>>;

    async fn count(&self) -> StoreResult<i64>;

    /// One entry per role that has at least one user
    async fn count_by_role(&self) -> StoreResult<Vec<RoleCount>>;
}

/// Storage operations for tasks
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, task: &Task) -> StoreResult<()>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Overwrite a stored task; returns false if it no longer exists
    async fn update(&self, task: &Task) -> StoreResult<bool>;

    /// Set the status in a single write
    ///
    /// Setting `completed` stamps `completed_at = at`; other statuses leave it
    /// as it was.
    async fn set_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Task>>;

    /// Append a comment in a single write
    async fn append_comment(
        &self,
        id: Uuid,
        comment: &Comment,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Task>>;

    /// Remove a task; returns false if it did not exist
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Newest first
    async fn list(&self, filter: &TaskFilter, limit: i64, offset: i64) -> StoreResult<Vec<Task>>;

    async fn count(&self, filter: &TaskFilter) -> StoreResult<i64>;

    /// Tasks due strictly before `now` that are neither completed nor
    /// cancelled, earliest due date first
    async fn find_overdue(&self, now: DateTime<Utc>) -> StoreResult<Vec<Task>>;

    /// Tasks assigned to `user_id`, newest first
    async fn find_by_assignee(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;
}
