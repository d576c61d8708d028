/// Tasks, their comments and status changes
///
/// Referenced users are checked with a read before the write. There is no
/// transaction around the two steps: a user removed in between still ends
/// up referenced.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::repository::{TaskRepository, UserRepository};
use crate::error::{StoreError, StoreResult};
use crate::models::task::{
    Comment, NewComment, NewTask, Task, TaskChanges, TaskDetails, TaskFilter, TaskStatus,
};
use crate::models::user::User;
use crate::pagination::{Page, Pagination};
use crate::validation::Violations;

#[derive(Clone)]
pub struct TaskStore {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
}

impl TaskStore {
    pub fn new(tasks: Arc<dyn TaskRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { tasks, users }
    }

    /// One page of tasks matching every present filter, newest first
    pub async fn list_tasks(
        &self,
        pagination: Pagination,
        filter: &TaskFilter,
    ) -> StoreResult<Page<TaskDetails>> {
        let tasks = self
            .tasks
            .list(filter, pagination.limit(), pagination.offset())
            .await?;
        let total = self.tasks.count(filter).await?;

        debug!(
            page = pagination.page(),
            limit = pagination.limit(),
            total,
            ?filter,
            "Listed tasks"
        );

        Ok(Page {
            items: self.resolve_all(tasks, Utc::now()).await?,
            meta: pagination.meta(total),
        })
    }

    pub async fn get_task(&self, id: Uuid) -> StoreResult<TaskDetails> {
        let task = self.find(id).await?;
        self.resolve(task).await
    }

    /// Checks the assignee, validates the draft and persists it
    ///
    /// A well-formed `assignedTo` that matches no user fails with
    /// `AssignedUserNotFound` before anything else is looked at.
    pub async fn create_task(&self, input: NewTask) -> StoreResult<TaskDetails> {
        if let Some(assignee) = input.assigned_to_id() {
            self.ensure_assignee(assignee).await?;
        }

        let fields = input.into_fields().map_err(|violations| {
            warn!(%violations, "Rejected task creation");
            StoreError::Validation(violations)
        })?;

        if let Some(creator) = fields.created_by {
            if creator != fields.assigned_to && self.users.find_by_id(creator).await?.is_none() {
                warn!(created_by = %creator, "Creator not found");
                return Err(Violations::single("createdBy", "Creator not found").into());
            }
        }

        let task = Task::new(fields, Utc::now());
        self.tasks.insert(&task).await?;

        info!(
            task_id = %task.id,
            assigned_to = %task.assigned_to,
            status = task.status.as_str(),
            "Task created"
        );
        self.resolve(task).await
    }

    /// Merges the changes onto the stored task and re-validates the result
    pub async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<TaskDetails> {
        let mut task = self.find(id).await?;

        if let Some(assignee) = changes.assigned_to_id() {
            self.ensure_assignee(assignee).await?;
        }

        let fields = changes.merge_onto(&task).into_fields().map_err(|violations| {
            warn!(task_id = %id, %violations, "Rejected task update");
            StoreError::Validation(violations)
        })?;

        task.apply(fields, Utc::now());
        if !self.tasks.update(&task).await? {
            return Err(StoreError::NotFound("Task"));
        }

        info!(task_id = %id, status = task.status.as_str(), "Task updated");
        self.resolve(task).await
    }

    /// Hard delete
    pub async fn delete_task(&self, id: Uuid) -> StoreResult<()> {
        if !self.tasks.delete(id).await? {
            return Err(StoreError::NotFound("Task"));
        }

        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Appends a comment stamped with the current time
    ///
    /// The author id must be well formed but is not looked up; callers that
    /// care must check it themselves.
    pub async fn add_comment(&self, id: Uuid, comment: NewComment) -> StoreResult<TaskDetails> {
        self.find(id).await?;

        let (user, text) = comment.into_parts().map_err(|violations| {
            warn!(task_id = %id, %violations, "Rejected comment");
            StoreError::Validation(violations)
        })?;

        let now = Utc::now();
        let comment = Comment::new(user, text, now);
        let task = self
            .tasks
            .append_comment(id, &comment, now)
            .await?
            .ok_or(StoreError::NotFound("Task"))?;

        info!(task_id = %id, comment_id = %comment.id, author = %user, "Comment added");
        self.resolve(task).await
    }

    /// Sets the status; any status may follow any other
    ///
    /// Setting `completed` stamps `completed_at`. Moving away from it keeps
    /// the old stamp.
    pub async fn set_status(&self, id: Uuid, status: &str) -> StoreResult<TaskDetails> {
        self.find(id).await?;

        let status = match status.trim() {
            "" => return Err(Violations::single("status", "Please provide a status").into()),
            raw => raw
                .parse::<TaskStatus>()
                .map_err(|e| StoreError::from(Violations::single("status", e.to_string())))?,
        };

        let task = self
            .tasks
            .set_status(id, status, Utc::now())
            .await?
            .ok_or(StoreError::NotFound("Task"))?;

        info!(task_id = %id, status = status.as_str(), "Task status changed");
        self.resolve(task).await
    }

    /// Tasks overdue right now
    pub async fn find_overdue(&self) -> StoreResult<Vec<TaskDetails>> {
        self.find_overdue_as_of(Utc::now()).await
    }

    /// Tasks due strictly before `now` that are neither completed nor cancelled
    pub async fn find_overdue_as_of(&self, now: DateTime<Utc>) -> StoreResult<Vec<TaskDetails>> {
        let tasks = self.tasks.find_overdue(now).await?;
        debug!(count = tasks.len(), "Found overdue tasks");
        self.resolve_all(tasks, now).await
    }

    /// Every task assigned to `user_id`
    pub async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Vec<TaskDetails>> {
        let tasks = self.tasks.find_by_assignee(user_id).await?;
        debug!(user_id = %user_id, count = tasks.len(), "Found tasks for user");
        self.resolve_all(tasks, Utc::now()).await
    }

    async fn find(&self, id: Uuid) -> StoreResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn ensure_assignee(&self, assignee: Uuid) -> StoreResult<()> {
        if self.users.find_by_id(assignee).await?.is_none() {
            warn!(assigned_to = %assignee, "Assigned user not found");
            return Err(StoreError::AssignedUserNotFound);
        }
        Ok(())
    }

    async fn resolve(&self, task: Task) -> StoreResult<TaskDetails> {
        let mut resolved = self.resolve_all(vec![task], Utc::now()).await?;
        resolved.pop().ok_or(StoreError::NotFound("Task"))
    }

    /// Resolves user references with a single batched lookup
    async fn resolve_all(
        &self,
        tasks: Vec<Task>,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<TaskDetails>> {
        let mut ids: Vec<Uuid> = tasks.iter().flat_map(Task::referenced_users).collect();
        ids.sort();
        ids.dedup();

        let users: HashMap<Uuid, User> = self
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(tasks
            .into_iter()
            .map(|task| TaskDetails::resolve(task, &users, now))
            .collect())
    }
}
