/// In-memory backend
///
/// Keeps every record in a `RwLock<HashMap>`. Used by tests and by the API
/// when `STORAGE_BACKEND=memory`. Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{TaskRepository, UserRepository};
use crate::error::{StoreError, StoreResult};
use crate::models::task::{Comment, Task, TaskFilter, TaskStatus};
use crate::models::user::{RoleCount, User};

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// User records held in memory
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Uuid) -> bool {
    users
        .values()
        .any(|u| u.id != except && u.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, user.id) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Ok(false);
        }
        if email_taken(&users, &user.email, user.id) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        newest_first(&mut users, |u| (u.created_at, u.id));
        Ok(page(users, limit, offset))
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn count_by_role(&self) -> StoreResult<Vec<RoleCount>> {
        let users = self.users.read().await;
        let mut counts = BTreeMap::new();
        for user in users.values() {
            *counts.entry(user.role).or_insert(0i64) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(role, count)| RoleCount { role, count })
            .collect())
    }
}

/// Task records held in memory
#[derive(Default)]
pub struct MemoryTaskRepository {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select(&self, predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| predicate(t))
            .cloned()
            .collect();
        newest_first(&mut tasks, |t| (t.created_at, t.id));
        tasks
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn insert(&self, task: &Task) -> StoreResult<()> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update(&self, task: &Task) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.get_mut(&id).map(|task| {
            task.set_status(status, at);
            task.clone()
        }))
    }

    async fn append_comment(
        &self,
        id: Uuid,
        comment: &Comment,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.get_mut(&id).map(|task| {
            task.comments.push(comment.clone());
            task.updated_at = at;
            task.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }

    async fn list(&self, filter: &TaskFilter, limit: i64, offset: i64) -> StoreResult<Vec<Task>> {
        let tasks = self.select(|t| filter.matches(t)).await;
        Ok(page(tasks, limit, offset))
    }

    async fn count(&self, filter: &TaskFilter) -> StoreResult<i64> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().filter(|t| filter.matches(t)).count() as i64)
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> StoreResult<Vec<Task>> {
        let mut tasks = self.select(|t| t.is_listed_overdue(now)).await;
        tasks.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn find_by_assignee(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(self.select(|t| t.assigned_to == user_id).await)
    }
}
