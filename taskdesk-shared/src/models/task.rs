/// Task model, drafts, filters and the resolved task view
///
/// # Status
///
/// ```text
/// pending ⇄ in-progress ⇄ completed ⇄ cancelled
/// ```
///
/// There is no enforced transition graph: any status can follow any other.
/// Entering `completed` stamps `completed_at`; leaving it keeps the stamp.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed', 'cancelled');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(500) NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ NOT NULL,
///     assigned_to UUID NOT NULL,
///     created_by UUID NOT NULL,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     comments JSONB NOT NULL DEFAULT '[]',
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `assigned_to` and `created_by` carry no foreign key; the stores check that
/// the referenced users exist before writing.

use super::user::{CommentAuthor, User, UserSummary};
use super::{clean, UnknownVariant};
use crate::validation::{self, FieldViolation, Violations};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

const TAG_MAX_CHARS: usize = 20;

const WIRE_NAMES: &[(&str, &str)] = &[
    ("due_date", "dueDate"),
    ("assigned_to", "assignedTo"),
    ("created_by", "createdBy"),
];

/// Task status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Completion percentage shown for this status
    pub fn progress(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 50,
            TaskStatus::Completed => 100,
            TaskStatus::Cancelled => 0,
        }
    }

    /// Statuses that can never make a task overdue
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Task priority
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "urgent" => Ok(TaskPriority::Urgent),
            other => Err(UnknownVariant {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

/// A comment appended to a task
///
/// Stored inside the task (JSONB on Postgres); there is no edit or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user: Uuid, text: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            text,
            created_at: now,
        }
    }
}

/// A stored task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Uuid,
    pub created_by: Uuid,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated task fields, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Uuid,
    /// `None` means "same as the assignee"
    pub created_by: Option<Uuid>,
    pub tags: Vec<String>,
}

impl Task {
    pub fn new(fields: TaskFields, now: DateTime<Utc>) -> Self {
        let completed_at = (fields.status == TaskStatus::Completed).then_some(now);
        Self {
            id: Uuid::new_v4(),
            title: fields.title,
            description: fields.description,
            status: fields.status,
            priority: fields.priority,
            due_date: fields.due_date,
            assigned_to: fields.assigned_to,
            created_by: fields.created_by.unwrap_or(fields.assigned_to),
            tags: fields.tags,
            comments: Vec::new(),
            completed_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the editable fields with a validated merge
    ///
    /// Moving into `completed` stamps `completed_at`; a task that already
    /// was completed keeps its original stamp.
    pub fn apply(&mut self, fields: TaskFields, now: DateTime<Utc>) {
        if fields.status == TaskStatus::Completed && self.status != TaskStatus::Completed {
            self.completed_at = Some(now);
        }
        self.status = fields.status;
        self.title = fields.title;
        self.description = fields.description;
        self.priority = fields.priority;
        self.due_date = fields.due_date;
        self.assigned_to = fields.assigned_to;
        if let Some(created_by) = fields.created_by {
            self.created_by = created_by;
        }
        self.tags = fields.tags;
        self.updated_at = now;
    }

    /// Changes the status, stamping `completed_at` whenever it is set to `completed`
    ///
    /// Leaving `completed` does not clear the stamp.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        if status == TaskStatus::Completed {
            self.completed_at = Some(now);
        }
        self.status = status;
        self.updated_at = now;
    }

    /// Past due and not completed
    ///
    /// A task due exactly at `now` is not overdue.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status != TaskStatus::Completed
    }

    /// Whether the overdue query returns this task; cancelled tasks are left out
    pub fn is_listed_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && !self.status.is_closed()
    }

    pub fn progress(&self) -> u8 {
        self.status.progress()
    }

    pub fn summary(&self, now: DateTime<Utc>) -> TaskSummary {
        TaskSummary {
            id: self.id,
            title: self.title.clone(),
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            is_overdue: self.is_overdue(now),
        }
    }

    /// Every user id this task points at, without duplicates
    pub fn referenced_users(&self) -> Vec<Uuid> {
        let mut ids = vec![self.assigned_to, self.created_by];
        ids.extend(self.comments.iter().map(|c| c.user));
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Compact projection of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub is_overdue: bool,
}

/// Request body for creating a task
///
/// Field names follow the JSON body (`dueDate`, `assignedTo`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[validate(
        required(message = "Please add a task title"),
        length(max = 100, message = "Title cannot be more than 100 characters")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Please add a description"),
        length(max = 500, message = "Description cannot be more than 500 characters")
    )]
    pub description: Option<String>,

    pub status: Option<String>,

    pub priority: Option<String>,

    pub due_date: Option<String>,

    pub assigned_to: Option<String>,

    pub created_by: Option<String>,

    pub tags: Option<Vec<String>>,
}

impl NewTask {
    /// Trims every text field; blank values become `None`
    pub fn normalized(self) -> Self {
        Self {
            title: clean(self.title),
            description: clean(self.description),
            status: clean(self.status),
            priority: clean(self.priority),
            due_date: clean(self.due_date),
            assigned_to: clean(self.assigned_to),
            created_by: clean(self.created_by),
            tags: self
                .tags
                .map(|tags| tags.into_iter().map(|t| t.trim().to_string()).collect()),
        }
    }

    /// The assignee id, when one was supplied in a valid shape
    pub fn assigned_to_id(&self) -> Option<Uuid> {
        parse_uuid(self.assigned_to.as_deref())
    }

    /// Every violated field of this draft
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self.clone().into_fields() {
            Ok(_) => Vec::new(),
            Err(violations) => violations.into_vec(),
        }
    }

    /// Normalizes and validates the draft
    pub fn into_fields(self) -> Result<TaskFields, Violations> {
        let draft = self.normalized();

        let mut violations = match draft.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation::from_validator_errors(&errors, WIRE_NAMES),
        };

        let status = parse_variant::<TaskStatus>(draft.status.as_deref(), "status", &mut violations);
        let priority =
            parse_variant::<TaskPriority>(draft.priority.as_deref(), "priority", &mut violations);

        let due_date = match draft.due_date.as_deref() {
            None => {
                violations.push(FieldViolation::new("dueDate", "Please add a due date"));
                None
            }
            Some(raw) => {
                let parsed = parse_due_date(raw);
                if parsed.is_none() {
                    violations.push(FieldViolation::new("dueDate", "Please add a valid due date"));
                }
                parsed
            }
        };

        let assigned_to = match draft.assigned_to.as_deref() {
            None => {
                violations.push(FieldViolation::new(
                    "assignedTo",
                    "Please assign the task to a user",
                ));
                None
            }
            Some(raw) => {
                let parsed = parse_uuid(Some(raw));
                if parsed.is_none() {
                    violations.push(FieldViolation::new("assignedTo", "Invalid assigned user id"));
                }
                parsed
            }
        };

        let created_by = draft.created_by.as_deref().and_then(|raw| {
            let parsed = parse_uuid(Some(raw));
            if parsed.is_none() {
                violations.push(FieldViolation::new("createdBy", "Invalid creator id"));
            }
            parsed
        });

        let tags = draft.tags.unwrap_or_default();
        if tags.iter().any(|t| t.chars().count() > TAG_MAX_CHARS) {
            violations.push(FieldViolation::new(
                "tags",
                "Tag cannot be more than 20 characters",
            ));
        }

        validation::finish(violations)?;

        match (draft.title, draft.description, due_date, assigned_to) {
            (Some(title), Some(description), Some(due_date), Some(assigned_to)) => Ok(TaskFields {
                title,
                description,
                status: status.unwrap_or_default(),
                priority: priority.unwrap_or_default(),
                due_date,
                assigned_to,
                created_by,
                tags,
            }),
            _ => Err(Violations::single("task", "Task is incomplete")),
        }
    }
}

/// Request body for a partial task update
///
/// Supplied fields replace the stored ones before the whole record is
/// validated again. The creator cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub assigned_to: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl TaskChanges {
    /// The new assignee id, when one was supplied in a valid shape
    pub fn assigned_to_id(&self) -> Option<Uuid> {
        parse_uuid(self.assigned_to.as_deref())
    }

    /// Builds the draft of the record as it would look after the update
    pub fn merge_onto(self, task: &Task) -> NewTask {
        NewTask {
            title: Some(self.title.unwrap_or_else(|| task.title.clone())),
            description: Some(self.description.unwrap_or_else(|| task.description.clone())),
            status: Some(self.status.unwrap_or_else(|| task.status.as_str().to_string())),
            priority: Some(self.priority.unwrap_or_else(|| task.priority.as_str().to_string())),
            due_date: Some(self.due_date.unwrap_or_else(|| task.due_date.to_rfc3339())),
            assigned_to: Some(self.assigned_to.unwrap_or_else(|| task.assigned_to.to_string())),
            created_by: Some(task.created_by.to_string()),
            tags: Some(self.tags.unwrap_or_else(|| task.tags.clone())),
        }
    }
}

/// Request body for appending a comment
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewComment {
    pub user: Option<String>,

    #[validate(
        required(message = "Please add a comment"),
        length(max = 1000, message = "Comment cannot be more than 1000 characters")
    )]
    pub text: Option<String>,
}

impl NewComment {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            text: Some(text.into()),
        }
    }

    /// Validates the author id shape and the text, returning both
    pub fn into_parts(self) -> Result<(Uuid, String), Violations> {
        let draft = Self {
            user: clean(self.user),
            text: self.text.filter(|t| !t.trim().is_empty()),
        };

        let mut violations = match draft.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation::from_validator_errors(&errors, &[]),
        };

        let user = match draft.user.as_deref() {
            None => {
                violations.push(FieldViolation::new("user", "Please specify the comment author"));
                None
            }
            Some(raw) => {
                let parsed = parse_uuid(Some(raw));
                if parsed.is_none() {
                    violations.push(FieldViolation::new("user", "Invalid user id"));
                }
                parsed
            }
        };

        validation::finish(violations)?;

        match (user, draft.text) {
            (Some(user), Some(text)) => Ok((user, text)),
            _ => Err(Violations::single("text", "Please add a comment")),
        }
    }
}

/// Exact-match filters for task listings; all present filters must hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
}

impl TaskFilter {
    /// Builds a filter from raw query values; empty values mean "no filter"
    pub fn from_query(
        status: Option<&str>,
        priority: Option<&str>,
        assigned_to: Option<&str>,
    ) -> Result<Self, Violations> {
        let mut violations = Vec::new();
        let status = parse_variant::<TaskStatus>(non_empty(status), "status", &mut violations);
        let priority =
            parse_variant::<TaskPriority>(non_empty(priority), "priority", &mut violations);

        let assigned_to = non_empty(assigned_to).and_then(|raw| {
            let parsed = parse_uuid(Some(raw));
            if parsed.is_none() {
                violations.push(FieldViolation::new("assignedTo", "Invalid assigned user id"));
            }
            parsed
        });

        validation::finish(violations)?;
        Ok(Self {
            status,
            priority,
            assigned_to,
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
            && self.assigned_to.map_or(true, |u| task.assigned_to == u)
    }
}

/// A comment with its author resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDetails {
    pub id: Uuid,
    /// `None` when the author id matches no user
    pub user: Option<CommentAuthor>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A task as returned to clients: references resolved, derived values added
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub tags: Vec<String>,
    pub comments: Vec<CommentDetails>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub summary: TaskSummary,
    pub progress: u8,
}

impl TaskDetails {
    /// Resolves a task against a user lookup table
    ///
    /// Users missing from `users` resolve to `None` rather than failing.
    pub fn resolve(task: Task, users: &HashMap<Uuid, User>, now: DateTime<Utc>) -> Self {
        let summary = task.summary(now);
        let progress = task.progress();
        let comments = task
            .comments
            .into_iter()
            .map(|c| CommentDetails {
                id: c.id,
                user: users.get(&c.user).map(User::author),
                text: c.text,
                created_at: c.created_at,
            })
            .collect();

        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            assigned_to: users.get(&task.assigned_to).map(User::summary),
            created_by: users.get(&task.created_by).map(User::summary),
            tags: task.tags,
            comments,
            completed_at: task.completed_at,
            created_at: task.created_at,
            updated_at: task.updated_at,
            summary,
            progress,
        }
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC)
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_uuid(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|r| Uuid::parse_str(r.trim()).ok())
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|r| !r.is_empty())
}

fn parse_variant<T>(raw: Option<&str>, field: &str, violations: &mut Vec<FieldViolation>) -> Option<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    match raw.map(str::parse::<T>) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(err)) => {
            violations.push(FieldViolation::new(field, err.to_string()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> NewTask {
        NewTask {
            title: Some("Test Task".to_string()),
            description: Some("This is a test task".to_string()),
            status: None,
            priority: Some("high".to_string()),
            due_date: Some("2030-01-15T10:00:00Z".to_string()),
            assigned_to: Some(Uuid::new_v4().to_string()),
            created_by: None,
            tags: Some(vec!["test".to_string(), "urgent".to_string()]),
        }
    }

    fn task(status: TaskStatus, due_in: Duration) -> Task {
        let now = Utc::now();
        let mut fields = draft().into_fields().unwrap();
        fields.status = status;
        fields.due_date = now + due_in;
        Task::new(fields, now)
    }

    #[test]
    fn test_status_and_priority_parsing() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("urgent".parse::<TaskPriority>().unwrap(), TaskPriority::Urgent);
        assert!("overdue".parse::<TaskStatus>().is_err());
        assert!("invalid-priority".parse::<TaskPriority>().is_err());
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            serde_json::json!("in-progress")
        );
    }

    #[test]
    fn test_defaults_applied() {
        let mut input = draft();
        input.priority = None;
        let fields = input.into_fields().unwrap();
        assert_eq!(fields.status, TaskStatus::Pending);
        assert_eq!(fields.priority, TaskPriority::Medium);
        assert_eq!(fields.created_by, None);
    }

    #[test]
    fn test_created_by_defaults_to_assignee() {
        let fields = draft().into_fields().unwrap();
        let assignee = fields.assigned_to;
        let task = Task::new(fields, Utc::now());
        assert_eq!(task.created_by, assignee);
    }

    #[test]
    fn test_required_fields_all_reported() {
        let violations = NewTask::default().into_fields().unwrap_err();
        assert!(violations.contains_field("title"));
        assert!(violations.contains_field("description"));
        assert!(violations.contains_field("dueDate"));
        assert!(violations.contains_field("assignedTo"));
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn test_title_length_limit() {
        let mut input = draft();
        input.title = Some("a".repeat(101));
        let violations = input.into_fields().unwrap_err();
        assert!(violations.contains_field("title"));
        assert_eq!(
            violations.as_slice()[0].message,
            "Title cannot be more than 100 characters"
        );

        let mut input = draft();
        input.title = Some("a".repeat(100));
        assert!(input.into_fields().is_ok());
    }

    #[test]
    fn test_description_length_limit() {
        let mut input = draft();
        input.description = Some("a".repeat(501));
        assert!(input.violations().iter().any(|v| v.field == "description"));
    }

    #[test]
    fn test_invalid_enums() {
        let mut input = draft();
        input.status = Some("invalid-status".to_string());
        input.priority = Some("invalid-priority".to_string());
        let violations = input.into_fields().unwrap_err();
        assert!(violations.contains_field("status"));
        assert!(violations.contains_field("priority"));
    }

    #[test]
    fn test_tag_length_limit() {
        let mut input = draft();
        input.tags = Some(vec!["ok".to_string(), "a".repeat(21)]);
        let violations = input.into_fields().unwrap_err();
        assert!(violations.contains_field("tags"));
    }

    #[test]
    fn test_duplicate_tags_kept() {
        let mut input = draft();
        input.tags = Some(vec![" dup ".to_string(), "dup".to_string()]);
        let fields = input.into_fields().unwrap();
        assert_eq!(fields.tags, vec!["dup".to_string(), "dup".to_string()]);
    }

    #[test]
    fn test_due_date_formats() {
        assert!(parse_due_date("2030-01-15T10:00:00Z").is_some());
        assert!(parse_due_date("2030-01-15T10:00:00.000+02:00").is_some());
        assert_eq!(
            parse_due_date("2030-01-15").unwrap().to_rfc3339(),
            "2030-01-15T00:00:00+00:00"
        );
        assert!(parse_due_date("invalid-date").is_none());

        let mut input = draft();
        input.due_date = Some("invalid-date".to_string());
        assert!(input.into_fields().unwrap_err().contains_field("dueDate"));
    }

    #[test]
    fn test_malformed_ids_are_field_violations() {
        let mut input = draft();
        input.assigned_to = Some("invalid-id".to_string());
        input.created_by = Some("also-invalid".to_string());
        let violations = input.into_fields().unwrap_err();
        assert!(violations.contains_field("assignedTo"));
        assert!(violations.contains_field("createdBy"));
    }

    #[test]
    fn test_progress_mapping() {
        assert_eq!(TaskStatus::Pending.progress(), 0);
        assert_eq!(TaskStatus::InProgress.progress(), 50);
        assert_eq!(TaskStatus::Completed.progress(), 100);
        assert_eq!(TaskStatus::Cancelled.progress(), 0);
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc::now();
        let past = task(TaskStatus::Pending, Duration::days(-1));
        assert!(past.is_overdue(now));

        let done = task(TaskStatus::Completed, Duration::days(-1));
        assert!(!done.is_overdue(now));

        let future = task(TaskStatus::Pending, Duration::days(1));
        assert!(!future.is_overdue(now));
    }

    #[test]
    fn test_due_exactly_now_is_not_overdue() {
        let t = task(TaskStatus::Pending, Duration::days(1));
        assert!(!t.is_overdue(t.due_date));
        assert!(!t.is_listed_overdue(t.due_date));
        assert!(t.is_listed_overdue(t.due_date + Duration::milliseconds(1)));
    }

    #[test]
    fn test_cancelled_is_overdue_but_not_listed() {
        let now = Utc::now();
        let t = task(TaskStatus::Cancelled, Duration::days(-1));
        assert!(t.is_overdue(now));
        assert!(!t.is_listed_overdue(now));
    }

    #[test]
    fn test_completed_at_kept_when_leaving_completed() {
        let mut t = task(TaskStatus::Pending, Duration::days(1));
        assert!(t.completed_at.is_none());

        let done_at = Utc::now();
        t.set_status(TaskStatus::Completed, done_at);
        assert_eq!(t.completed_at, Some(done_at));

        t.set_status(TaskStatus::InProgress, done_at + Duration::seconds(5));
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.completed_at, Some(done_at));
    }

    #[test]
    fn test_apply_stamps_only_on_entering_completed() {
        let mut t = task(TaskStatus::Pending, Duration::days(1));
        let mut fields = draft().into_fields().unwrap();
        fields.status = TaskStatus::Completed;

        let first = Utc::now();
        t.apply(fields.clone(), first);
        assert_eq!(t.completed_at, Some(first));

        // Already completed: the original stamp stays
        t.apply(fields, first + Duration::seconds(5));
        assert_eq!(t.completed_at, Some(first));
    }

    #[test]
    fn test_summary() {
        let now = Utc::now();
        let t = task(TaskStatus::InProgress, Duration::days(-2));
        let summary = t.summary(now);
        assert_eq!(summary.id, t.id);
        assert_eq!(summary.title, "Test Task");
        assert!(summary.is_overdue);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["isOverdue"], true);
        assert_eq!(json["status"], "in-progress");
    }

    #[test]
    fn test_merge_revalidates_full_record() {
        let t = task(TaskStatus::Pending, Duration::days(1));
        let changes = TaskChanges {
            title: Some("a".repeat(101)),
            ..Default::default()
        };
        let violations = changes.merge_onto(&t).into_fields().unwrap_err();
        assert!(violations.contains_field("title"));

        let changes = TaskChanges {
            priority: Some("urgent".to_string()),
            ..Default::default()
        };
        let fields = changes.merge_onto(&t).into_fields().unwrap();
        assert_eq!(fields.priority, TaskPriority::Urgent);
        assert_eq!(fields.title, t.title);
        assert_eq!(fields.due_date, t.due_date);
        assert_eq!(fields.created_by, Some(t.created_by));
    }

    #[test]
    fn test_merge_blank_title_fails_required() {
        let t = task(TaskStatus::Pending, Duration::days(1));
        let changes = TaskChanges {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        let violations = changes.merge_onto(&t).into_fields().unwrap_err();
        assert_eq!(violations.as_slice()[0].message, "Please add a task title");
    }

    #[test]
    fn test_comment_validation() {
        let user = Uuid::new_v4();
        let (id, text) = NewComment::new(user.to_string(), "hello").into_parts().unwrap();
        assert_eq!(id, user);
        assert_eq!(text, "hello");

        let violations = NewComment::new(user.to_string(), "a".repeat(1001))
            .into_parts()
            .unwrap_err();
        assert!(violations.contains_field("text"));

        let violations = NewComment::new("not-a-user", "").into_parts().unwrap_err();
        assert!(violations.contains_field("text"));
        assert!(violations.contains_field("user"));
    }

    #[test]
    fn test_filter_from_query() {
        let user = Uuid::new_v4();
        let filter =
            TaskFilter::from_query(Some("completed"), Some(""), Some(&user.to_string())).unwrap();
        assert_eq!(filter.status, Some(TaskStatus::Completed));
        assert_eq!(filter.priority, None);
        assert_eq!(filter.assigned_to, Some(user));

        assert_eq!(TaskFilter::from_query(None, None, None).unwrap(), TaskFilter::default());

        let violations = TaskFilter::from_query(Some("nope"), None, Some("bad")).unwrap_err();
        assert!(violations.contains_field("status"));
        assert!(violations.contains_field("assignedTo"));
    }

    #[test]
    fn test_filter_matches_and_combined() {
        let t = task(TaskStatus::Pending, Duration::days(1));
        let filter = TaskFilter {
            status: Some(TaskStatus::Pending),
            priority: Some(TaskPriority::High),
            assigned_to: Some(t.assigned_to),
        };
        assert!(filter.matches(&t));

        let filter = TaskFilter {
            priority: Some(TaskPriority::Low),
            ..filter
        };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_resolve_with_missing_users() {
        let now = Utc::now();
        let mut t = task(TaskStatus::Completed, Duration::days(-1));
        t.comments.push(Comment::new(Uuid::new_v4(), "orphan".to_string(), now));

        let details = TaskDetails::resolve(t, &HashMap::new(), now);
        assert!(details.assigned_to.is_none());
        assert!(details.comments[0].user.is_none());
        assert_eq!(details.progress, 100);
        assert!(!details.summary.is_overdue);
    }
}
