/// Task endpoints
///
/// ```text
/// GET    /api/tasks?page&limit&status&priority&assignedTo
/// POST   /api/tasks
/// GET    /api/tasks/overdue
/// GET    /api/tasks/user/:userId
/// GET    /api/tasks/:id
/// PUT    /api/tasks/:id
/// DELETE /api/tasks/:id
/// POST   /api/tasks/:id/comments      { "userId": "...", "text": "..." }
/// PATCH  /api/tasks/:id/status        { "status": "completed" }
/// ```
///
/// Every task in a response has its user references resolved to
/// `{id, name, email}` (comment authors to `{id, name}`).

use crate::{
    app::AppState,
    error::ApiResult,
    response::{ApiResponse, Empty},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use taskdesk_shared::models::parse_id;
use taskdesk_shared::models::task::{NewComment, NewTask, TaskChanges, TaskDetails, TaskFilter};
use taskdesk_shared::pagination::Pagination;
use taskdesk_shared::StoreError;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub user_id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

fn task_id(raw: &str) -> ApiResult<Uuid> {
    Ok(parse_id("task", raw)?)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<ApiResponse<Vec<TaskDetails>>> {
    let pagination = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());
    let filter = TaskFilter::from_query(
        query.status.as_deref(),
        query.priority.as_deref(),
        query.assigned_to.as_deref(),
    )
    .map_err(StoreError::from)?;

    let page = state.tasks.list_tasks(pagination, &filter).await?;
    Ok(ApiResponse::page(page))
}

pub async fn overdue_tasks(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<TaskDetails>>> {
    let tasks = state.tasks.find_overdue().await?;
    Ok(ApiResponse::list(tasks))
}

pub async fn tasks_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<TaskDetails>>> {
    let user_id = parse_id("user", &user_id)?;
    let tasks = state.tasks.find_by_user(user_id).await?;
    Ok(ApiResponse::list(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<TaskDetails>> {
    let task = state.tasks.get_task(task_id(&id)?).await?;
    Ok(ApiResponse::ok(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<ApiResponse<TaskDetails>> {
    let Json(input) = payload?;
    let task = state.tasks.create_task(input).await?;
    Ok(ApiResponse::created(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskChanges>, JsonRejection>,
) -> ApiResult<ApiResponse<TaskDetails>> {
    let id = task_id(&id)?;
    let Json(changes) = payload?;
    let task = state.tasks.update_task(id, changes).await?;
    Ok(ApiResponse::ok(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Empty>> {
    state.tasks.delete_task(task_id(&id)?).await?;
    Ok(ApiResponse::empty())
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<TaskDetails>> {
    let id = task_id(&id)?;
    let Json(body) = payload?;

    let comment = NewComment {
        user: body.user_id,
        text: body.text,
    };
    let task = state.tasks.add_comment(id, comment).await?;
    Ok(ApiResponse::ok(task))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<TaskDetails>> {
    let id = task_id(&id)?;
    let Json(body) = payload?;
    let task = state
        .tasks
        .set_status(id, body.status.as_deref().unwrap_or_default())
        .await?;
    Ok(ApiResponse::ok(task))
}
