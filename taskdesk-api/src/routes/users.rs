/// User endpoints
///
/// ```text
/// GET    /api/users?page&limit   list (paginated, newest first)
/// POST   /api/users              create
/// GET    /api/users/stats        counts per role
/// GET    /api/users/:id          fetch one
/// PUT    /api/users/:id          partial update
/// DELETE /api/users/:id          soft delete
/// ```
///
/// Responses never contain the password hash.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, Empty},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use taskdesk_shared::models::parse_id;
use taskdesk_shared::models::user::{NewUser, User, UserChanges, UserStats};
use taskdesk_shared::pagination::Pagination;
use taskdesk_shared::StoreError;

/// Raw page/limit values; parsing is lenient
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<ApiResponse<Vec<User>>> {
    let pagination = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());
    let page = state.users.list_users(pagination).await?;
    Ok(ApiResponse::page(page))
}

pub async fn user_stats(State(state): State<AppState>) -> ApiResult<ApiResponse<UserStats>> {
    let stats = state.users.get_stats().await?;
    Ok(ApiResponse::ok(stats))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<User>> {
    let id = parse_id("user", &id)?;
    let user = state.users.get_user(id).await?;
    Ok(ApiResponse::ok(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<ApiResponse<User>> {
    let Json(input) = payload?;
    let user = state.users.create_user(input).await?;
    Ok(ApiResponse::created(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserChanges>, JsonRejection>,
) -> ApiResult<ApiResponse<User>> {
    let id = parse_id("user", &id)?;
    let Json(changes) = payload?;

    let user = state
        .users
        .update_user(id, changes)
        .await
        .map_err(|err| match err {
            StoreError::DuplicateEmail => ApiError::BadRequest("Email is already taken".to_string()),
            other => other.into(),
        })?;

    Ok(ApiResponse::ok(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Empty>> {
    let id = parse_id("user", &id)?;
    state.users.delete_user(id).await?;
    Ok(ApiResponse::empty())
}
