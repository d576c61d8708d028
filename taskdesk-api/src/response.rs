/// Success envelope shared by every endpoint
///
/// ```json
/// { "success": true, "count": 2, "pagination": { ... }, "data": [ ... ] }
/// ```
///
/// `count` and `pagination` only appear on list responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::pagination::{Page, PageMeta};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,

    pub data: T,

    #[serde(skip)]
    status: StatusCode,
}

/// Empty object used as `data` on deletes
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Empty {}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            count: None,
            pagination: None,
            data,
            status: StatusCode::OK,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Unpaginated list with its length
    pub fn list(data: Vec<T>) -> Self {
        Self {
            count: Some(data.len()),
            ..Self::ok(data)
        }
    }

    /// One page of a listing; `count` is the size of this page
    pub fn page(page: Page<T>) -> Self {
        Self {
            pagination: Some(page.meta),
            ..Self::list(page.items)
        }
    }
}

impl ApiResponse<Empty> {
    pub fn empty() -> Self {
        Self::ok(Empty {})
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
