/// Error handling for the API server
///
/// Every handler returns `Result<T, ApiError>`; the error renders as the
/// same envelope successful responses use, with `success: false`.
///
/// # Example
///
/// ```
/// use taskdesk_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler(found: bool) -> ApiResult<Json<&'static str>> {
///     if !found {
///         return Err(ApiError::NotFound("Task not found".to_string()));
///     }
///     Ok(Json("ok"))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskdesk_shared::validation::FieldViolation;
use taskdesk_shared::StoreError;

/// Message returned for every internal fault
pub const SERVER_ERROR: &str = "Server Error";

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Field validation failures (400)
    ValidationError(Vec<FieldViolation>),

    /// Internal server error (500); the message is logged, never returned
    InternalError(String),
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,

    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error, details) = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => (msg, None),
            ApiError::ValidationError(violations) => {
                let joined = violations
                    .iter()
                    .map(|v| v.message.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                (joined, Some(violations))
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (SERVER_ERROR.to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error,
            details,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::InvalidIdentifier { entity, value } => {
                tracing::debug!(entity, value = %value, "Malformed identifier");
                ApiError::BadRequest(format!("Invalid {} id", entity))
            }
            StoreError::Validation(violations) => ApiError::ValidationError(violations.into_vec()),
            StoreError::DuplicateEmail | StoreError::AssignedUserNotFound => {
                ApiError::BadRequest(err.to_string())
            }
            internal => ApiError::InternalError(internal.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
