/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "backend": "postgres",
///   "pool": { "activeConnections": 1, "idleConnections": 4, "totalConnections": 5 }
/// }
/// ```
///
/// The endpoint always answers 200; a failed ping reports `degraded`.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use taskdesk_shared::db::pool::PoolStats;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    /// Storage backend name (`postgres` or `memory`)
    pub backend: String,

    /// Connection pool usage, Postgres only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        backend: state.db.backend_name().to_string(),
        pool: state.db.pool_stats(),
    })
}
