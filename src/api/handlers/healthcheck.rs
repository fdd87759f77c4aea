use axum::{extract::State, http::StatusCode};
use serde::Serialize;

use crate::api::{ApiResponse, ApiState};
use crate::storage::{check_connection, get_pool_stats};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub pool_size: u32,
    pub idle_connections: usize,
}

pub async fn healthcheck_handler(State(state): State<ApiState>) -> ApiResponse<HealthStatus> {
    let stats = get_pool_stats(&state.pool);

    match check_connection(&state.pool).await {
        Ok(()) => ApiResponse::ok(
            HealthStatus {
                status: "OK",
                database: "up",
                pool_size: stats.size,
                idle_connections: stats.idle,
            },
            "Health check passed",
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check database query failed");
            ApiResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                HealthStatus {
                    status: "DEGRADED",
                    database: "down",
                    pool_size: stats.size,
                    idle_connections: stats.idle,
                },
                "Database unavailable",
            )
        }
    }
}
