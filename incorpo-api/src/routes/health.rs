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
///   "environment": "development",
///   "database": "connected",
///   "pool": { "activeConnections": 1, "idleConnections": 4, "totalConnections": 5 },
///   "rateLimiting": "enabled"
/// }
/// ```
///
/// `rateLimiting` is `disabled` without `REDIS_URL` and `degraded` when Redis
/// does not answer PING; requests are then let through unthrottled.

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use incorpo_shared::db::pool::{get_pool_stats, health_check as db_health_check, PoolStats};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub version: String,
    pub environment: String,
    pub database: String,
    pub pool: PoolStats,
    pub rate_limiting: String,
}

/// Reports service health; 503 when the database is unreachable
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match db_health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let rate_limiting = match &state.redis {
        None => "disabled",
        Some(redis) => {
            if redis.stats().await.healthy {
                "enabled"
            } else {
                "degraded"
            }
        }
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database_ok { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.config.environment.as_str().to_string(),
            database: if database_ok { "connected" } else { "disconnected" }.to_string(),
            pool: get_pool_stats(&state.db),
            rate_limiting: rate_limiting.to_string(),
        }),
    )
}
