//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Reads the durable counter snapshot
/// 2. **Counter**: PING against the fast tier holding the counter
/// 3. **Cache**: PING against the redirect cache
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected, durable counter at 1042" },
///     "counter": { "status": "ok", "message": "Fast tier connected" },
///     "cache": { "status": "ok", "message": "Cache connected" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (database, counter, cache) = tokio::join!(
        check_database(&state),
        check_counter(&state),
        check_cache(&state)
    );

    let all_healthy = database.is_ok() && counter.is_ok() && cache.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            counter,
            cache,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.counter.durable_snapshot().await {
        Ok(Some(snapshot)) => CheckStatus::ok(format!(
            "Connected, durable counter at {}",
            snapshot.counter
        )),
        Ok(None) => CheckStatus::ok("Connected, counter not initialized"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

async fn check_counter(state: &AppState) -> CheckStatus {
    if state.counter.health_check().await {
        CheckStatus::ok("Fast tier connected")
    } else {
        CheckStatus::error("Fast tier connection failed")
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Cache connected")
    } else {
        CheckStatus::error("Cache connection failed")
    }
}
