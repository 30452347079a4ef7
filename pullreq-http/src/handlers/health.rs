use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

use crate::dto::HealthResponse;
use crate::AppState;

/// GET /health
///
/// 503 while the store cannot be reached.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.health.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                }),
            )
        }
    }
}
