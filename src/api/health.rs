use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::json;

use crate::app_state::AppState;
use crate::upstream::client::UpstreamError;

/// Defines health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(liveness_check))  // ✅ Liveness check
        .route("/health/ready", get(readiness_check)) // ✅ Readiness check
}

/// **Liveness Check (Basic Check)**
/// - ✅ Verifies that the gateway is running
/// - ❌ Does NOT check the upstream Unite API
async fn liveness_check() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "Gateway is live" }))
}

/// **Readiness Check (Upstream Connectivity Check)**
/// - ✅ Ensures the Unite API answers at all (any HTTP response counts)
/// - ❌ Returns `500` if the upstream is unreachable or timing out
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match state.upstream.get_json("/api/public/events", None).await {
        // An HTTP-level error still means the upstream is up and talking.
        Ok(_) | Err(UpstreamError::Api { .. }) => {
            Ok(Json(json!({ "success": true, "message": "Gateway is ready" })))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "success": false, "error": "Unite API unavailable", "details": e.user_message() })
                .to_string(),
        )),
    }
}
