// src/api/notification.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use serde_json::{json, Value};
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::middleware::auth::BearerToken;
use crate::upstream::models::notification::{Notification, NotificationCountResponse, NotificationFilter};
use crate::utils::api_response::ApiResponse;
use crate::utils::notification::{count_notifications, linked_request_id, notification_items};

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(get_notifications))
        .route("/notifications/count", get(get_notification_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{notification_id}/read", post(mark_read))
}

async fn fetch_notifications(
    state: &AppState,
    token: &BearerToken,
) -> Result<Vec<Notification>, ApiResponse<()>> {
    let path = "/api/notifications";
    let body = match state.cache.get(path) {
        Some(cached) => cached,
        None => {
            let ticket = state.cache.begin_fetch();
            let fetched = state
                .upstream
                .get_json(path, Some(&token.0))
                .await
                .map_err(|e| ApiResponse::from_upstream(&e))?;
            state.cache.store(ticket, path, fetched.clone());
            fetched
        }
    };
    Ok(notification_items(&body))
}

#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Notification list with request deep links", body = Vec<Notification>)
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Query(filter): Query<NotificationFilter>,
) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    let mut items = fetch_notifications(&state, &token).await?;

    if filter.unread_only.unwrap_or(false) {
        items.retain(|n| !n.read);
    }
    if let Some(kind) = filter.type_field.as_deref() {
        items.retain(|n| n.type_field.as_deref() == Some(kind));
    }
    let offset = filter.offset.unwrap_or(0) as usize;
    let limit = filter.limit.unwrap_or(50) as usize;

    let page: Vec<Value> = items
        .iter()
        .skip(offset)
        .take(limit)
        .map(|n| {
            let mut entry = serde_json::to_value(n).unwrap_or(Value::Null);
            if let Some(request_id) = linked_request_id(n) {
                entry["requestId"] = json!(request_id);
            }
            entry
        })
        .collect();

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notifications retrieved",
        json!({"notifications": page, "total": items.len()}),
    ))
}

#[utoipa::path(
    get,
    path = "/notifications/count",
    responses(
        (status = 200, description = "Total and unread notification counts", body = NotificationCountResponse)
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn get_notification_count(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
) -> Result<ApiResponse<NotificationCountResponse>, ApiResponse<()>> {
    let items = fetch_notifications(&state, &token).await?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notification counts",
        count_notifications(&items),
    ))
}

#[utoipa::path(
    post,
    path = "/notifications/{notification_id}/read",
    params(
        ("notification_id" = String, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked read")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Path(notification_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    let body = state
        .upstream
        .post_json(
            &format!("/api/notifications/{notification_id}/read"),
            Some(&token.0),
            &json!({}),
        )
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    state.cache.invalidate_matching(&["notifications"]);
    Ok(ApiResponse::success(StatusCode::OK, "Notification marked read", body))
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    let body = state
        .upstream
        .post_json("/api/notifications/read-all", Some(&token.0), &json!({}))
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    state.cache.invalidate_matching(&["notifications"]);
    Ok(ApiResponse::success(StatusCode::OK, "All notifications marked read", body))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_notifications, get_notification_count, mark_read, mark_all_read),
    components(schemas(Notification, NotificationCountResponse)),
    tags(
        (name = "Notifications", description = "In-app notification consumption")
    )
)]
pub struct NotificationDoc;
