use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::middleware::auth::{BearerToken, Viewer};
use crate::upstream::models::event::EventSummary;
use crate::upstream::normalize;
use crate::utils::api_response::ApiResponse;
use crate::workflow::refresh::RefreshReason;

/// Authenticated event creation routes.
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events/direct", post(create_direct_event))
        .route("/events", post(create_event))
}

/// Published calendar feed, no authentication required.
pub fn public_event_routes() -> Router<AppState> {
    Router::new().route("/public/events", get(public_events))
}

#[utoipa::path(
    post,
    path = "/events/direct",
    responses(
        (status = 201, description = "Event created directly, bypassing review"),
        (status = 403, description = "Only admins may create events directly")
    ),
    tag = "Events",
    security(("bearerAuth" = []))
)]
pub async fn create_direct_event(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Extension(viewer): Extension<Viewer>,
    Json(payload): Json<Value>,
) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    if !viewer.has_admin_role() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only admins may create events directly",
            None,
        ));
    }
    let body = state
        .upstream
        .post_json("/api/events/direct", Some(&token.0), &payload)
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    state.cache.force_refresh();
    state.refresh.signal(RefreshReason::EventCreated);
    Ok(ApiResponse::success(StatusCode::CREATED, "Event created", body))
}

#[utoipa::path(
    post,
    path = "/events",
    responses(
        (status = 201, description = "Event request submitted for review")
    ),
    tag = "Events",
    security(("bearerAuth" = []))
)]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Json(payload): Json<Value>,
) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    let body = state
        .upstream
        .post_json("/api/events", Some(&token.0), &payload)
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    state.cache.force_refresh();
    state.refresh.signal(RefreshReason::EventCreated);
    Ok(ApiResponse::success(StatusCode::CREATED, "Event request submitted", body))
}

#[derive(serde::Serialize, ToSchema)]
pub struct CalendarFeed {
    pub events: Vec<EventSummary>,
    pub total: usize,
}

#[utoipa::path(
    get,
    path = "/public/events",
    params(
        ("from" = Option<String>, Query, description = "Feed window start"),
        ("to" = Option<String>, Query, description = "Feed window end")
    ),
    responses(
        (status = 200, description = "Published calendar events", body = CalendarFeed)
    ),
    tag = "Events"
)]
pub async fn public_events(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<CalendarFeed>, ApiResponse<()>> {
    let mut path = "/api/public/events".to_string();
    let mut window: Vec<(&str, &String)> = ["from", "to"]
        .iter()
        .filter_map(|key| params.get(*key).map(|value| (*key, value)))
        .collect();
    window.sort_by_key(|(key, _)| *key);
    if !window.is_empty() {
        let query = window
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        path = format!("{path}?{query}");
    }

    let body = match state.cache.get(&path) {
        Some(cached) => cached,
        None => {
            let ticket = state.cache.begin_fetch();
            let fetched = state
                .upstream
                .get_json(&path, None)
                .await
                .map_err(|e| ApiResponse::from_upstream(&e))?;
            state.cache.store(ticket, &path, fetched.clone());
            fetched
        }
    };

    let events: Vec<EventSummary> = event_items(&body)
        .into_iter()
        .map(normalize::normalize_event)
        .collect();
    let total = events.len();
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Calendar feed retrieved",
        CalendarFeed { events, total },
    ))
}

fn event_items(body: &Value) -> Vec<&Value> {
    if let Some(items) = body.as_array() {
        return items.iter().collect();
    }
    for key in ["data", "events", "items"] {
        if let Some(items) = body.get(key).and_then(Value::as_array) {
            return items.iter().collect();
        }
    }
    Vec::new()
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(create_direct_event, create_event, public_events),
    components(schemas(CalendarFeed)),
    tags(
        (name = "Events", description = "Event creation and the public calendar feed")
    )
)]
pub struct EventDoc;
