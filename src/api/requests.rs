use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::middleware::auth::{BearerToken, Viewer};
use crate::upstream::models::event::EventSummary;
use crate::upstream::models::request::EventRequest;
use crate::upstream::normalize;
use crate::utils::api_response::ApiResponse;
use crate::workflow::detail::{self, CategoryDetail, DetailView};
use crate::workflow::dialog::DialogKind;
use crate::workflow::dispatch::{ActionSubmission, DispatchOutcome, RequestAction};
use crate::workflow::permissions::derive_actions;
use crate::workflow::refresh::RefreshReason;
use crate::workflow::status::{derive_label, pending_stage, StatusLabel};

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/event-requests", get(list_requests))
        .route("/event-requests/refresh", post(force_refresh))
        .route(
            "/event-requests/{request_id}",
            get(get_request).delete(delete_request),
        )
        .route("/event-requests/{request_id}/actions", post(submit_request_action))
}

/// One request as the dashboard renders it: canonical fields plus the
/// derived, viewer-specific decorations.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: String,
    pub status: String,
    pub status_label: StatusLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_stage: Option<String>,
    pub allowed_actions: Vec<String>,
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stakeholder_id: Option<String>,
    pub event: EventSummary,
}

impl RequestView {
    pub fn build(request: &EventRequest, viewer: &Viewer) -> Self {
        let actions = derive_actions(request, viewer);
        Self {
            id: request.id.clone(),
            status: request.status.as_str().to_string(),
            status_label: derive_label(request),
            pending_stage: pending_stage(request),
            allowed_actions: actions.names().iter().map(|n| n.to_string()).collect(),
            is_edit: request.is_edit,
            coordinator_id: request.coordinator_id.clone(),
            stakeholder_id: request.stakeholder_id.clone(),
            event: request.event.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetailView {
    #[serde(flatten)]
    pub request: RequestView,
    pub detail_view: DetailView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_detail: Option<CategoryDetail>,
    pub open_dialogs: Vec<DialogKind>,
}

/// Body for the action endpoint. `proposedDate` and the older
/// `rescheduledDate` are both accepted.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequestBody {
    pub action: String,
    pub note: Option<String>,
    #[serde(alias = "rescheduledDate")]
    pub proposed_date: Option<DateTime<Utc>>,
}

// Query parameters forwarded upstream. Sorted into a stable cache key so
// `?limit=10&skip=0` and `?skip=0&limit=10` hit the same entry.
const FORWARDED_PARAMS: &[&str] = &["skip", "limit", "status", "search", "category", "district", "from", "to"];

fn list_path(params: &HashMap<String, String>) -> String {
    let mut forwarded: Vec<(&str, &String)> = FORWARDED_PARAMS
        .iter()
        .filter_map(|key| params.get(*key).map(|value| (*key, value)))
        .collect();
    forwarded.sort_by_key(|(key, _)| *key);

    if forwarded.is_empty() {
        return "/api/event-requests".to_string();
    }
    let query = forwarded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("/api/event-requests?{query}")
}

fn session_key(viewer: &Viewer, token: &BearerToken) -> String {
    viewer
        .id
        .clone()
        .unwrap_or_else(|| format!("token:{}", token.0))
}

/// Hard delete is the one action gated here and not just upstream: it is
/// irreversible, admin-only, and only legal from the cancelled state unless
/// the backend explicitly granted canDelete.
fn ensure_deletable(request: &EventRequest, viewer: &Viewer) -> Result<(), ApiResponse<()>> {
    if request.grants.can_delete == Some(true) {
        return Ok(());
    }
    if !viewer.has_admin_role() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only admins may delete requests",
            None,
        ));
    }
    if derive_label(request) != StatusLabel::Cancelled {
        return Err(ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "A request must be cancelled before it can be deleted",
            None,
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/event-requests",
    params(
        ("skip" = Option<u32>, Query, description = "Pagination offset"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("status" = Option<String>, Query, description = "Workflow status filter"),
        ("search" = Option<String>, Query, description = "Free-text search")
    ),
    responses(
        (status = 200, description = "Decorated request list", body = Vec<RequestView>),
        (status = 502, description = "Unite API unavailable")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Extension(viewer): Extension<Viewer>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    let path = list_path(&params);

    let body = match state.cache.get(&path) {
        Some(cached) => cached,
        None => {
            let ticket = state.cache.begin_fetch();
            let fetched = state
                .upstream
                .get_json(&path, Some(&token.0))
                .await
                .map_err(|e| ApiResponse::from_upstream(&e))?;
            state.cache.store(ticket, &path, fetched.clone());
            fetched
        }
    };

    let mut views = Vec::new();
    let mut dropped = 0usize;
    for raw in normalize::request_items(&body) {
        match normalize::normalize_request(raw) {
            Ok(request) => views.push(RequestView::build(&request, &viewer)),
            Err(_) => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, "skipped request records that failed normalization");
    }

    let payload = json!({
        "requests": views,
        "statusCounts": body.get("statusCounts").cloned().unwrap_or(Value::Null),
        "total": body.get("total").cloned().unwrap_or_else(|| json!(views.len())),
    });
    Ok(ApiResponse::success(StatusCode::OK, "Event requests retrieved", payload))
}

#[utoipa::path(
    get,
    path = "/event-requests/{request_id}",
    params(
        ("request_id" = String, Path, description = "Event request ID")
    ),
    responses(
        (status = 200, description = "Request detail with derived view selection", body = RequestDetailView),
        (status = 404, description = "Request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_request(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Extension(viewer): Extension<Viewer>,
    Path(request_id): Path<String>,
) -> Result<ApiResponse<RequestDetailView>, ApiResponse<()>> {
    let request = state
        .upstream
        .fetch_request(Some(&token.0), &request_id)
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    let open_dialogs = state
        .sessions
        .with_board(&session_key(&viewer, &token), |board| {
            board
                .card(&request.id)
                .map(|card| card.open_dialogs())
                .unwrap_or_default()
        });

    let detail = RequestDetailView {
        detail_view: detail::select_view(&request),
        category_detail: detail::category_detail(&request),
        open_dialogs,
        request: RequestView::build(&request, &viewer),
    };
    Ok(ApiResponse::success(StatusCode::OK, "Event request retrieved", detail))
}

#[utoipa::path(
    post,
    path = "/event-requests/{request_id}/actions",
    params(
        ("request_id" = String, Path, description = "Event request ID")
    ),
    request_body = ActionRequestBody,
    responses(
        (status = 200, description = "Action dispatched (directly or recovered after timeout)", body = DispatchOutcome),
        (status = 400, description = "Unknown action or missing note"),
        (status = 504, description = "Action timed out and could not be verified")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_request_action(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Extension(viewer): Extension<Viewer>,
    Path(request_id): Path<String>,
    Json(body): Json<ActionRequestBody>,
) -> Result<ApiResponse<DispatchOutcome>, ApiResponse<()>> {
    let Some(action) = RequestAction::parse(&body.action) else {
        return Err(ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            format!("Unknown action '{}'", body.action),
            None,
        ));
    };

    let request = state
        .upstream
        .fetch_request(Some(&token.0), &request_id)
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    if action == RequestAction::Delete {
        ensure_deletable(&request, &viewer)?;
    }

    let submission = ActionSubmission {
        action,
        note: body.note,
        rescheduled_date: body.proposed_date,
    };

    let outcome = state
        .dispatcher()
        .submit(&viewer, &token.0, &request, submission)
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    state
        .sessions
        .with_board(&session_key(&viewer, &token), |board| {
            board
                .card_mut(&request.id)
                .submission_succeeded(action.dialog_kind());
        });

    Ok(ApiResponse::success(StatusCode::OK, "Action completed", outcome))
}

#[utoipa::path(
    delete,
    path = "/event-requests/{request_id}",
    params(
        ("request_id" = String, Path, description = "Event request ID")
    ),
    responses(
        (status = 200, description = "Request deleted", body = DispatchOutcome),
        (status = 400, description = "Request is not in a deletable state"),
        (status = 403, description = "Only admins may delete requests")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn delete_request(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Extension(viewer): Extension<Viewer>,
    Path(request_id): Path<String>,
) -> Result<ApiResponse<DispatchOutcome>, ApiResponse<()>> {
    let request = state
        .upstream
        .fetch_request(Some(&token.0), &request_id)
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    ensure_deletable(&request, &viewer)?;

    let submission = ActionSubmission {
        action: RequestAction::Delete,
        note: None,
        rescheduled_date: None,
    };
    let outcome = state
        .dispatcher()
        .submit(&viewer, &token.0, &request, submission)
        .await
        .map_err(|e| ApiResponse::from_upstream(&e))?;

    state
        .sessions
        .with_board(&session_key(&viewer, &token), |board| {
            board
                .card_mut(&request.id)
                .submission_succeeded(DialogKind::Delete);
        });

    Ok(ApiResponse::success(StatusCode::OK, "Request deleted", outcome))
}

#[utoipa::path(
    post,
    path = "/event-requests/refresh",
    responses(
        (status = 200, description = "List cache dropped and refresh broadcast")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn force_refresh(State(state): State<AppState>) -> ApiResponse<Value> {
    // Abandons in-flight list fetches so a slow stale response cannot land
    // over the data the next fetch brings back.
    state.cache.force_refresh();
    state.refresh.signal(RefreshReason::Forced);
    ApiResponse::success(StatusCode::OK, "Refresh triggered", json!({"forced": true}))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(
        list_requests,
        get_request,
        submit_request_action,
        delete_request,
        force_refresh
    ),
    components(schemas(RequestView, RequestDetailView, ActionRequestBody, DispatchOutcome)),
    tags(
        (name = "Requests", description = "Event request review workflow")
    )
)]
pub struct RequestDoc;
