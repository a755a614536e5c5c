// src/api/ui.rs
//
// Per-viewer confirmation-dialog state, so stateless dashboard clients can
// keep their open dialogs across reloads. Pure gateway-local state; nothing
// here talks to the upstream.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use serde_json::{json, Value};
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::middleware::auth::{BearerToken, Viewer};
use crate::utils::api_response::ApiResponse;
use crate::workflow::dialog::DialogKind;

pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/ui/requests/{request_id}/dialogs", get(list_dialogs))
        .route("/ui/requests/{request_id}/dialogs/{kind}/open", post(open_dialog))
        .route("/ui/requests/{request_id}/dialogs/{kind}/close", post(close_dialog))
}

fn session_key(viewer: &Viewer, token: &BearerToken) -> String {
    viewer
        .id
        .clone()
        .unwrap_or_else(|| format!("token:{}", token.0))
}

fn parse_kind(raw: &str) -> Result<DialogKind, ApiResponse<()>> {
    DialogKind::parse(raw).ok_or_else(|| {
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            format!("Unknown dialog '{raw}'"),
            None,
        )
    })
}

#[utoipa::path(
    get,
    path = "/ui/requests/{request_id}/dialogs",
    params(
        ("request_id" = String, Path, description = "Event request ID")
    ),
    responses(
        (status = 200, description = "Open dialogs for this request card")
    ),
    tag = "UI State",
    security(("bearerAuth" = []))
)]
pub async fn list_dialogs(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Extension(viewer): Extension<Viewer>,
    Path(request_id): Path<String>,
) -> ApiResponse<Value> {
    let open = state
        .sessions
        .with_board(&session_key(&viewer, &token), |board| {
            board
                .card(&request_id)
                .map(|card| card.open_dialogs())
                .unwrap_or_default()
        });
    ApiResponse::success(StatusCode::OK, "Open dialogs", json!({"open": open}))
}

#[utoipa::path(
    post,
    path = "/ui/requests/{request_id}/dialogs/{kind}/open",
    params(
        ("request_id" = String, Path, description = "Event request ID"),
        ("kind" = String, Path, description = "Dialog kind (accept, reject, ...)")
    ),
    responses(
        (status = 200, description = "Dialog opened"),
        (status = 400, description = "Unknown dialog kind")
    ),
    tag = "UI State",
    security(("bearerAuth" = []))
)]
pub async fn open_dialog(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Extension(viewer): Extension<Viewer>,
    Path((request_id, kind)): Path<(String, String)>,
) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    let kind = parse_kind(&kind)?;
    let open = state
        .sessions
        .with_board(&session_key(&viewer, &token), |board| {
            let card = board.card_mut(&request_id);
            card.open(kind);
            card.open_dialogs()
        });
    Ok(ApiResponse::success(StatusCode::OK, "Dialog opened", json!({"open": open})))
}

#[utoipa::path(
    post,
    path = "/ui/requests/{request_id}/dialogs/{kind}/close",
    params(
        ("request_id" = String, Path, description = "Event request ID"),
        ("kind" = String, Path, description = "Dialog kind (accept, reject, ...)")
    ),
    responses(
        (status = 200, description = "Dialog closed"),
        (status = 400, description = "Unknown dialog kind")
    ),
    tag = "UI State",
    security(("bearerAuth" = []))
)]
pub async fn close_dialog(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Extension(viewer): Extension<Viewer>,
    Path((request_id, kind)): Path<(String, String)>,
) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    let kind = parse_kind(&kind)?;
    let open = state
        .sessions
        .with_board(&session_key(&viewer, &token), |board| {
            let card = board.card_mut(&request_id);
            card.close(kind);
            card.open_dialogs()
        });
    Ok(ApiResponse::success(StatusCode::OK, "Dialog closed", json!({"open": open})))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_dialogs, open_dialog, close_dialog),
    tags(
        (name = "UI State", description = "Per-viewer confirmation dialog state")
    )
)]
pub struct UiDoc;
