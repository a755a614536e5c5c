// src/api/reference.rs
//
// Cached passthrough of the reference data the event and stakeholder forms
// need. These lists change rarely, so they ride the same TTL cache as the
// request list but are not touched by mutation invalidation.

use axum::{extract::State, http::StatusCode, routing::get, Extension, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::middleware::auth::BearerToken;
use crate::upstream::models::reference::{District, ReferencePerson};
use crate::utils::api_response::ApiResponse;

pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route("/stakeholders", get(list_stakeholders))
        .route("/coordinators", get(list_coordinators))
        .route("/districts", get(list_districts))
}

async fn fetch_reference<T: DeserializeOwned>(
    state: &AppState,
    token: &BearerToken,
    path: &str,
) -> Result<Vec<T>, ApiResponse<()>> {
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

    let items: Vec<&Value> = if let Some(items) = body.as_array() {
        items.iter().collect()
    } else {
        ["data", "items", "results"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_array))
            .map(|items| items.iter().collect())
            .unwrap_or_default()
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect())
}

#[utoipa::path(
    get,
    path = "/stakeholders",
    responses(
        (status = 200, description = "Stakeholder reference list", body = Vec<ReferencePerson>)
    ),
    tag = "Reference",
    security(("bearerAuth" = []))
)]
pub async fn list_stakeholders(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
) -> Result<ApiResponse<Vec<ReferencePerson>>, ApiResponse<()>> {
    let people = fetch_reference(&state, &token, "/api/stakeholders").await?;
    Ok(ApiResponse::success(StatusCode::OK, "Stakeholders retrieved", people))
}

#[utoipa::path(
    get,
    path = "/coordinators",
    responses(
        (status = 200, description = "Coordinator reference list", body = Vec<ReferencePerson>)
    ),
    tag = "Reference",
    security(("bearerAuth" = []))
)]
pub async fn list_coordinators(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
) -> Result<ApiResponse<Vec<ReferencePerson>>, ApiResponse<()>> {
    let people = fetch_reference(&state, &token, "/api/coordinators").await?;
    Ok(ApiResponse::success(StatusCode::OK, "Coordinators retrieved", people))
}

#[utoipa::path(
    get,
    path = "/districts",
    responses(
        (status = 200, description = "District reference list", body = Vec<District>)
    ),
    tag = "Reference",
    security(("bearerAuth" = []))
)]
pub async fn list_districts(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
) -> Result<ApiResponse<Vec<District>>, ApiResponse<()>> {
    let districts = fetch_reference(&state, &token, "/api/districts").await?;
    Ok(ApiResponse::success(StatusCode::OK, "Districts retrieved", districts))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_stakeholders, list_coordinators, list_districts),
    components(schemas(ReferencePerson, District)),
    tags(
        (name = "Reference", description = "Reference data for the dashboard forms")
    )
)]
pub struct ReferenceDoc;
