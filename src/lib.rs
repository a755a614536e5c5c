pub mod api;
pub mod app_state;
pub mod config;
pub mod middleware;
pub mod upstream;
pub mod utils;
pub mod workflow;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::events::EventDoc;
use crate::api::notification::NotificationDoc;
use crate::api::reference::ReferenceDoc;
use crate::api::requests::RequestDoc;
use crate::api::ui::UiDoc;
use crate::app_state::AppState;
use crate::middleware::auth::{bearer_middleware, viewer_middleware};

/// Assemble the full gateway router. Shared between `main` and the
/// integration tests, which point it at a stub upstream.
pub fn build_router(state: AppState) -> Router {
    let merged_doc = RequestDoc::openapi()
        .merge_from(EventDoc::openapi())
        .merge_from(ReferenceDoc::openapi())
        .merge_from(NotificationDoc::openapi())
        .merge_from(UiDoc::openapi());

    // Public routes (health and the published calendar feed)
    let public_routes = Router::new()
        .merge(api::health::health_routes())
        .merge(api::events::public_event_routes());

    // Private routes
    let private_routes = Router::new()
        .merge(api::requests::request_routes())
        .merge(api::events::event_routes())
        .merge(api::reference::reference_routes())
        .merge(api::notification::notification_routes())
        .merge(api::ui::ui_routes())
        .route_layer(from_fn(viewer_middleware))
        .route_layer(from_fn(bearer_middleware));

    Router::new()
        .merge(public_routes)
        .merge(private_routes)
        .merge(
            SwaggerUi::new("/swagger")
                .url("/api-docs/openapi.json", merged_doc.clone())
        )
        .merge(
            RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc)
                .path("/rapidoc")
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
