//! API routes.

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::credits::get_credits;
use crate::handlers::health::health;
use crate::handlers::products::list_products;
use crate::handlers::upload::upload_video;
use crate::handlers::videos::{delete_video, generate_video, list_videos, refresh_video};
use crate::middleware::cors_layer;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Listing and generation
        .route("/video", get(list_videos).post(generate_video))
        // Per-video refresh and delete
        .route(
            "/video/:video_id",
            axum::routing::put(refresh_video).delete(delete_video),
        )
        // Attach-target picker
        .route("/products", get(list_products))
        // Storefront ingestion pipeline
        .route("/upload", post(upload_video))
        // Credit balance
        .route("/credits", get(get_credits));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
