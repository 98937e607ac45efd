use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(handlers::health))
        // Roadmap generation
        .route("/api/plan", post(handlers::generate_plan))
        // Supported careers
        .route("/api/careers", get(handlers::list_careers))
        // Roadmap Q&A passthrough
        .route("/api/chat", post(handlers::chat))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(TraceLayer::new_for_http())
}
