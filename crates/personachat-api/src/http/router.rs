//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/bots", get(handlers::bot::list_bots))
        // Chat
        .route("/bots/{bot}/chat", post(handlers::chat::send_message))
        // Sessions
        .route(
            "/bots/{bot}/sessions",
            get(handlers::session::list_sessions),
        )
        .route(
            "/bots/{bot}/last-session",
            get(handlers::session::last_session),
        )
        .route(
            "/bots/{bot}/sessions/{id}",
            delete(handlers::session::delete_session),
        )
        .route(
            "/bots/{bot}/sessions/{id}/messages",
            get(handlers::session::get_messages),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no identity required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
