//! Axum router configuration with middleware.
//!
//! Pages at `/` and `/dashboard`, JSON under `/api/`.
//! Middleware: session cookie, CORS, tracing.

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::session::resolve_session;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let chat_routes = Router::new()
        .route("/new", post(handlers::chat::create_chat))
        .route("/history", get(handlers::chat::history))
        .route("/clear-all", post(handlers::chat::clear_all))
        .route(
            "/{id}",
            post(handlers::chat::send_message).delete(handlers::chat::delete_chat),
        )
        .route("/{id}/messages", get(handlers::chat::messages));

    Router::new()
        .route("/", get(handlers::pages::index))
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/static/app.js", get(handlers::pages::app_js))
        .nest("/api/chat", chat_routes)
        .route("/api/health", get(health_check))
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/health
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
