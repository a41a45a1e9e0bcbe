//! Static pages and the shared client script, compiled into the binary.

use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse};

const INDEX_HTML: &str = include_str!("../../../assets/index.html");
const DASHBOARD_HTML: &str = include_str!("../../../assets/dashboard.html");
const APP_JS: &str = include_str!("../../../assets/app.js");

/// GET / - Chat page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /dashboard - Chat history dashboard.
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// GET /static/app.js - Client script shared by both pages.
pub async fn app_js() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}
