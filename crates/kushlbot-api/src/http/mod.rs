//! HTTP layer for KushlBot.
//!
//! Axum router serving the two pages and the JSON chat API under `/api/`,
//! with cookie-based session identity, request tracing, and CORS.

pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
