//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the subtitle, health and version endpoints
//! - Request handlers and JSON response bodies
//! - CORS headers on every response

pub mod handlers;
pub mod routes;

pub use routes::create_router;
