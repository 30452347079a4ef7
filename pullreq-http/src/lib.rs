//! HTTP API for pullreq
//!
//! A thin axum layer over the `pullreq-core` services: requests are decoded,
//! handed to a service, and service errors are mapped to status codes with a
//! `{"error": {"code", "message"}}` body.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, serve, AppState};
