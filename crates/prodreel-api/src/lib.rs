//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video generation and listing endpoints backed by Postgres
//! - The storefront upload pipeline (download, staged upload, attach)
//! - Credit balance lookup and consumption

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
