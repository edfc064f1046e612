//! HTTP surface: router, handlers, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::pipeline::LocatePipeline;
use crate::state::PositionRegister;

pub use error::{ApiError, ApiResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<AppConfig>,
    pub register: Arc<PositionRegister>,
    pub pipeline: Arc<LocatePipeline>,
}

/// Build the application router.
pub fn create_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/v1/location", post(handlers::classify_reading))
        .route("/api/v1/route", post(handlers::plan_route))
        .route("/api/v1/stream", get(handlers::stream_estimates))
        .route("/api/v1/history", get(handlers::get_history))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
