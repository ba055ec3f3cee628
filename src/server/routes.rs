//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{middleware, routing::{get, post}, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{health, tools};
use crate::middleware::log_request;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    // Tool registration and invocation
    let tool_routes = Router::new()
        .route("/tools", get(tools::list_tools))
        .route("/tools/:name", post(tools::invoke_tool));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health_routes)
        .nest("/v1", tool_routes)
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .with_state(state)
}
