use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers;
use super::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.request_timeout()));

    Router::new()
        .route(
            "/api/v1/rate-limit",
            post(handlers::create_rate_limit)
                .get(handlers::get_rate_limit)
                .put(handlers::update_rate_limit)
                .delete(handlers::delete_rate_limit),
        )
        .route("/api/v1/rate-limit/usage", get(handlers::get_usage))
        .route("/api/v1/rate-limits", get(handlers::list_rate_limits))
        .route("/api/v1/check-rate-limit", post(handlers::check_rate_limit))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(middleware)
}
