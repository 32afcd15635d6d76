//! Route table

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{timeout::RequestBodyTimeoutLayer, trace::TraceLayer};

use crate::api::handlers;
use crate::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.settings.server;

    Router::new()
        .route("/api/v6/images/text2img", post(handlers::text2img))
        .route("/health", get(handlers::health))
        .route("/models", get(handlers::list_models))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(handlers::handle_middleware_error))
                .timeout(server.write_timeout())
                .layer(RequestBodyTimeoutLayer::new(server.read_timeout())),
        )
        .with_state(state)
}
