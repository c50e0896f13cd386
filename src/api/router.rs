use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{
    check_handler, health_handler, multi_valued_handler, single_valued_handler,
};
use crate::api::middleware::PayloadInjectionLayer;

/// Create the sample API router guarded by the payload filter
pub fn create_router(payload_filter: PayloadInjectionLayer) -> Router {
    let guarded = Router::new()
        .route("/api/test", get(check_handler))
        .route("/api/test/single", post(single_valued_handler))
        .route("/api/test/multivalued", post(multi_valued_handler))
        .route_layer(payload_filter);

    Router::new()
        // Health check (never filtered)
        .route("/health", get(health_handler))
        .merge(guarded)
}
