//! API module for handling HTTP requests and responses

/// Request handlers for the compare and health endpoints.
#[cfg(feature = "web")]
pub mod handlers;
/// Response bodies other than errors.
#[cfg(feature = "web")]
pub mod responses;

#[cfg(feature = "web")]
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Router,
};
#[cfg(feature = "web")]
use std::sync::Arc;
#[cfg(feature = "web")]
use tower::ServiceBuilder;
#[cfg(feature = "web")]
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
#[cfg(feature = "web")]
use uuid::Uuid;

#[cfg(feature = "web")]
use crate::state::AppState;

#[cfg(feature = "web")]
pub use handlers::{compare_images, health_check};

#[cfg(feature = "web")]
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags each request with a random UUID
#[cfg(feature = "web")]
#[derive(Clone, Copy, Debug, Default)]
struct UuidRequestId;

#[cfg(feature = "web")]
impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[cfg(feature = "web")]
/// Create the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let mut router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/compare/images", post(compare_images))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state.clone());

    // Optional front-end
    if let Some(dir) = state.config.static_dir.as_ref().filter(|dir| dir.is_dir()) {
        log::info!("Serving static files from {}", dir.display());
        router = router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        );
    }

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(cors),
    )
}
