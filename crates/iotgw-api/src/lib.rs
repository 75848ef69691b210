//! iotgw-api - REST API layer for the gateway registry
//!
//! Thin HTTP surface over [`iotgw_core::Services`]. Handlers parse the
//! request, call one service operation and map [`ServiceError`] values to
//! status codes through [`ApiError`].
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use iotgw_api::{create_router, AppState};
//! use iotgw_core::MemoryStore;
//!
//! let state = AppState::new(Arc::new(MemoryStore::new()));
//! let router = create_router(state);
//! ```
//!
//! [`ServiceError`]: iotgw_core::ServiceError

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the REST API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Gateway routes
        .route(
            "/api/gateways",
            get(handlers::gateways::list_gateways).post(handlers::gateways::create_gateway),
        )
        .route(
            "/api/gateways/{id}",
            get(handlers::gateways::get_gateway)
                .put(handlers::gateways::update_gateway)
                .delete(handlers::gateways::delete_gateway),
        )
        // Device routes
        .route(
            "/api/devices",
            get(handlers::devices::list_devices).post(handlers::devices::create_device),
        )
        .route(
            "/api/devices/{id}",
            get(handlers::devices::get_device)
                .put(handlers::devices::update_device)
                .delete(handlers::devices::delete_device),
        );

    if state.testing_routes() {
        tracing::warn!("Testing routes enabled: POST /api/testing/reset clears the store");
        router = router.route("/api/testing/reset", post(handlers::testing::reset));
    }

    router
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use iotgw_core::MemoryStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let router = create_router(AppState::new(Arc::new(MemoryStore::new())));
        let response = router.oneshot(request(Method::GET, "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn testing_routes_are_off_by_default() {
        let router = create_router(AppState::new(Arc::new(MemoryStore::new())));
        let response = router
            .oneshot(request(Method::POST, "/api/testing/reset"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn testing_reset_when_enabled() {
        let state = AppState::new(Arc::new(MemoryStore::new())).with_testing_routes(true);
        let router = create_router(state);
        let response = router
            .oneshot(request(Method::POST, "/api/testing/reset"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn handler_panic_is_internal_error() {
        let router = Router::new()
            .route("/explode", get(explode))
            .layer(CatchPanicLayer::custom(error::panic_response));
        let response = router
            .oneshot(request(Method::GET, "/explode"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "internal_error");
        assert_eq!(json["error"], "Unexpected failure: handler exploded");
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let router = create_router(AppState::new(Arc::new(MemoryStore::new())));
        let response = router
            .oneshot(request(Method::GET, "/api/gateways/1a3d5da0000000a82aaaa4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_json_body_is_bad_request() {
        let router = create_router(AppState::new(Arc::new(MemoryStore::new())));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/gateways")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
