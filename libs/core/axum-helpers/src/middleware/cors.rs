//! CORS layer for the SDK-facing ingestion surface.

use axum::http::{header, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Permissive CORS for the public ingestion endpoint.
///
/// SDKs submit from browsers on arbitrary origins; authentication is carried
/// in the `Authorization` header rather than cookies, so credentials stay
/// disabled and any origin is acceptable.
pub fn ingestion_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}
