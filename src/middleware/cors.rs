use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The dashboard is served from a different origin; redirects from the form
/// imports need their `Location` header readable.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any)
        .expose_headers([header::LOCATION])
}
