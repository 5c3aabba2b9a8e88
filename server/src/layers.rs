//! CORS and security header layers attached to every response.

use app_core::AppConfig;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use regex::Regex;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::warn;

/// CORS with credentials for origins matching the configured pattern.
/// Applied to every response so that error payloads stay readable by the
/// client as well.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let pattern = match Regex::new(&config.allowed_origins) {
        Ok(pattern) => pattern,
        Err(err) => {
            // a broken pattern must not open the origin up
            warn!(error = %err, "invalid ALLOWED_ORIGINS pattern; denying all origins");
            Regex::new("$^").expect("deny-all pattern")
        }
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(|origin| pattern.is_match(origin))
        }))
        .allow_credentials(true)
        .allow_methods([
            Method::POST,
            Method::OPTIONS,
            Method::GET,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([header::SET_COOKIE])
}

const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (
        header::STRICT_TRANSPORT_SECURITY,
        "max-age=31536000; includeSubdomains",
    ),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src https: data: 'unsafe-inline' 'unsafe-eval'",
    ),
    (header::X_FRAME_OPTIONS, "DENY"),
    (
        HeaderName::from_static("x-xss-protection"),
        "1; mode=block",
    ),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
];

/// Stamp the fixed security header set onto every response.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}
