// CORS layer for the proxy.
//
// Allowed origins come from `CASEGEN_PROXY_CORS_ORIGINS` (comma-separated,
// or `*`). Unset means the local front-end dev servers.

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

const DEFAULT_DEV_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Build the CORS layer for a configured origin list.
///
/// Both routes are `POST` with a JSON body, so the layer allows `POST` and
/// `OPTIONS`, the `Content-Type` and `X-Request-Id` headers, and exposes
/// `X-Request-Id`. Preflight responses are cached for an hour.
pub fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(3600));

    match origins.map(str::trim) {
        Some("*") => base.allow_origin(AllowOrigin::any()),
        Some(origins) => base.allow_origin(parse_origins(origins)),
        None => base.allow_origin(parse_origins(&DEFAULT_DEV_ORIGINS.join(","))),
    }
}

fn parse_origins(comma_separated: &str) -> Vec<HeaderValue> {
    comma_separated
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::post, Router};
    use tower::ServiceExt;

    fn test_app(origins: Option<&str>) -> Router {
        Router::new().route("/api/jira", post(|| async { "ok" })).layer(cors_layer(origins))
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/jira")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .expect("preflight request should build")
    }

    #[tokio::test]
    async fn preflight_allows_default_dev_origin() {
        let response = test_app(None)
            .oneshot(preflight("http://localhost:5173"))
            .await
            .expect("preflight should return a response");

        assert_eq!(response.headers()["access-control-allow-origin"], "http://localhost:5173");
        assert_eq!(response.headers()["access-control-max-age"], "3600");
    }

    #[tokio::test]
    async fn preflight_rejects_unknown_origin() {
        let response = test_app(None)
            .oneshot(preflight("https://evil.example.com"))
            .await
            .expect("preflight should return a response");

        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn configured_origins_replace_defaults() {
        let app = test_app(Some("https://qa.example.com, https://staging.example.com"));
        let response = app
            .clone()
            .oneshot(preflight("https://staging.example.com"))
            .await
            .expect("preflight should return a response");
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://staging.example.com"
        );

        let response = app
            .oneshot(preflight("http://localhost:3000"))
            .await
            .expect("preflight should return a response");
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin() {
        let response = test_app(Some("*"))
            .oneshot(preflight("https://anything.example.com"))
            .await
            .expect("preflight should return a response");

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[test]
    fn parse_origins_handles_whitespace() {
        let origins = parse_origins("  https://a.com , https://b.com  , ");
        assert_eq!(origins, vec!["https://a.com", "https://b.com"]);
    }
}
