// `ValidatedJson<T>`: JSON body extractor whose rejections use the proxy's
// `{"error": ...}` body instead of axum's plain-text responses.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{ErrorCode, ProxyError};

/// Maximum request body in bytes (1 MiB).
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(rejection_error(&rejection).into_response()),
        }
    }
}

fn rejection_error(rejection: &JsonRejection) -> ProxyError {
    let message = match rejection {
        JsonRejection::JsonDataError(e) => format!("invalid JSON payload: {e}"),
        JsonRejection::JsonSyntaxError(e) => format!("malformed JSON: {e}"),
        JsonRejection::MissingJsonContentType(_) => {
            "expected Content-Type: application/json".to_string()
        }
        JsonRejection::BytesRejection(e) => format!("request body error: {e}"),
        other => format!("request body error: {other}"),
    };

    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ProxyError::new(ErrorCode::PayloadTooLarge, message)
    } else {
        ProxyError::validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::DefaultBodyLimit,
        http::{Method, Request},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct TestPayload {
        name: String,
    }

    async fn echo_handler(ValidatedJson(payload): ValidatedJson<TestPayload>) -> String {
        payload.name
    }

    fn test_app() -> Router {
        Router::new()
            .route("/test", post(echo_handler))
            .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
    }

    fn post_json(content_type: Option<&str>, body: impl Into<Body>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri("/test");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(body.into()).expect("request should build")
    }

    async fn error_message(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let parsed: serde_json::Value =
            serde_json::from_slice(&body).expect("error body should be JSON");
        parsed["error"].as_str().expect("error should be a string").to_string()
    }

    #[tokio::test]
    async fn accepts_valid_payload() {
        let response = test_app()
            .oneshot(post_json(Some("application/json"), r#"{"name":"alice"}"#))
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        assert_eq!(body.as_ref(), b"alice");
    }

    #[tokio::test]
    async fn rejects_missing_content_type() {
        let response = test_app()
            .oneshot(post_json(None, r#"{"name":"alice"}"#))
            .await
            .expect("request should return a response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "expected Content-Type: application/json");
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let response = test_app()
            .oneshot(post_json(Some("application/json"), "not json"))
            .await
            .expect("request should return a response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.starts_with("malformed JSON"));
    }

    #[tokio::test]
    async fn rejects_wrong_field_types() {
        let response = test_app()
            .oneshot(post_json(Some("application/json"), r#"{"name": 42}"#))
            .await
            .expect("request should return a response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.starts_with("invalid JSON payload"));
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let body = format!(r#"{{"name":"{}"}}"#, "a".repeat(MAX_REQUEST_BODY_BYTES));
        let response = test_app()
            .oneshot(post_json(Some("application/json"), body))
            .await
            .expect("request should return a response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
