use std::future::Future;

use axum::{
    http::{header::HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use casegen_common::protocol::proxy::ErrorBody;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Caller sent an incomplete or malformed body.
    ValidationFailed,
    PayloadTooLarge,
    /// A server-held credential is not configured.
    CredentialMissing,
    /// The upstream API answered with a non-success status.
    UpstreamFailed,
    /// The upstream API could not be reached or sent an unreadable body.
    UpstreamUnavailable,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::CredentialMissing => "CREDENTIAL_MISSING",
            Self::UpstreamFailed => "UPSTREAM_FAILED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Status used unless the error carries an upstream status of its own.
    pub const fn status(self) -> StatusCode {
        match self {
            Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::CredentialMissing
            | Self::UpstreamFailed
            | Self::UpstreamUnavailable
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure returned by a proxy route. Renders as `{"error": message}`.
#[derive(Debug, Clone)]
pub struct ProxyError {
    code: ErrorCode,
    status: StatusCode,
    message: String,
    request_id: Option<String>,
}

impl ProxyError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, status: code.status(), message: message.into(), request_id: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Mirror an upstream failure. Statuses that are not valid HTTP errors
    /// become `502 Bad Gateway`.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|status| status.is_client_error() || status.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        Self { status, ..Self::new(ErrorCode::UpstreamFailed, body) }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let request_id = self.request_id.or_else(current_request_id);

        let code = self.code.as_str();
        let status = self.status.as_u16();
        if self.status.is_server_error() {
            tracing::error!(code, status, message = %self.message, "request failed");
        } else {
            tracing::warn!(code, status, message = %self.message, "request rejected");
        }

        let mut response = (self.status, Json(ErrorBody { error: self.message })).into_response();

        if let Some(request_id) = request_id {
            attach_request_id_header(&mut response, &request_id);
        }

        response
    }
}

pub async fn with_request_id_scope<F>(request_id: String, future: F) -> F::Output
where
    F: Future,
{
    REQUEST_ID.scope(request_id, future).await
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

pub fn request_id_from_headers_or_generate(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn attach_request_id_header(response: &mut Response, request_id: &str) {
    if let Ok(header) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::{json, Value};

    use super::{with_request_id_scope, ErrorCode, ProxyError};

    async fn body_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("error response body should be readable");
        serde_json::from_slice(&body).expect("error response body should be valid json")
    }

    #[tokio::test]
    async fn error_body_is_a_single_error_string() {
        let response = ProxyError::validation("issueId is required").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "issueId is required" }));
    }

    #[tokio::test]
    async fn scoped_request_id_is_attached() {
        let response = with_request_id_scope("req-scoped-123".to_owned(), async {
            ProxyError::new(ErrorCode::CredentialMissing, "no key").into_response()
        })
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-request-id"], "req-scoped-123");
    }

    #[tokio::test]
    async fn explicit_request_id_overrides_scope() {
        let response = with_request_id_scope("req-scoped-123".to_owned(), async {
            ProxyError::validation("bad").with_request_id("req-explicit-456").into_response()
        })
        .await;

        assert_eq!(response.headers()["x-request-id"], "req-explicit-456");
    }

    #[test]
    fn upstream_status_is_mirrored() {
        assert_eq!(ProxyError::upstream(404, "missing").status(), StatusCode::NOT_FOUND);
        assert_eq!(ProxyError::upstream(429, "slow down").status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ProxyError::upstream(503, "down").status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ProxyError::upstream(200, "odd").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::upstream(42, "odd").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::upstream(404, "missing").code(), ErrorCode::UpstreamFailed);
    }
}
