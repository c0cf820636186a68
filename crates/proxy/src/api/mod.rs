pub mod gemini;
pub mod jira;

use std::sync::Arc;

use axum::{routing::post, Router};
use casegen_common::protocol::proxy::{GEMINI_ROUTE, JIRA_ROUTE};
use serde_json::Value;

use crate::config::ProxyConfig;
use crate::error::{ErrorCode, ProxyError};
use crate::upstream::{UpstreamClient, UpstreamError, UpstreamResponse};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<ProxyConfig>,
    pub upstream: Arc<dyn UpstreamClient>,
}

impl ApiState {
    pub fn new(config: ProxyConfig, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self { config: Arc::new(config), upstream }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route(JIRA_ROUTE, post(jira::fetch_issue))
        .route(GEMINI_ROUTE, post(gemini::generate))
        .with_state(state)
}

/// Turn an upstream exchange into the JSON passed back to the caller.
///
/// Non-success statuses are mirrored with the raw upstream body as the error
/// message. A success whose body is not JSON is a local failure.
fn relay_upstream(
    service: &'static str,
    result: Result<UpstreamResponse, UpstreamError>,
) -> Result<Value, ProxyError> {
    let response = result.map_err(|err| {
        tracing::warn!(service, timed_out = err.timed_out, error = %err, "upstream unreachable");
        ProxyError::new(ErrorCode::UpstreamUnavailable, format!("{service} request failed: {err}"))
    })?;

    if !response.is_success() {
        tracing::warn!(service, status = response.status, "upstream returned an error");
        return Err(ProxyError::upstream(response.status, response.body));
    }

    serde_json::from_str(&response.body).map_err(|err| {
        ProxyError::new(
            ErrorCode::UpstreamUnavailable,
            format!("{service} returned a response that is not JSON: {err}"),
        )
    })
}
