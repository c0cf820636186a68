// Outbound HTTP to the tracker and LLM APIs.
//
// Handlers talk to an `UpstreamClient` trait object so tests can record the
// forwarded requests without opening sockets.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use axum::http::Method;
use serde_json::Value;

#[derive(Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: Method::GET, url: url.into(), headers: Vec::new(), body: None }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self { method: Method::POST, url: url.into(), headers: Vec::new(), body: Some(body) }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// URL with the query string removed, for logging.
    pub fn redacted_url(&self) -> &str {
        self.url.split_once('?').map(|(path, _)| path).unwrap_or(&self.url)
    }
}

impl fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamRequest")
            .field("method", &self.method)
            .field("url", &self.redacted_url())
            .field("headers", &self.headers.iter().map(|(name, _)| *name).collect::<Vec<_>>())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport failure: no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub message: String,
    pub timed_out: bool,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timed_out {
            write!(f, "upstream request timed out: {}", self.message)
        } else {
            write!(f, "upstream request failed: {}", self.message)
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Using boxed futures for object safety / dynamic dispatch in tests.
pub trait UpstreamClient: Send + Sync {
    fn send(
        &self,
        request: UpstreamRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamResponse, UpstreamError>> + Send>>;
}

/// Production client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("casegen-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl UpstreamClient for ReqwestUpstream {
    fn send(
        &self,
        request: UpstreamRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamResponse, UpstreamError>> + Send>> {
        let client = self.client.clone();
        Box::pin(async move {
            let mut builder = client.request(request.method.clone(), &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(*name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(transport_error)?;

            tracing::debug!(
                method = %request.method,
                url = request.redacted_url(),
                status,
                bytes = body.len(),
                "upstream responded"
            );
            Ok(UpstreamResponse { status, body })
        })
    }
}

fn transport_error(error: reqwest::Error) -> UpstreamError {
    UpstreamError { timed_out: error.is_timeout(), message: error.without_url().to_string() }
}
