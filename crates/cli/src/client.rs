// HTTP client for the casegen proxy, plus the tracker-issue and generation
// clients built on top of it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use casegen_common::error::CasegenError;
use casegen_common::generation::{self, GenerationKind};
use casegen_common::protocol::gemini::reply_text;
use casegen_common::protocol::proxy::{ErrorBody, JiraIssueRequest, GEMINI_ROUTE, JIRA_ROUTE};
use casegen_common::types::{IssueRecord, TestCase, UserConfig};
use serde_json::Value;
use url::Url;

/// Boxed future so the transport can be swapped for a scripted one in tests.
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Value, CasegenError>> + Send>>;

/// Posts a JSON body to one proxy route and returns the decoded JSON reply.
pub trait ProxyTransport: Send + Sync {
    fn post(&self, route: &'static str, body: Value) -> TransportFuture;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CasegenError> {
        let base_url = Url::parse(base_url).map_err(|err| {
            CasegenError::missing(format!("proxy_url (`{base_url}` is not a valid URL: {err})"))
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("casegen-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CasegenError::remote(None, format!("HTTP client setup failed: {err}")))?;
        Ok(Self { http, base_url })
    }

    /// Append `route` to the base URL, keeping any path prefix the proxy is
    /// mounted under.
    fn route_url(&self, route: &str) -> Result<Url, CasegenError> {
        let mut url = self.base_url.clone();
        let base = &self.base_url;
        let not_http = |()| CasegenError::missing(format!("proxy_url (`{base}` has no path)"));
        url.path_segments_mut()
            .map_err(not_http)?
            .pop_if_empty()
            .extend(route.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

impl ProxyTransport for HttpTransport {
    fn post(&self, route: &'static str, body: Value) -> TransportFuture {
        let http = self.http.clone();
        let url = self.route_url(route);
        Box::pin(async move {
            let url = url?;
            tracing::debug!(%url, "posting to proxy");

            let response = http.post(url.clone()).json(&body).send().await.map_err(|err| {
                CasegenError::remote(None, format!("could not reach proxy at {url}: {err}"))
            })?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|err| {
                CasegenError::remote(Some(status), format!("failed reading proxy reply: {err}"))
            })?;

            tracing::debug!(route, status, bytes = text.len(), "proxy replied");
            classify_reply(status, &text)
        })
    }
}

/// Decode a proxy reply. Failure statuses surface the proxy's `error` string
/// verbatim, or the raw body when it is not the expected error shape.
pub fn classify_reply(status: u16, body: &str) -> Result<Value, CasegenError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|error| error.error)
            .unwrap_or_else(|_| body.to_string());
        return Err(CasegenError::remote(Some(status), message));
    }

    serde_json::from_str(body)
        .map_err(|err| CasegenError::shape(format!("proxy reply is not JSON: {err}")))
}

/// Tracker-issue and generation operations against the proxy.
#[derive(Clone)]
pub struct ProxyClient {
    transport: Arc<dyn ProxyTransport>,
}

impl ProxyClient {
    pub fn new(transport: Arc<dyn ProxyTransport>) -> Self {
        Self { transport }
    }

    pub fn http(base_url: &str, timeout: Duration) -> Result<Self, CasegenError> {
        Ok(Self::new(Arc::new(HttpTransport::new(base_url, timeout)?)))
    }

    /// Fetch one issue. The four tracker fields are checked before any
    /// request is made.
    pub async fn fetch_issue(
        &self,
        config: &UserConfig,
        issue_id: &str,
    ) -> Result<IssueRecord, CasegenError> {
        let request = JiraIssueRequest::from_config(config, issue_id.trim());
        if let Some(field) = request.missing_fields().first() {
            return Err(CasegenError::missing(*field));
        }

        let body = serde_json::to_value(&request)
            .map_err(|err| CasegenError::shape(format!("failed to encode request: {err}")))?;
        let payload = self.transport.post(JIRA_ROUTE, body).await?;
        let issue = IssueRecord::from_tracker_json(&payload, config.acceptance_criteria_field())?;

        tracing::info!(issue_key = %issue.key, comments = issue.comments.len(), "fetched issue");
        Ok(issue)
    }

    /// Summary or acceptance criteria as plain text.
    pub async fn generate_text(
        &self,
        kind: GenerationKind,
        issue: &IssueRecord,
    ) -> Result<String, CasegenError> {
        let reply = self.generate(kind, issue).await?;
        generation::parse_text_reply(&reply)
    }

    pub async fn generate_test_cases(
        &self,
        issue: &IssueRecord,
    ) -> Result<Vec<TestCase>, CasegenError> {
        let reply = self.generate(GenerationKind::TestCases, issue).await?;
        let cases = generation::parse_test_cases(&reply)?;
        tracing::info!(issue_key = %issue.key, cases = cases.len(), "generated test cases");
        Ok(cases)
    }

    async fn generate(
        &self,
        kind: GenerationKind,
        issue: &IssueRecord,
    ) -> Result<String, CasegenError> {
        let request = generation::build_request(kind, issue);
        let body = serde_json::to_value(&request)
            .map_err(|err| CasegenError::shape(format!("failed to encode request: {err}")))?;

        tracing::debug!(%kind, issue_key = %issue.key, "requesting generation");
        let reply = self.transport.post(GEMINI_ROUTE, body).await?;
        reply_text(&reply)
    }
}
