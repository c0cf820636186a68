// POST /api/jira: fetch one issue from the tracker with caller-supplied
// credentials.

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use casegen_common::protocol::proxy::JiraIssueRequest;
use serde_json::Value;
use url::Url;

use super::{relay_upstream, ApiState};
use crate::error::ProxyError;
use crate::upstream::UpstreamRequest;
use crate::validation::ValidatedJson;

const ISSUE_API_PATH: [&str; 4] = ["rest", "api", "3", "issue"];

pub async fn fetch_issue(
    State(state): State<ApiState>,
    ValidatedJson(request): ValidatedJson<JiraIssueRequest>,
) -> Result<Json<Value>, ProxyError> {
    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(ProxyError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let jira_url = field(&request.jira_url);
    let issue_id = field(&request.issue_id);
    let url = issue_url(jira_url, issue_id)?;
    let username = field(&request.jira_username);
    let credentials = STANDARD.encode(format!("{username}:{}", field(&request.jira_api_token)));

    tracing::info!(issue_id, host = url.host_str().unwrap_or_default(), "fetching tracker issue");

    let upstream_request = UpstreamRequest::get(url.as_str())
        .header("authorization", format!("Basic {credentials}"))
        .header("accept", "application/json");

    relay_upstream("tracker", state.upstream.send(upstream_request).await).map(Json)
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

/// `{jiraUrl}/rest/api/3/issue/{issueId}`, keeping any path prefix on the
/// base URL and percent-encoding the issue id.
fn issue_url(base: &str, issue_id: &str) -> Result<Url, ProxyError> {
    let mut url = Url::parse(base)
        .map_err(|err| ProxyError::validation(format!("jiraUrl is not a valid URL: {err}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::validation("jiraUrl must use http or https"));
    }

    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| ProxyError::validation("jiraUrl cannot be used as a base URL"))?
        .pop_if_empty()
        .extend(ISSUE_API_PATH)
        .push(issue_id);

    Ok(url)
}
