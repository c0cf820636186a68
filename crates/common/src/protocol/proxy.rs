// Request and response bodies of the proxy's two routes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{redacted, UserConfig};

pub const JIRA_ROUTE: &str = "/api/jira";
pub const GEMINI_ROUTE: &str = "/api/gemini";

/// `POST /api/jira` body. Every field is required; they are optional here so
/// that a missing field can be reported instead of failing deserialization.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JiraIssueRequest {
    #[serde(default)]
    pub jira_url: Option<String>,
    #[serde(default)]
    pub jira_username: Option<String>,
    #[serde(default)]
    pub jira_api_token: Option<String>,
    #[serde(default)]
    pub issue_id: Option<String>,
}

impl JiraIssueRequest {
    pub fn from_config(config: &UserConfig, issue_id: &str) -> Self {
        Self {
            jira_url: Some(config.jira_url.clone()),
            jira_username: Some(config.jira_username.clone()),
            jira_api_token: Some(config.jira_api_token.clone()),
            issue_id: Some(issue_id.to_string()),
        }
    }

    /// Wire names of required fields that are absent or blank, in field order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("jiraUrl", &self.jira_url),
            ("jiraUsername", &self.jira_username),
            ("jiraApiToken", &self.jira_api_token),
            ("issueId", &self.issue_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map(str::trim).unwrap_or("").is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl fmt::Debug for JiraIssueRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraIssueRequest")
            .field("jira_url", &self.jira_url)
            .field("jira_username", &self.jira_username)
            .field("jira_api_token", &redacted(self.jira_api_token.as_deref().unwrap_or("")))
            .field("issue_id", &self.issue_id)
            .finish()
    }
}

/// `POST /api/gemini` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self { prompt: Some(prompt.into()), ..Self::default() }
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Failure body returned by both routes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
