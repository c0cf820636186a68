// Core domain types shared across all casegen crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::adf::Node;

/// An issue as fetched from the tracker. Only the fields the tool consumes
/// are kept; everything else in the tracker payload is dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub key: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<Node>,
    #[serde(default)]
    pub acceptance_criteria: Option<Node>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    /// Creation timestamp as reported by the tracker.
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub comments: Vec<IssueComment>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub body: Option<Node>,
}

/// Test case category. Anything outside the three known labels is kept as
/// free text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TestCaseKind {
    #[default]
    Positive,
    Negative,
    EdgeCase,
    Other(String),
}

impl TestCaseKind {
    pub const KNOWN_LABELS: [&'static str; 3] = ["Positive", "Negative", "Edge Case"];

    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            "edge case" | "edge-case" | "edgecase" | "edge_case" => Self::EdgeCase,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::EdgeCase => "Edge Case",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for TestCaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TestCaseKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TestCaseKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse(&label))
    }
}

/// A single generated (and possibly user-edited) test case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestCase {
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: TestCaseKind,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// A saved list of test cases for one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseSet {
    pub test_cases: Vec<TestCase>,
    pub saved_at: DateTime<Utc>,
    pub issue_key: String,
    #[serde(default)]
    pub summary: String,
}

/// Per-user tracker configuration.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(default)]
    pub jira_url: String,
    #[serde(default)]
    pub jira_username: String,
    #[serde(default)]
    pub jira_api_token: String,
    /// Custom field holding acceptance criteria (defaults to
    /// [`DEFAULT_ACCEPTANCE_CRITERIA_FIELD`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria_field: Option<String>,
}

pub const DEFAULT_ACCEPTANCE_CRITERIA_FIELD: &str = "customfield_10041";

impl UserConfig {
    pub fn acceptance_criteria_field(&self) -> &str {
        self.acceptance_criteria_field
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .unwrap_or(DEFAULT_ACCEPTANCE_CRITERIA_FIELD)
    }
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfig")
            .field("jira_url", &self.jira_url)
            .field("jira_username", &self.jira_username)
            .field("jira_api_token", &redacted(&self.jira_api_token))
            .field("acceptance_criteria_field", &self.acceptance_criteria_field)
            .finish()
    }
}

pub(crate) fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
