// Extraction of the consumed fields from a tracker issue payload, and the
// plain-text views built on top of them.

use serde_json::Value;

use crate::adf::{flatten, Node};
use crate::error::CasegenError;
use crate::types::{IssueComment, IssueRecord};

impl IssueRecord {
    /// Read an issue from the tracker's REST representation.
    ///
    /// Only a missing `key` (or a non-object payload) is an error; every other
    /// field is optional and silently defaults.
    pub fn from_tracker_json(
        payload: &Value,
        acceptance_field: &str,
    ) -> Result<Self, CasegenError> {
        if !payload.is_object() {
            return Err(CasegenError::shape("issue payload is not a JSON object"));
        }

        let key = payload
            .get("key")
            .and_then(Value::as_str)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CasegenError::shape("issue payload has no `key`"))?
            .to_string();

        let fields = payload.get("fields").unwrap_or(&Value::Null);

        Ok(Self {
            key,
            summary: string_at(fields, &["summary"]),
            description: document_at(fields, "description"),
            acceptance_criteria: document_at(fields, acceptance_field),
            status: string_at(fields, &["status", "name"]),
            priority: string_at(fields, &["priority", "name"]),
            issue_type: string_at(fields, &["issuetype", "name"]),
            assignee: string_at(fields, &["assignee", "displayName"]),
            reporter: string_at(fields, &["reporter", "displayName"]),
            created: string_at(fields, &["created"]),
            updated: string_at(fields, &["updated"]),
            components: names_at(fields.get("components")),
            labels: fields
                .get("labels")
                .and_then(Value::as_array)
                .map(|labels| labels.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
            comments: fields
                .get("comment")
                .and_then(|comment| comment.get("comments"))
                .and_then(Value::as_array)
                .map(|comments| comments.iter().map(comment_from_json).collect())
                .unwrap_or_default(),
        })
    }

    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    pub fn description_text(&self) -> String {
        flatten(self.description.as_ref(), 0)
    }

    pub fn acceptance_criteria_text(&self) -> String {
        flatten(self.acceptance_criteria.as_ref(), 0)
    }

    /// Issue rendered as prompt context: header, description, acceptance
    /// criteria and comments. Empty sections are omitted.
    pub fn context_text(&self) -> String {
        let mut sections = vec![format!("Issue: {}", self.key)];

        if let Some(summary) = self.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            sections.push(format!("Summary: {}", summary.trim()));
        }

        let description = self.description_text();
        if !description.is_empty() {
            sections.push(format!("Description:\n{description}"));
        }

        let criteria = self.acceptance_criteria_text();
        if !criteria.is_empty() {
            sections.push(format!("Acceptance Criteria:\n{criteria}"));
        }

        let comments = self
            .comments
            .iter()
            .filter_map(|comment| {
                let body = comment.body_text();
                if body.is_empty() {
                    return None;
                }
                Some(format!("{}: {body}", comment.author.as_deref().unwrap_or("Unknown")))
            })
            .collect::<Vec<_>>();
        if !comments.is_empty() {
            sections.push(format!("Comments:\n{}", comments.join("\n")));
        }

        sections.join("\n\n")
    }
}

impl IssueComment {
    pub fn body_text(&self) -> String {
        flatten(self.body.as_ref(), 0)
    }
}

fn comment_from_json(comment: &Value) -> IssueComment {
    IssueComment {
        author: string_at(comment, &["author", "displayName"]),
        created: string_at(comment, &["created"]),
        body: document_at(comment, "body"),
    }
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn document_at(value: &Value, key: &str) -> Option<Node> {
    value.get(key).filter(|doc| doc.is_object()).map(Node::from_value)
}

fn names_at(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::CasegenError;
    use crate::types::IssueRecord;

    fn doc(text: &str) -> serde_json::Value {
        json!({
            "type": "doc",
            "version": 1,
            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": text }] }]
        })
    }

    fn sample_payload() -> serde_json::Value {
        json!({
            "id": "10001",
            "key": "QA-42",
            "fields": {
                "summary": "Password reset emails",
                "description": doc("Users can request a reset link."),
                "customfield_10041": doc("Link expires after 1 hour."),
                "status": { "name": "In Progress" },
                "priority": { "name": "High" },
                "issuetype": { "name": "Story" },
                "assignee": { "displayName": "Dana" },
                "reporter": { "displayName": "Lee" },
                "created": "2024-03-01T10:00:00.000+0000",
                "updated": "2024-03-02T11:30:00.000+0000",
                "components": [{ "name": "auth" }, { "name": "email" }],
                "labels": ["security", 7, "backend"],
                "comment": {
                    "comments": [
                        { "author": { "displayName": "Sam" }, "created": "2024-03-01T12:00:00.000+0000", "body": doc("Check spam folders too.") },
                        { "author": { "displayName": "Kim" }, "body": "not a document" }
                    ]
                }
            }
        })
    }

    #[test]
    fn reads_every_consumed_field() {
        let issue = IssueRecord::from_tracker_json(&sample_payload(), "customfield_10041")
            .expect("issue should decode");

        assert_eq!(issue.key, "QA-42");
        assert_eq!(issue.summary_text(), "Password reset emails");
        assert_eq!(issue.description_text(), "Users can request a reset link.");
        assert_eq!(issue.acceptance_criteria_text(), "Link expires after 1 hour.");
        assert_eq!(issue.status.as_deref(), Some("In Progress"));
        assert_eq!(issue.priority.as_deref(), Some("High"));
        assert_eq!(issue.issue_type.as_deref(), Some("Story"));
        assert_eq!(issue.assignee.as_deref(), Some("Dana"));
        assert_eq!(issue.reporter.as_deref(), Some("Lee"));
        assert_eq!(issue.created.as_deref(), Some("2024-03-01T10:00:00.000+0000"));
        assert_eq!(issue.updated.as_deref(), Some("2024-03-02T11:30:00.000+0000"));
        assert_eq!(issue.components, vec!["auth", "email"]);
        assert_eq!(issue.labels, vec!["security", "backend"]);
        assert_eq!(issue.comments.len(), 2);
        assert_eq!(issue.comments[0].author.as_deref(), Some("Sam"));
        assert_eq!(issue.comments[0].body_text(), "Check spam folders too.");
        assert!(issue.comments[1].body.is_none());
    }

    #[test]
    fn acceptance_field_is_configurable() {
        let mut payload = sample_payload();
        payload["fields"]["customfield_20000"] = doc("Other field.");

        let issue = IssueRecord::from_tracker_json(&payload, "customfield_20000")
            .expect("issue should decode");
        assert_eq!(issue.acceptance_criteria_text(), "Other field.");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let issue = IssueRecord::from_tracker_json(&json!({ "key": "QA-1" }), "customfield_10041")
            .expect("bare issue should decode");

        assert_eq!(issue.summary_text(), "");
        assert_eq!(issue.description_text(), "");
        assert!(issue.comments.is_empty());
        assert!(issue.components.is_empty());
        assert_eq!(issue.context_text(), "Issue: QA-1");
    }

    #[test]
    fn payload_without_key_is_rejected() {
        let error = IssueRecord::from_tracker_json(&json!({ "fields": {} }), "customfield_10041")
            .expect_err("keyless payload should fail");
        assert!(matches!(error, CasegenError::ResponseShapeUnexpected(_)));

        let error = IssueRecord::from_tracker_json(&json!([1, 2]), "customfield_10041")
            .expect_err("array payload should fail");
        assert!(matches!(error, CasegenError::ResponseShapeUnexpected(_)));
    }

    #[test]
    fn context_text_includes_all_sections() {
        let issue = IssueRecord::from_tracker_json(&sample_payload(), "customfield_10041")
            .expect("issue should decode");

        assert_eq!(
            issue.context_text(),
            "Issue: QA-42\n\n\
             Summary: Password reset emails\n\n\
             Description:\nUsers can request a reset link.\n\n\
             Acceptance Criteria:\nLink expires after 1 hour.\n\n\
             Comments:\nSam: Check spam folders too."
        );
    }
}
