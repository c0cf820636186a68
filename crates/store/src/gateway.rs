// Typed persistence operations over a `DocumentStore`.

use std::sync::Arc;

use casegen_common::error::CasegenError;
use casegen_common::types::{TestCase, TestCaseSet, UserConfig};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::documents::DocumentStore;
use crate::paths;

/// Listing entry for one saved test-case set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedIssue {
    pub issue_id: String,
    pub issue_key: String,
    pub summary: String,
    pub saved_at: DateTime<Utc>,
    pub case_count: usize,
}

#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn DocumentStore>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn load_config(&self, user_id: &str) -> Result<Option<UserConfig>, CasegenError> {
        let path = paths::jira_config(user_id)?;
        self.read(&path)
    }

    pub fn save_config(&self, user_id: &str, config: &UserConfig) -> Result<(), CasegenError> {
        let path = paths::jira_config(user_id)?;
        self.write(&path, config)?;
        tracing::info!(user_id, "saved tracker configuration");
        Ok(())
    }

    /// Store `cases` for an issue, replacing any earlier set, and return the
    /// stored record with its save timestamp.
    pub fn save_test_cases(
        &self,
        user_id: &str,
        issue_id: &str,
        issue_key: &str,
        summary: &str,
        cases: &[TestCase],
    ) -> Result<TestCaseSet, CasegenError> {
        let path = paths::test_cases(user_id, issue_id)?;
        let set = TestCaseSet {
            test_cases: cases.to_vec(),
            saved_at: Utc::now(),
            issue_key: issue_key.to_string(),
            summary: summary.to_string(),
        };
        self.write(&path, &set)?;
        tracing::info!(user_id, issue_id, cases = cases.len(), "saved test cases");
        Ok(set)
    }

    pub fn load_test_cases(
        &self,
        user_id: &str,
        issue_id: &str,
    ) -> Result<Option<TestCaseSet>, CasegenError> {
        let path = paths::test_cases(user_id, issue_id)?;
        self.read(&path)
    }

    /// Saved sets for a user, newest first. Documents that no longer decode
    /// as a test-case set are skipped with a warning.
    pub fn list_saved_issues(&self, user_id: &str) -> Result<Vec<SavedIssue>, CasegenError> {
        let collection = paths::test_case_collection(user_id)?;
        let mut saved = Vec::new();

        for issue_id in self.store.list(&collection).map_err(CasegenError::from)? {
            let path = format!("{collection}/{issue_id}");
            let Some(document) = self.store.get(&path)? else {
                continue;
            };
            let set = match serde_json::from_value::<TestCaseSet>(document) {
                Ok(set) => set,
                Err(err) => {
                    tracing::warn!(path, error = %err, "skipping unreadable saved test cases");
                    continue;
                }
            };
            saved.push(SavedIssue {
                issue_id,
                issue_key: set.issue_key,
                summary: set.summary,
                saved_at: set.saved_at,
                case_count: set.test_cases.len(),
            });
        }

        saved.sort_by(|a, b| {
            b.saved_at.cmp(&a.saved_at).then_with(|| a.issue_id.cmp(&b.issue_id))
        });
        Ok(saved)
    }

    /// Returns whether a saved set existed.
    pub fn delete_test_cases(&self, user_id: &str, issue_id: &str) -> Result<bool, CasegenError> {
        let path = paths::test_cases(user_id, issue_id)?;
        let removed = self.store.delete(&path)?;
        tracing::info!(user_id, issue_id, removed, "deleted test cases");
        Ok(removed)
    }

    fn read<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, CasegenError> {
        let Some(document) = self.store.get(path)? else {
            return Ok(None);
        };
        serde_json::from_value(document).map(Some).map_err(|err| {
            CasegenError::PersistenceFailed(format!(
                "document `{path}` has an unexpected shape: {err}"
            ))
        })
    }

    fn write<T: Serialize>(&self, path: &str, document: &T) -> Result<(), CasegenError> {
        let value: Value = serde_json::to_value(document).map_err(|err| {
            CasegenError::PersistenceFailed(format!("failed to encode `{path}`: {err}"))
        })?;
        self.store.put(path, &value).map_err(|err| {
            tracing::warn!(path, error = %err, "document write failed");
            CasegenError::from(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use casegen_common::error::CasegenError;
    use casegen_common::types::{TestCase, TestCaseKind, UserConfig};
    use serde_json::json;

    use super::PersistenceGateway;
    use crate::documents::{DocumentStore, MemoryDocumentStore};
    use crate::error::StoreError;

    fn gateway() -> (PersistenceGateway, Arc<MemoryDocumentStore>) {
        let store = Arc::new(MemoryDocumentStore::new());
        (PersistenceGateway::new(store.clone()), store)
    }

    fn case(title: &str) -> TestCase {
        TestCase { title: title.into(), kind: TestCaseKind::Negative, steps: vec!["step".into()] }
    }

    #[test]
    fn config_round_trips_under_user_path() {
        let (gateway, store) = gateway();
        assert_eq!(gateway.load_config("u1").expect("load"), None);

        let config = UserConfig {
            jira_url: "https://acme.atlassian.net".into(),
            jira_username: "qa@acme.test".into(),
            jira_api_token: "token".into(),
            acceptance_criteria_field: Some("customfield_1".into()),
        };
        gateway.save_config("u1", &config).expect("save");

        assert_eq!(gateway.load_config("u1").expect("load"), Some(config));
        assert_eq!(
            store.get("users/u1/config/jira").expect("get").expect("document")["jiraUrl"],
            "https://acme.atlassian.net"
        );
    }

    #[test]
    fn test_case_sets_are_stamped_and_listed() {
        let (gateway, store) = gateway();
        let saved = gateway
            .save_test_cases("u1", "10001", "QA-1", "Login", &[case("a"), case("b")])
            .expect("save");
        gateway.save_test_cases("u1", "10002", "QA-2", "Logout", &[case("c")]).expect("save");

        let stored = store.get("users/u1/testCases/10001").expect("get").expect("document");
        assert_eq!(stored["issueKey"], "QA-1");
        assert_eq!(stored["testCases"][1]["type"], "Negative");
        assert!(stored["savedAt"].is_string());

        let loaded = gateway.load_test_cases("u1", "10001").expect("load").expect("set");
        assert_eq!(loaded, saved);

        let listed = gateway.list_saved_issues("u1").expect("list");
        assert_eq!(listed.len(), 2);
        assert!(listed[0].saved_at >= listed[1].saved_at);
        let first = listed.iter().find(|saved| saved.issue_id == "10001").expect("listed");
        assert_eq!((first.issue_key.as_str(), first.case_count), ("QA-1", 2));
        assert!(gateway.list_saved_issues("u2").expect("list").is_empty());
    }

    #[test]
    fn listing_skips_malformed_sets() {
        let (gateway, store) = gateway();
        gateway.save_test_cases("u1", "10001", "QA-1", "Login", &[case("a")]).expect("save");
        store
            .put("users/u1/testCases/10002", &json!({ "testCases": "not a list" }))
            .expect("put");

        let listed = gateway.list_saved_issues("u1").expect("list should still succeed");

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].issue_id, "10001");
        assert!(matches!(
            gateway.load_test_cases("u1", "10002"),
            Err(CasegenError::PersistenceFailed(_))
        ));
    }

    #[test]
    fn delete_reports_whether_a_set_existed() {
        let (gateway, _) = gateway();
        gateway.save_test_cases("u1", "QA-1", "QA-1", "", &[]).expect("save");

        assert!(gateway.delete_test_cases("u1", "QA-1").expect("delete"));
        assert!(!gateway.delete_test_cases("u1", "QA-1").expect("delete"));
        assert_eq!(gateway.load_test_cases("u1", "QA-1").expect("load"), None);
    }

    #[test]
    fn invalid_identifiers_are_persistence_failures() {
        let (gateway, _) = gateway();
        let error = gateway.load_config("a/b").expect_err("slash should be rejected");
        assert!(matches!(error, CasegenError::PersistenceFailed(_)));

        let error = gateway.save_test_cases("u1", "..", "K", "", &[]).expect_err("rejected");
        assert!(matches!(error, CasegenError::PersistenceFailed(_)));
    }

    #[test]
    fn malformed_document_is_reported_not_panicked() {
        let (gateway, store) = gateway();
        store.put("users/u1/testCases/QA-1", &json!({ "testCases": "oops" })).expect("put");
        let error = gateway.load_test_cases("u1", "QA-1").expect_err("shape should fail");
        assert!(matches!(error, CasegenError::PersistenceFailed(_)));
    }

    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn get(&self, _: &str) -> Result<Option<serde_json::Value>, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn put(&self, _: &str, _: &serde_json::Value) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        fn delete(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn list(&self, _: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[test]
    fn store_failures_surface_as_persistence_failed() {
        let gateway = PersistenceGateway::new(Arc::new(FailingStore));
        assert!(matches!(
            gateway.save_config("u1", &UserConfig::default()),
            Err(CasegenError::PersistenceFailed(_))
        ));
        assert!(matches!(gateway.list_saved_issues("u1"), Err(CasegenError::PersistenceFailed(_))));
    }
}
