use std::sync::Arc;

use casegen_common::types::{TestCase, TestCaseKind, UserConfig};
use casegen_store::{PersistenceGateway, SqliteDocumentStore};

fn open_gateway(path: &std::path::Path) -> PersistenceGateway {
    let store = SqliteDocumentStore::open(path).expect("sqlite store should open");
    PersistenceGateway::new(Arc::new(store))
}

#[test]
fn saved_sets_survive_reopen_and_overwrite_in_place() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let db_path = dir.path().join("casegen.db");

    {
        let gateway = open_gateway(&db_path);
        gateway
            .save_config(
                "user-1",
                &UserConfig {
                    jira_url: "https://acme.atlassian.net".into(),
                    jira_username: "qa@acme.test".into(),
                    jira_api_token: "token".into(),
                    acceptance_criteria_field: None,
                },
            )
            .expect("config should save");
        gateway
            .save_test_cases(
                "user-1",
                "QA-7",
                "QA-7",
                "Checkout",
                &[TestCase {
                    title: "Pay with card".into(),
                    kind: TestCaseKind::Positive,
                    steps: vec!["Add item".into(), "Pay".into()],
                }],
            )
            .expect("test cases should save");
    }

    let gateway = open_gateway(&db_path);
    let config = gateway.load_config("user-1").expect("load").expect("config should exist");
    assert_eq!(config.jira_url, "https://acme.atlassian.net");

    let edited = TestCase {
        title: "Pay with expired card".into(),
        kind: TestCaseKind::Negative,
        steps: vec!["Add item".into(), "Pay with expired card".into()],
    };
    gateway.save_test_cases("user-1", "QA-7", "QA-7", "Checkout", &[edited.clone()]).expect("save");

    let saved = gateway.list_saved_issues("user-1").expect("list");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].summary, "Checkout");

    let set = gateway.load_test_cases("user-1", "QA-7").expect("load").expect("set should exist");
    assert_eq!(set.test_cases, vec![edited]);
}

#[test]
fn users_are_isolated() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let gateway = open_gateway(&dir.path().join("casegen.db"));

    gateway.save_test_cases("alice", "QA-1", "QA-1", "", &[]).expect("save");
    assert!(gateway.list_saved_issues("bob").expect("list").is_empty());
    assert_eq!(gateway.load_test_cases("bob", "QA-1").expect("load"), None);
    assert!(!gateway.delete_test_cases("bob", "QA-1").expect("delete"));
    assert!(gateway.load_test_cases("alice", "QA-1").expect("load").is_some());
}
