// Per-session working state for the presentation layer.
//
// One fetch, generation, load, or save runs at a time. Starting an operation
// hands out an `OperationTicket`; the ticket is consumed when the outcome is
// applied. A failed outcome records a message and leaves every other field
// as it was.

use std::fmt;

use casegen_common::error::CasegenError;
use casegen_common::generation::GenerationKind;
use casegen_common::types::{IssueRecord, TestCase, TestCaseKind, TestCaseSet, UserConfig};
use casegen_store::PersistenceGateway;
use serde::Serialize;
use thiserror::Error;

use crate::client::ProxyClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Generate(GenerationKind),
    Load,
    Save,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Generate(kind) => write!(f, "generate {kind}"),
            Self::Load => f.write_str("load"),
            Self::Save => f.write_str("save"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("cannot start {requested}: {running} is still in progress")]
    Busy { requested: Operation, running: Operation },
    #[error("no issue has been fetched")]
    NoIssue,
    #[error("there is no draft to save; generate or load test cases first")]
    NothingToSave,
    #[error("test case {0} does not exist")]
    NoSuchTestCase(usize),
    #[error("test case {case} has no step {step}")]
    NoSuchStep { case: usize, step: usize },
    #[error("test case title must not be empty")]
    EmptyTitle,
    #[error("{0} does not produce generated text")]
    NotTextGeneration(Operation),
    #[error(transparent)]
    Failed(#[from] CasegenError),
}

/// Proof that an operation was started. Consumed when its outcome is applied.
#[derive(Debug)]
#[must_use = "apply the outcome to release the in-flight flag"]
pub struct OperationTicket {
    operation: Operation,
}

/// Where the current draft came from; used to key and label a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOrigin {
    pub issue_id: String,
    pub issue_key: String,
    pub summary: String,
}

#[derive(Debug, Default)]
pub struct Session {
    issue_id: Option<String>,
    issue: Option<IssueRecord>,
    summary: Option<String>,
    acceptance_criteria: Option<String>,
    draft: Vec<TestCase>,
    draft_origin: Option<DraftOrigin>,
    dirty: bool,
    in_flight: Option<Operation>,
    messages: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Option<&IssueRecord> {
        self.issue.as_ref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn acceptance_criteria(&self) -> Option<&str> {
        self.acceptance_criteria.as_deref()
    }

    pub fn draft(&self) -> &[TestCase] {
        &self.draft
    }

    pub fn draft_origin(&self) -> Option<&DraftOrigin> {
        self.draft_origin.as_ref()
    }

    /// Whether the draft has changes that are not saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    // ── operation lifecycle ────────────────────────────────────────────

    pub fn begin(&mut self, operation: Operation) -> Result<OperationTicket, SessionError> {
        if let Some(running) = self.in_flight {
            let error = SessionError::Busy { requested: operation, running };
            self.push(MessageLevel::Error, error.to_string());
            return Err(error);
        }
        self.in_flight = Some(operation);
        Ok(OperationTicket { operation })
    }

    fn finish<T>(
        &mut self,
        ticket: OperationTicket,
        outcome: Result<T, CasegenError>,
    ) -> Result<T, SessionError> {
        debug_assert_eq!(self.in_flight, Some(ticket.operation));
        self.in_flight = None;
        outcome.map_err(|error| {
            tracing::warn!(operation = %ticket.operation, code = error.code(), "operation failed");
            self.push(MessageLevel::Error, format!("{} failed: {error}", ticket.operation));
            SessionError::Failed(error)
        })
    }

    /// Apply a fetch outcome. A new issue replaces the previous one and
    /// clears the generated text; the draft is kept until it is replaced.
    pub fn apply_fetch(
        &mut self,
        ticket: OperationTicket,
        issue_id: &str,
        outcome: Result<IssueRecord, CasegenError>,
    ) -> Result<&IssueRecord, SessionError> {
        let issue = self.finish(ticket, outcome)?;
        self.push(MessageLevel::Info, format!("Fetched {}", issue.key));
        self.issue_id = Some(issue_id.trim().to_string());
        self.summary = None;
        self.acceptance_criteria = None;
        Ok(self.issue.insert(issue))
    }

    pub fn apply_text(
        &mut self,
        ticket: OperationTicket,
        outcome: Result<String, CasegenError>,
    ) -> Result<&str, SessionError> {
        let operation = ticket.operation;
        let text = self.finish(ticket, outcome)?;
        let (label, slot) = match operation {
            Operation::Generate(GenerationKind::Summary) => ("summary", &mut self.summary),
            Operation::Generate(GenerationKind::AcceptanceCriteria) => {
                ("acceptance criteria", &mut self.acceptance_criteria)
            }
            other => return Err(SessionError::NotTextGeneration(other)),
        };
        let text = slot.insert(text).as_str();
        let message = Message { level: MessageLevel::Info, text: format!("Generated {label}") };
        self.messages.push(message);
        Ok(text)
    }

    /// Replace the draft with freshly generated cases for the current issue.
    pub fn apply_test_cases(
        &mut self,
        ticket: OperationTicket,
        outcome: Result<Vec<TestCase>, CasegenError>,
    ) -> Result<&[TestCase], SessionError> {
        let cases = self.finish(ticket, outcome)?;
        let (Some(issue_id), Some(issue)) = (&self.issue_id, &self.issue) else {
            return Err(SessionError::NoIssue);
        };
        self.draft_origin = Some(DraftOrigin {
            issue_id: issue_id.clone(),
            issue_key: issue.key.clone(),
            summary: issue.summary_text().to_string(),
        });
        self.push(MessageLevel::Info, format!("Generated {} test cases", cases.len()));
        self.draft = cases;
        self.dirty = true;
        Ok(&self.draft)
    }

    /// Replace the draft with a saved set. `None` means nothing was saved
    /// under `issue_id`; the draft is left alone in that case.
    pub fn apply_load(
        &mut self,
        ticket: OperationTicket,
        issue_id: &str,
        outcome: Result<Option<TestCaseSet>, CasegenError>,
    ) -> Result<Option<TestCaseSet>, SessionError> {
        let Some(set) = self.finish(ticket, outcome)? else {
            self.push(MessageLevel::Info, format!("No saved test cases for {issue_id}"));
            return Ok(None);
        };
        self.draft_origin = Some(DraftOrigin {
            issue_id: issue_id.to_string(),
            issue_key: set.issue_key.clone(),
            summary: set.summary.clone(),
        });
        self.draft = set.test_cases.clone();
        self.dirty = false;
        self.push(MessageLevel::Info, format!("Loaded {} test cases", set.test_cases.len()));
        Ok(Some(set))
    }

    pub fn apply_save(
        &mut self,
        ticket: OperationTicket,
        outcome: Result<TestCaseSet, CasegenError>,
    ) -> Result<TestCaseSet, SessionError> {
        let set = self.finish(ticket, outcome)?;
        self.dirty = false;
        self.push(MessageLevel::Info, format!("Saved {} test cases", set.test_cases.len()));
        Ok(set)
    }

    // ── orchestration ──────────────────────────────────────────────────

    pub async fn fetch(
        &mut self,
        client: &ProxyClient,
        config: &UserConfig,
        issue_id: &str,
    ) -> Result<&IssueRecord, SessionError> {
        let ticket = self.begin(Operation::Fetch)?;
        let outcome = client.fetch_issue(config, issue_id).await;
        self.apply_fetch(ticket, issue_id, outcome)
    }

    /// Generate the summary or acceptance criteria for the current issue.
    pub async fn generate_text(
        &mut self,
        client: &ProxyClient,
        kind: GenerationKind,
    ) -> Result<&str, SessionError> {
        if kind == GenerationKind::TestCases {
            return Err(SessionError::NotTextGeneration(Operation::Generate(kind)));
        }
        let issue = self.issue.clone().ok_or(SessionError::NoIssue)?;
        let ticket = self.begin(Operation::Generate(kind))?;
        let outcome = client.generate_text(kind, &issue).await;
        self.apply_text(ticket, outcome)
    }

    pub async fn generate_test_cases(
        &mut self,
        client: &ProxyClient,
    ) -> Result<&[TestCase], SessionError> {
        let issue = self.issue.clone().ok_or(SessionError::NoIssue)?;
        let ticket = self.begin(Operation::Generate(GenerationKind::TestCases))?;
        let outcome = client.generate_test_cases(&issue).await;
        self.apply_test_cases(ticket, outcome)
    }

    pub fn load_saved(
        &mut self,
        gateway: &PersistenceGateway,
        user_id: &str,
        issue_id: &str,
    ) -> Result<Option<TestCaseSet>, SessionError> {
        let ticket = self.begin(Operation::Load)?;
        let outcome = gateway.load_test_cases(user_id, issue_id);
        self.apply_load(ticket, issue_id, outcome)
    }

    /// Persist the draft under the issue it was generated for or loaded from.
    /// An emptied draft is saved as an empty set.
    pub fn save(
        &mut self,
        gateway: &PersistenceGateway,
        user_id: &str,
    ) -> Result<TestCaseSet, SessionError> {
        let origin = self.draft_origin.clone().ok_or(SessionError::NothingToSave)?;
        let ticket = self.begin(Operation::Save)?;
        let outcome = gateway.save_test_cases(
            user_id,
            &origin.issue_id,
            &origin.issue_key,
            &origin.summary,
            &self.draft,
        );
        self.apply_save(ticket, outcome)
    }

    // ── cell edits ─────────────────────────────────────────────────────

    pub fn set_title(&mut self, case: usize, title: &str) -> Result<(), SessionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        self.case_mut(case)?.title = title.to_string();
        self.dirty = true;
        Ok(())
    }

    pub fn set_kind(&mut self, case: usize, kind: TestCaseKind) -> Result<(), SessionError> {
        self.case_mut(case)?.kind = kind;
        self.dirty = true;
        Ok(())
    }

    pub fn set_step(&mut self, case: usize, step: usize, text: &str) -> Result<(), SessionError> {
        let slot = self
            .case_mut(case)?
            .steps
            .get_mut(step)
            .ok_or(SessionError::NoSuchStep { case, step })?;
        *slot = text.to_string();
        self.dirty = true;
        Ok(())
    }

    /// Insert before `step`; `step == len` appends.
    pub fn insert_step(
        &mut self,
        case: usize,
        step: usize,
        text: &str,
    ) -> Result<(), SessionError> {
        let steps = &mut self.case_mut(case)?.steps;
        if step > steps.len() {
            return Err(SessionError::NoSuchStep { case, step });
        }
        steps.insert(step, text.to_string());
        self.dirty = true;
        Ok(())
    }

    pub fn remove_step(&mut self, case: usize, step: usize) -> Result<String, SessionError> {
        let steps = &mut self.case_mut(case)?.steps;
        if step >= steps.len() {
            return Err(SessionError::NoSuchStep { case, step });
        }
        let removed = steps.remove(step);
        self.dirty = true;
        Ok(removed)
    }

    /// Append a test case and return its index.
    pub fn add_test_case(&mut self, case: TestCase) -> Result<usize, SessionError> {
        if case.title.trim().is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        self.draft.push(case);
        self.dirty = true;
        Ok(self.draft.len() - 1)
    }

    pub fn remove_test_case(&mut self, case: usize) -> Result<TestCase, SessionError> {
        if case >= self.draft.len() {
            return Err(SessionError::NoSuchTestCase(case));
        }
        self.dirty = true;
        Ok(self.draft.remove(case))
    }

    fn case_mut(&mut self, case: usize) -> Result<&mut TestCase, SessionError> {
        self.draft.get_mut(case).ok_or(SessionError::NoSuchTestCase(case))
    }

    fn push(&mut self, level: MessageLevel, text: String) {
        self.messages.push(Message { level, text });
    }
}
