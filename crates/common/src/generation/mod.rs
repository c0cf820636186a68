// Prompt construction for the three generation kinds and parsing of the
// model's replies.
//
// Test-case replies are parsed fail-closed: the whole reply is rejected when
// any item is malformed, so a caller never ends up with a partial draft.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::error::CasegenError;
use crate::protocol::proxy::GenerateRequest;
use crate::types::{IssueRecord, TestCase, TestCaseKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationKind {
    Summary,
    AcceptanceCriteria,
    TestCases,
}

impl GenerationKind {
    pub const ALL: [Self; 3] = [Self::Summary, Self::AcceptanceCriteria, Self::TestCases];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::AcceptanceCriteria => "acceptance_criteria",
            Self::TestCases => "test_cases",
        }
    }

    const fn instructions(self) -> &'static str {
        match self {
            Self::Summary => SUMMARY_PROMPT,
            Self::AcceptanceCriteria => ACCEPTANCE_CRITERIA_PROMPT,
            Self::TestCases => TEST_CASES_PROMPT,
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const SUMMARY_PROMPT: &str = "\
You are a senior QA analyst. Summarize the issue below for a tester.\n\
Rules:\n\
- At most 5 sentences of plain text, no Markdown headings\n\
- Cover the goal of the change, the affected area, and notable risks\n\
- Do not invent requirements that are not stated in the issue\n\
- Output ONLY the summary";

pub const ACCEPTANCE_CRITERIA_PROMPT: &str = "\
You are a senior QA analyst. Write acceptance criteria for the issue below.\n\
Rules:\n\
- One criterion per line, each starting with \"- \"\n\
- Use Given/When/Then phrasing where it fits\n\
- Keep existing acceptance criteria and refine them rather than replacing them\n\
- Output ONLY the list of criteria";

pub const TEST_CASES_PROMPT: &str = "\
You are a senior QA analyst. Write manual test cases for the issue below.\n\
Rules:\n\
- Cover positive paths, negative paths, and edge cases\n\
- Each test case has a short title, a type (Positive, Negative, or Edge Case), and ordered steps\n\
- Each step is one concrete action or check\n\
- Output ONLY a JSON array of test cases";

/// Full prompt text for one kind: fixed instructions followed by the issue.
pub fn build_prompt(kind: GenerationKind, issue: &IssueRecord) -> String {
    format!("{}\n\n{}", kind.instructions(), issue.context_text())
}

/// Proxy request for one kind. Test-case requests carry
/// [`test_case_schema`] so the model answers in JSON.
pub fn build_request(kind: GenerationKind, issue: &IssueRecord) -> GenerateRequest {
    let request = GenerateRequest::text(build_prompt(kind, issue));
    match kind {
        GenerationKind::TestCases => request.with_response_schema(test_case_schema()),
        GenerationKind::Summary | GenerationKind::AcceptanceCriteria => request,
    }
}

/// Response schema (in the LLM's OpenAPI subset) for a list of test cases.
pub fn test_case_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "type": { "type": "STRING", "enum": TestCaseKind::KNOWN_LABELS },
                "steps": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["title", "type", "steps"]
        }
    })
}

/// Trimmed free-text reply (summary or acceptance criteria).
pub fn parse_text_reply(reply: &str) -> Result<String, CasegenError> {
    let text = reply.trim();
    if text.is_empty() {
        return Err(CasegenError::shape("LLM reply is empty"));
    }
    Ok(text.to_string())
}

/// Parse a test-case reply.
///
/// Accepts a JSON array of test cases or an object with a `testCases` array,
/// optionally wrapped in a single Markdown code fence. Every item needs a
/// non-empty `title` and a `steps` array of strings; a missing `type` means
/// Positive. Any violation rejects the whole reply.
pub fn parse_test_cases(reply: &str) -> Result<Vec<TestCase>, CasegenError> {
    let body = strip_code_fence(reply);
    let value: Value = serde_json::from_str(body)
        .map_err(|err| CasegenError::shape(format!("test cases are not valid JSON: {err}")))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(object) => object
            .get("testCases")
            .and_then(Value::as_array)
            .ok_or_else(|| CasegenError::shape("test case object has no `testCases` array"))?,
        _ => return Err(CasegenError::shape("test cases must be a JSON array")),
    };

    items.iter().enumerate().map(|(index, item)| parse_test_case(index, item)).collect()
}

fn parse_test_case(index: usize, item: &Value) -> Result<TestCase, CasegenError> {
    let object = item
        .as_object()
        .ok_or_else(|| CasegenError::shape(format!("test case {index} is not an object")))?;

    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| CasegenError::shape(format!("test case {index} has no title")))?;

    let kind = match object.get("type") {
        None | Some(Value::Null) => TestCaseKind::default(),
        Some(Value::String(label)) if !label.trim().is_empty() => TestCaseKind::parse(label),
        Some(_) => {
            return Err(CasegenError::shape(format!("test case {index} has an invalid type")));
        }
    };

    let steps = object
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| CasegenError::shape(format!("test case {index} has no steps array")))?
        .iter()
        .map(|step| {
            step.as_str().map(|step| step.trim().to_string()).ok_or_else(|| {
                CasegenError::shape(format!("test case {index} has a non-text step"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TestCase { title: title.to_string(), kind, steps })
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```$")
            .expect("code fence pattern should compile")
    })
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    code_fence()
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str().trim())
        .unwrap_or(trimmed)
}
