// Envelope of the LLM `generateContent` call and extraction of its reply.

use serde_json::{json, Map, Value};

use crate::error::CasegenError;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const JSON_MIME_TYPE: &str = "application/json";

/// Build the single-turn request body sent upstream.
///
/// `generation_config` is used as given when it is an object and replaced by
/// `{}` otherwise. A `response_schema` switches the reply to JSON: it is set
/// as `generationConfig.responseSchema` together with
/// `generationConfig.responseMimeType = "application/json"`, overriding any
/// caller-provided values for those two keys.
pub fn build_generate_content_body(
    prompt: &str,
    generation_config: Option<&Value>,
    response_schema: Option<&Value>,
) -> Value {
    let mut config =
        generation_config.and_then(Value::as_object).cloned().unwrap_or_else(Map::new);

    if let Some(schema) = response_schema {
        config.insert("responseMimeType".to_string(), Value::String(JSON_MIME_TYPE.to_string()));
        config.insert("responseSchema".to_string(), schema.clone());
    }

    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": Value::Object(config),
    })
}

/// Upstream URL for one model. The key travels as a query parameter.
pub fn generate_content_url(base_url: &str, model: &str) -> String {
    format!("{}/models/{model}:generateContent", base_url.trim_end_matches('/'))
}

/// Concatenated text of the first candidate's parts.
pub fn reply_text(response: &Value) -> Result<String, CasegenError> {
    let parts = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.pointer("/content/parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| CasegenError::shape("LLM reply has no candidate content"))?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<String>();

    if text.trim().is_empty() {
        let reason = response
            .pointer("/candidates/0/finishReason")
            .and_then(Value::as_str)
            .unwrap_or("no text");
        return Err(CasegenError::shape(format!("LLM reply is empty ({reason})")));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_generate_content_body, generate_content_url, reply_text};
    use crate::error::CasegenError;

    #[test]
    fn schema_without_config_sets_json_mime_type() {
        let schema = json!({ "type": "ARRAY" });
        let body = build_generate_content_body("list cases", None, Some(&schema));

        assert_eq!(body["contents"][0]["parts"][0]["text"], "list cases");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
    }

    #[test]
    fn caller_config_is_kept_and_schema_wins() {
        let config = json!({ "temperature": 0.2, "responseMimeType": "text/plain" });
        let schema = json!({ "type": "OBJECT" });
        let body = build_generate_content_body("p", Some(&config), Some(&schema));

        assert_eq!(
            body["generationConfig"],
            json!({
                "temperature": 0.2,
                "responseMimeType": "application/json",
                "responseSchema": { "type": "OBJECT" }
            })
        );
    }

    #[test]
    fn plain_prompt_gets_empty_config() {
        let body = build_generate_content_body("p", Some(&json!("not an object")), None);
        assert_eq!(body["generationConfig"], json!({}));
    }

    #[test]
    fn url_joins_base_and_model() {
        assert_eq!(
            generate_content_url("https://llm.example/v1beta/", "flash"),
            "https://llm.example/v1beta/models/flash:generateContent"
        );
    }

    #[test]
    fn reply_text_joins_parts() {
        let reply = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello, " }, { "text": "world" }] } }]
        });
        assert_eq!(reply_text(&reply).expect("reply should have text"), "Hello, world");
    }

    #[test]
    fn reply_without_candidates_is_a_shape_error() {
        let error = reply_text(&json!({ "promptFeedback": {} })).expect_err("should fail");
        assert!(matches!(error, CasegenError::ResponseShapeUnexpected(_)));

        let blocked = json!({ "candidates": [{ "content": { "parts": [] }, "finishReason": "SAFETY" }] });
        let error = reply_text(&blocked).expect_err("should fail");
        assert_eq!(error, CasegenError::shape("LLM reply is empty (SAFETY)"));
    }
}
