// POST /api/gemini: run one prompt against the LLM with the server-held key.

use axum::{extract::State, Json};
use casegen_common::protocol::gemini::{build_generate_content_body, generate_content_url};
use casegen_common::protocol::proxy::GenerateRequest;
use serde_json::Value;
use url::Url;

use super::{relay_upstream, ApiState};
use crate::error::{ErrorCode, ProxyError};
use crate::upstream::UpstreamRequest;
use crate::validation::ValidatedJson;

pub async fn generate(
    State(state): State<ApiState>,
    ValidatedJson(request): ValidatedJson<GenerateRequest>,
) -> Result<Json<Value>, ProxyError> {
    let prompt = request.prompt.as_deref().unwrap_or_default();
    if prompt.trim().is_empty() {
        return Err(ProxyError::validation("missing required field: prompt"));
    }

    let Some(api_key) = state.config.gemini_api_key.as_deref() else {
        return Err(ProxyError::new(
            ErrorCode::CredentialMissing,
            "LLM API key is not configured on the proxy",
        ));
    };

    let url = model_url(&state.config.gemini_base_url, &state.config.gemini_model, api_key)?;
    let body = build_generate_content_body(
        prompt,
        request.generation_config.as_ref(),
        request.response_schema.as_ref(),
    );

    tracing::info!(
        model = %state.config.gemini_model,
        prompt_chars = prompt.chars().count(),
        structured = request.response_schema.is_some(),
        "forwarding generation request"
    );

    let upstream_request = UpstreamRequest::post_json(url.as_str(), body);
    relay_upstream("LLM", state.upstream.send(upstream_request).await).map(Json)
}

fn model_url(base_url: &str, model: &str, api_key: &str) -> Result<Url, ProxyError> {
    let mut url = Url::parse(&generate_content_url(base_url, model)).map_err(|err| {
        ProxyError::new(ErrorCode::InternalError, format!("LLM base URL is invalid: {err}"))
    })?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}
