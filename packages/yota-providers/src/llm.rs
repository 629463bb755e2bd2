//! OpenAI-compatible chat completion calls shared by the planner and the re-ranker.

use serde_json::Value;

use yota_config::LlmProviderConfig;

use crate::{Error, Result};

/// Sends one chat completion and returns the first choice's message content. A single
/// attempt; callers degrade on any error.
pub async fn chat(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	message_content(&json)
}

pub fn message_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::invalid_response("Chat response is missing message content."))
}

/// Strips Markdown code fences and any prose around the outermost JSON object or array.
pub fn strip_json_wrapping(raw: &str) -> &str {
	let trimmed = raw.trim();
	let Some(start) = trimmed.find(['{', '[']) else {
		return trimmed;
	};
	let close = if trimmed[start..].starts_with('{') { '}' } else { ']' };

	match trimmed.rfind(close) {
		Some(end) if end > start => &trimmed[start..=end],
		_ => trimmed,
	}
}

/// Parses model output as JSON after removing common wrapping.
pub fn parse_json_content(raw: &str) -> Result<Value> {
	serde_json::from_str(strip_json_wrapping(raw))
		.map_err(|err| Error::invalid_response(format!("Model output is not valid JSON: {err}")))
}
