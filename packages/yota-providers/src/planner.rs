use serde::Deserialize;
use serde_json::Value;

use yota_config::LlmProviderConfig;
use yota_domain::{
	Language, Mode,
	planner::{MAX_PLAN_QUERIES, PlanSource, SearchPlan},
};

use crate::{Error, Result};

const SYSTEM_PROMPT: &str = "\
You plan YouTube searches for a discovery feed of recent videos. Reply with one JSON object \
and nothing else, shaped as {\"queries\": [string], \"suggestedWindowDays\": 1 | 7 | 30, \
\"suggestedMode\": \"trending\" | \"weekMovers\" | \"risingSmall\" | \"wildcard\" | \"forYou\", \
\"mustInclude\": [string], \"languageHint\": \"en\" | \"es\" | null, \"intentSummary\": string}. \
Give between one and six short queries, the most literal one first.";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
	#[serde(default)]
	queries: Vec<String>,
	suggested_window_days: Option<u32>,
	suggested_mode: Option<String>,
	#[serde(default)]
	must_include: Vec<String>,
	language_hint: Option<String>,
	#[serde(default)]
	intent_summary: String,
}

pub fn build_messages(query: &str, user_country: &str) -> Vec<Value> {
	let user = serde_json::json!({ "query": query, "userCountry": user_country });

	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user.to_string() }),
	]
}

pub async fn plan(cfg: &LlmProviderConfig, query: &str, user_country: &str) -> Result<SearchPlan> {
	let content = crate::llm::chat(cfg, &build_messages(query, user_country)).await?;

	parse_plan(&content)
}

/// Decodes planner output into a plan. Unknown modes or languages are dropped rather than
/// failing the whole plan; a missing query list or window is an error.
pub fn parse_plan(content: &str) -> Result<SearchPlan> {
	let json = crate::llm::parse_json_content(content)?;
	let raw: RawPlan = serde_json::from_value(json)?;
	let Some(window_days) = raw.suggested_window_days else {
		return Err(Error::invalid_response("Plan is missing suggestedWindowDays."));
	};

	if raw.queries.iter().all(|query| query.trim().is_empty()) {
		return Err(Error::invalid_response("Plan has no queries."));
	}

	let suggested_mode = raw
		.suggested_mode
		.and_then(|mode| mode.parse::<Mode>().ok())
		.unwrap_or_else(|| Mode::for_window(window_days));
	let mut queries = raw.queries;

	queries.truncate(MAX_PLAN_QUERIES);

	Ok(SearchPlan {
		queries,
		suggested_window_days: window_days,
		suggested_mode,
		must_include: raw.must_include,
		language_hint: raw.language_hint.as_deref().and_then(Language::parse),
		intent_summary: raw.intent_summary,
		source: PlanSource::Planner,
	})
}
