use serde::Deserialize;
use serde_json::Value;

use yota_config::LlmProviderConfig;
use yota_domain::personalize::{RelevanceScore, RerankRequest};

use crate::{Error, Result};

const SYSTEM_PROMPT: &str = "\
You score how relevant each video is to a viewer's intent. Avoid the listed blocked channels \
and disliked themes. Reply with JSON only, shaped as {\"scores\": [{\"videoId\": string, \
\"aiRelevanceScore\": number between 0 and 1}]}, one entry per input video.";

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScores {
	Wrapped { scores: Vec<RawScore> },
	Bare(Vec<RawScore>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScore {
	#[serde(alias = "id", alias = "video_id")]
	video_id: String,
	#[serde(alias = "score", alias = "ai_relevance_score")]
	ai_relevance_score: f64,
}

pub fn build_messages(request: &RerankRequest) -> Result<Vec<Value>> {
	let payload = serde_json::to_string(request)?;

	Ok(vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": payload }),
	])
}

pub async fn rerank(
	cfg: &LlmProviderConfig,
	request: &RerankRequest,
) -> Result<Vec<RelevanceScore>> {
	let content = crate::llm::chat(cfg, &build_messages(request)?).await?;

	parse_scores(&content)
}

/// Accepts `{"scores": [...]}` or a bare array. Scores outside `0..=1` are an error, not
/// clamped, since they signal the model ignored the contract.
pub fn parse_scores(content: &str) -> Result<Vec<RelevanceScore>> {
	let json = crate::llm::parse_json_content(content)?;
	let raw = match serde_json::from_value(json)? {
		RawScores::Wrapped { scores } | RawScores::Bare(scores) => scores,
	};

	raw.into_iter()
		.map(|score| {
			if !(0.0..=1.0).contains(&score.ai_relevance_score) {
				return Err(Error::invalid_response(format!(
					"Relevance score for {} is out of range.",
					score.video_id
				)));
			}

			Ok(RelevanceScore {
				video_id: score.video_id,
				ai_relevance_score: score.ai_relevance_score,
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_wrapped_and_bare_lists() {
		let wrapped =
			parse_scores("{\"scores\": [{\"videoId\": \"a\", \"aiRelevanceScore\": 0.9}]}")
				.expect("Failed to parse wrapped scores.");
		let bare = parse_scores("Here: [{\"id\": \"b\", \"score\": 0.1}]")
			.expect("Failed to parse bare scores.");

		assert_eq!(wrapped[0].video_id, "a");
		assert_eq!(bare[0].video_id, "b");
		assert!((bare[0].ai_relevance_score - 0.1).abs() < 1e-12);
	}

	#[test]
	fn malformed_output_is_an_error() {
		assert!(parse_scores("Sorry, I can't rank these.").is_err());
		assert!(parse_scores("{\"scores\": [{\"videoId\": \"a\"}]}").is_err());
		assert!(parse_scores("[{\"videoId\": \"a\", \"aiRelevanceScore\": 3}]").is_err());
	}
}
