use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{session::SessionSignals, video::ScoredVideo};

/// Relevance assumed for ids the re-ranker did not score.
pub const NEUTRAL_RELEVANCE: f64 = 0.5;
pub const SUMMARY_TITLE_CHARS: usize = 80;

#[derive(Clone, Copy, Debug)]
pub struct PersonalizationWeights {
	pub theme_dislike: f64,
	pub liked_theme: f64,
	pub channel_strike: f64,
}
impl From<&yota_config::Personalization> for PersonalizationWeights {
	fn from(cfg: &yota_config::Personalization) -> Self {
		Self {
			theme_dislike: cfg.theme_dislike_multiplier,
			liked_theme: cfg.liked_theme_multiplier,
			channel_strike: cfg.channel_strike_multiplier,
		}
	}
}

/// Compact view of a candidate sent to the external re-ranker.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankSummary {
	pub video_id: String,
	pub title: String,
	pub channel: String,
	pub views: u64,
	pub age_hours: f64,
	pub engagement_rate: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankRequest {
	pub videos: Vec<RerankSummary>,
	pub intent_summary: String,
	pub user_country: String,
	pub blocked_channel_ids: Vec<String>,
	pub theme_dislikes: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceScore {
	pub video_id: String,
	pub ai_relevance_score: f64,
}

/// Drops hidden videos and blocked channels, then applies the session's multiplicative
/// penalties and boosts. Output order is unchanged; callers re-rank.
pub fn apply_session_signals(
	candidates: Vec<ScoredVideo>,
	signals: &SessionSignals,
	weights: &PersonalizationWeights,
) -> Vec<ScoredVideo> {
	candidates
		.into_iter()
		.filter(|item| !signals.is_excluded(&item.video))
		.map(|mut item| {
			let multiplier = session_multiplier(&item, signals, weights);

			item.score *= multiplier;
			item.score_breakdown.personalization_multiplier = multiplier;

			item
		})
		.collect()
}

pub fn session_multiplier(
	item: &ScoredVideo,
	signals: &SessionSignals,
	weights: &PersonalizationWeights,
) -> f64 {
	let mut multiplier = 1.0;

	if item.themes.iter().any(|theme| signals.theme_dislikes.contains(theme)) {
		multiplier *= weights.theme_dislike;
	}
	if item.themes.iter().any(|theme| signals.liked_themes.contains(theme)) {
		multiplier *= weights.liked_theme;
	}
	// A second strike blocks the channel, so only exactly one strike is penalized here.
	if signals.strikes(&item.video.channel_id) == 1 {
		multiplier *= weights.channel_strike;
	}

	multiplier
}

/// Builds the re-ranker request from the first `max_candidates` of an already ranked list.
pub fn build_rerank_request(
	ranked: &[ScoredVideo],
	max_candidates: usize,
	signals: &SessionSignals,
	intent_summary: &str,
	user_country: &str,
) -> RerankRequest {
	let videos = ranked
		.iter()
		.take(max_candidates)
		.map(|item| RerankSummary {
			video_id: item.video.id.clone(),
			title: item.video.title.chars().take(SUMMARY_TITLE_CHARS).collect(),
			channel: item.video.channel_title.clone(),
			views: item.video.views,
			age_hours: (item.metrics.age_hours * 10.0).round() / 10.0,
			engagement_rate: (item.metrics.engagement_rate * 10_000.0).round() / 10_000.0,
		})
		.collect();

	RerankRequest {
		videos,
		intent_summary: intent_summary.to_string(),
		user_country: user_country.to_string(),
		blocked_channel_ids: signals.blocked_channel_ids.iter().cloned().collect(),
		theme_dislikes: signals.theme_dislikes.iter().cloned().collect(),
	}
}

/// `score = base * base_weight + base * relevance * ai_weight`. Every candidate is blended;
/// ids absent from `scores` use the neutral relevance.
pub fn blend_relevance(
	candidates: &mut [ScoredVideo],
	scores: &[RelevanceScore],
	base_weight: f64,
	ai_weight: f64,
) {
	let by_id: HashMap<&str, f64> = scores
		.iter()
		.filter(|score| score.ai_relevance_score.is_finite())
		.map(|score| (score.video_id.as_str(), score.ai_relevance_score.clamp(0.0, 1.0)))
		.collect();

	for item in candidates {
		let relevance = by_id.get(item.video.id.as_str()).copied().unwrap_or(NEUTRAL_RELEVANCE);
		let base = item.score;

		item.score = base * base_weight + base * relevance * ai_weight;
		item.score_breakdown.ai_relevance_score = Some(relevance);
		item.score_breakdown.ai_blended = true;
	}
}
