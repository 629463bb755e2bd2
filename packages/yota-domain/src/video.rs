use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::mode::Mode;

pub const MIN_AGE_HOURS: f64 = 1.0;
pub const MIN_AGE_DAYS: f64 = 0.1;

/// One discovered video as merged from search, statistics and channel lookups.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
	pub id: String,
	pub title: String,
	pub channel_id: String,
	pub channel_title: String,
	#[serde(default)]
	pub channel_country: Option<String>,
	/// Zero when the channel lookup failed or the count is hidden.
	#[serde(default)]
	pub subscriber_count: u64,
	#[serde(default)]
	pub thumbnail_url: String,
	#[serde(default, with = "crate::time_serde::option")]
	pub published_at: Option<OffsetDateTime>,
	#[serde(default)]
	pub duration_code: String,
	#[serde(default)]
	pub views: u64,
	#[serde(default)]
	pub likes: u64,
	#[serde(default)]
	pub comments: u64,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetrics {
	pub age_hours: f64,
	pub age_days: f64,
	pub views_per_hour: f64,
	pub views_per_day: f64,
	pub like_rate: f64,
	pub comment_rate: f64,
	pub engagement_rate: f64,
}
impl VideoMetrics {
	/// Age is floored so just-published videos cannot blow up the velocity terms. A missing
	/// publish date is treated as just published; scoring zeroes such candidates separately.
	pub fn compute(video: &VideoCandidate, now: OffsetDateTime) -> Self {
		let elapsed_hours = video
			.published_at
			.map(|published_at| (now - published_at).as_seconds_f64() / 3_600.0)
			.unwrap_or(0.0);
		let age_hours = elapsed_hours.max(MIN_AGE_HOURS);
		let age_days = (age_hours / 24.0).max(MIN_AGE_DAYS);
		let views = video.views as f64;
		let (like_rate, comment_rate, engagement_rate) = if video.views > 0 {
			let likes = video.likes as f64;
			let comments = video.comments as f64;

			(likes / views, comments / views, (likes + 2.0 * comments) / views)
		} else {
			(0.0, 0.0, 0.0)
		};

		Self {
			age_hours,
			age_days,
			views_per_hour: views / age_hours,
			views_per_day: views / age_days,
			like_rate,
			comment_rate,
			engagement_rate,
		}
	}
}

/// Every term that went into a score, kept so the ranking stays explainable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
	pub mode: Mode,
	pub views_per_hour: f64,
	pub views_per_day: f64,
	pub engagement_rate: f64,
	pub like_rate: f64,
	pub comment_rate: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub freshness_boost: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub diversity_factor: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub channel_occurrence: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub locality_match: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub raw_velocity: Option<f64>,
	/// Heuristic relevance in `forYou`, or the external re-ranker's score once blended.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ai_relevance_score: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub velocity_points: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub engagement_points: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recency_points: Option<f64>,
	/// Score straight out of the mode formula.
	pub base_score: f64,
	/// Product of all session-learned penalties and boosts.
	pub personalization_multiplier: f64,
	pub ai_blended: bool,
}
impl ScoreBreakdown {
	pub fn new(mode: Mode, metrics: &VideoMetrics) -> Self {
		Self {
			mode,
			views_per_hour: metrics.views_per_hour,
			views_per_day: metrics.views_per_day,
			engagement_rate: metrics.engagement_rate,
			like_rate: metrics.like_rate,
			comment_rate: metrics.comment_rate,
			freshness_boost: None,
			diversity_factor: None,
			channel_occurrence: None,
			locality_match: None,
			raw_velocity: None,
			ai_relevance_score: None,
			velocity_points: None,
			engagement_points: None,
			recency_points: None,
			base_score: 0.0,
			personalization_multiplier: 1.0,
			ai_blended: false,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredVideo {
	#[serde(flatten)]
	pub video: VideoCandidate,
	#[serde(flatten)]
	pub metrics: VideoMetrics,
	pub themes: Vec<String>,
	pub score: f64,
	pub score_breakdown: ScoreBreakdown,
	pub explanation: String,
}
