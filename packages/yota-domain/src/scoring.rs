use std::{cmp::Ordering, collections::HashMap};

use time::OffsetDateTime;

use crate::{
	mode::Mode,
	theme, trend,
	video::{ScoreBreakdown, ScoredVideo, VideoCandidate, VideoMetrics},
};

/// Request-scoped inputs shared by every candidate in one scoring pass.
#[derive(Clone, Copy, Debug)]
pub struct ScoringContext<'a> {
	pub now: OffsetDateTime,
	pub region_code: &'a str,
	pub rising_small_max_subs: u64,
	pub wildcard_diversity_decay: f64,
}
impl<'a> ScoringContext<'a> {
	pub fn new(cfg: &yota_config::Scoring, region_code: &'a str, now: OffsetDateTime) -> Self {
		Self {
			now,
			region_code,
			rising_small_max_subs: cfg.rising_small_max_subs,
			wildcard_diversity_decay: cfg.wildcard_diversity_decay,
		}
	}
}

/// Scores candidates in aggregation order and returns them ranked.
///
/// Wildcard diversity depends on that order: the channel occurrence counter lives only for
/// this call. Rising-small drops candidates whose subscriber count is unknown or at/above the
/// ceiling.
pub fn score_candidates(
	candidates: Vec<VideoCandidate>,
	mode: Mode,
	ctx: &ScoringContext<'_>,
) -> Vec<ScoredVideo> {
	let mut occurrences: HashMap<String, u32> = HashMap::new();
	let mut scored = Vec::with_capacity(candidates.len());

	for video in candidates {
		let occurrence = if mode == Mode::Wildcard {
			let seen = occurrences.entry(video.channel_id.clone()).or_insert(0);

			*seen += 1;

			*seen
		} else {
			1
		};

		scored.push(score_video(video, mode, ctx, occurrence));
	}

	if mode == Mode::RisingSmall {
		scored.retain(|item| {
			item.video.subscriber_count > 0
				&& item.video.subscriber_count < ctx.rising_small_max_subs
		});
	}

	rank_by_score(&mut scored);

	scored
}

/// `channel_occurrence` is the 1-based count of this candidate's channel so far in the pass.
/// Only wildcard reads it.
pub fn score_video(
	video: VideoCandidate,
	mode: Mode,
	ctx: &ScoringContext<'_>,
	channel_occurrence: u32,
) -> ScoredVideo {
	let metrics = VideoMetrics::compute(&video, ctx.now);
	let mut breakdown = ScoreBreakdown::new(mode, &metrics);
	let score = if video.published_at.is_none() {
		0.0
	} else {
		match mode {
			Mode::Trending => trending(&metrics, &mut breakdown),
			Mode::WeekMovers => week_movers(&metrics, &mut breakdown),
			Mode::RisingSmall => rising_small(&metrics),
			Mode::Wildcard => wildcard(
				&metrics,
				channel_occurrence,
				ctx.wildcard_diversity_decay,
				&mut breakdown,
			),
			Mode::ForYou => for_you(&video, &metrics, ctx.region_code, &mut breakdown),
			Mode::LegacySearch => legacy_trend(&video, &metrics, &mut breakdown),
		}
	};

	breakdown.base_score = score;

	let themes = theme::detect_themes(&video.title).into_iter().map(str::to_string).collect();
	let explanation = trend::explain(&video, &metrics);

	ScoredVideo { video, metrics, themes, score, score_breakdown: breakdown, explanation }
}

/// Stable descending sort: ties keep their incoming order.
pub fn rank_by_score(items: &mut [ScoredVideo]) {
	items.sort_by(|a, b| cmp_f64_desc(a.score, b.score));
}

pub fn cmp_f64_desc(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

pub fn diversity_factor(channel_occurrence: u32, decay: f64) -> f64 {
	let repeats = channel_occurrence.max(1) - 1;

	1.0 / (1.0 + decay * repeats as f64)
}

fn trending(metrics: &VideoMetrics, breakdown: &mut ScoreBreakdown) -> f64 {
	let freshness_boost = (1.4 - metrics.age_hours / 24.0).clamp(0.6, 1.4);

	breakdown.freshness_boost = Some(freshness_boost);

	metrics.views_per_hour * (1.0 + 4.0 * metrics.engagement_rate) * freshness_boost
}

fn week_movers(metrics: &VideoMetrics, breakdown: &mut ScoreBreakdown) -> f64 {
	let freshness_boost = (1.2 - metrics.age_days / 7.0).clamp(0.7, 1.2);

	breakdown.freshness_boost = Some(freshness_boost);

	metrics.views_per_day * (1.0 + 3.0 * metrics.engagement_rate) * freshness_boost
}

fn rising_small(metrics: &VideoMetrics) -> f64 {
	metrics.views_per_day * (1.0 + 4.0 * metrics.engagement_rate)
}

fn wildcard(
	metrics: &VideoMetrics,
	channel_occurrence: u32,
	decay: f64,
	breakdown: &mut ScoreBreakdown,
) -> f64 {
	let factor = diversity_factor(channel_occurrence, decay);

	breakdown.diversity_factor = Some(factor);
	breakdown.channel_occurrence = Some(channel_occurrence);

	metrics.views_per_day * (1.0 + 3.0 * metrics.engagement_rate) * factor
}

fn for_you(
	video: &VideoCandidate,
	metrics: &VideoMetrics,
	region_code: &str,
	breakdown: &mut ScoreBreakdown,
) -> f64 {
	let locality_match = video
		.channel_country
		.as_deref()
		.map(|country| country.eq_ignore_ascii_case(region_code))
		.unwrap_or(false);
	let mut relevance = 0.5;

	if locality_match {
		relevance += 0.3;
	}
	if metrics.age_hours < 48.0 {
		relevance += 0.2;
	}
	if metrics.like_rate > 0.05 {
		relevance += 0.1;
	}
	if metrics.comment_rate > 0.005 {
		relevance += 0.1;
	}

	let relevance = f64::min(relevance, 1.0);
	let raw_velocity =
		metrics.views_per_day * (1.0 + 3.0 * metrics.like_rate + 10.0 * metrics.comment_rate);

	breakdown.locality_match = Some(locality_match);
	breakdown.ai_relevance_score = Some(relevance);
	breakdown.raw_velocity = Some(raw_velocity);

	raw_velocity * (1.0 + relevance)
}

/// 0-100 trend score: velocity (50) + engagement (30) + recency (20).
fn legacy_trend(
	video: &VideoCandidate,
	metrics: &VideoMetrics,
	breakdown: &mut ScoreBreakdown,
) -> f64 {
	if video.views == 0 {
		return 0.0;
	}

	let views = video.views as f64;
	let velocity_points = f64::min(metrics.views_per_day / 10_000.0, 1.0) * 50.0;
	let engagement_points =
		f64::min((video.likes + video.comments) as f64 / views * 10.0, 1.0) * 30.0;
	let recency_points = if metrics.age_days <= 7.0 {
		20.0
	} else if metrics.age_days <= 14.0 {
		15.0
	} else {
		10.0
	};

	breakdown.velocity_points = Some(velocity_points);
	breakdown.engagement_points = Some(engagement_points);
	breakdown.recency_points = Some(recency_points);

	(velocity_points + engagement_points + recency_points).round()
}
