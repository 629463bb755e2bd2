use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
	scoring::cmp_f64_desc,
	video::{ScoredVideo, VideoCandidate, VideoMetrics},
};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTrend {
	pub channel_id: String,
	pub channel_title: String,
	/// Mean score of the channel's ranked videos, rounded to two decimals.
	pub trend_score: f64,
	pub video_count: u32,
}

/// Human-readable reason a video ranks where it does.
pub fn explain(video: &VideoCandidate, metrics: &VideoMetrics) -> String {
	let mut parts = Vec::with_capacity(3);
	let velocity = metrics.views_per_day;

	parts.push(if velocity > 50_000.0 {
		"Explosive growth"
	} else if velocity > 20_000.0 {
		"High velocity"
	} else if velocity > 5_000.0 {
		"Strong momentum"
	} else {
		"Steady growth"
	});

	let engagement_pct = if video.views > 0 {
		(video.likes + video.comments) as f64 / video.views as f64 * 100.0
	} else {
		0.0
	};

	if engagement_pct > 5.0 {
		parts.push("Very engaged audience");
	} else if engagement_pct > 3.0 {
		parts.push("Good engagement");
	}

	if video.published_at.is_some() {
		if metrics.age_days <= 3.0 {
			parts.push("Just published");
		} else if metrics.age_days <= 7.0 {
			parts.push("Fresh content");
		}
	}

	parts.join(" • ")
}

/// Groups ranked videos by channel. Videos without a channel id are skipped.
pub fn trending_channels(videos: &[ScoredVideo]) -> Vec<ChannelTrend> {
	let mut order: Vec<&str> = Vec::new();
	let mut groups: HashMap<&str, (&str, f64, u32)> = HashMap::new();

	for item in videos {
		let channel_id = item.video.channel_id.as_str();

		if channel_id.is_empty() {
			continue;
		}

		let entry = groups.entry(channel_id).or_insert_with(|| {
			order.push(channel_id);

			(item.video.channel_title.as_str(), 0.0, 0)
		});

		entry.1 += item.score;
		entry.2 += 1;
	}

	let mut channels: Vec<ChannelTrend> = order
		.into_iter()
		.filter_map(|channel_id| {
			let (title, total, count) = groups.get(channel_id)?;
			let mean = total / f64::from(*count);

			Some(ChannelTrend {
				channel_id: channel_id.to_string(),
				channel_title: title.to_string(),
				trend_score: (mean * 100.0).round() / 100.0,
				video_count: *count,
			})
		})
		.collect();

	channels.sort_by(|a, b| cmp_f64_desc(a.trend_score, b.trend_score));

	channels
}

#[cfg(test)]
mod tests {
	use time::{Duration, OffsetDateTime};

	use super::*;
	use crate::{
		mode::Mode,
		scoring::{ScoringContext, score_video},
	};

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("Valid timestamp.")
	}

	fn scored(id: &str, channel: &str, views: u64, likes: u64, age_days: i64) -> ScoredVideo {
		let ctx = ScoringContext {
			now: now(),
			region_code: "US",
			rising_small_max_subs: 200_000,
			wildcard_diversity_decay: 0.6,
		};
		let video = VideoCandidate {
			id: id.to_string(),
			title: id.to_string(),
			channel_id: channel.to_string(),
			channel_title: format!("{channel} title"),
			views,
			likes,
			published_at: Some(now() - Duration::days(age_days)),
			..Default::default()
		};

		score_video(video, Mode::LegacySearch, &ctx, 1)
	}

	#[test]
	fn explains_velocity_engagement_and_recency() {
		let item = scored("v", "c", 120_000, 5_800, 2);

		assert_eq!(item.explanation, "Explosive growth • Good engagement • Just published");

		let item = scored("w", "c", 10_000, 0, 20);

		assert_eq!(item.explanation, "Steady growth");
	}

	#[test]
	fn aggregates_channels_by_mean_score() {
		let videos = vec![
			scored("a1", "a", 1_000_000, 0, 2),
			scored("b1", "b", 10, 0, 40),
			scored("a2", "a", 10, 0, 40),
			scored("orphan", "", 1_000_000, 0, 2),
		];
		let channels = trending_channels(&videos);

		assert_eq!(channels.len(), 2);
		assert_eq!(channels[0].channel_id, "a");
		assert_eq!(channels[0].video_count, 2);
		assert_eq!(channels[0].trend_score, 40.0);
		assert_eq!(channels[1].channel_title, "b title");
	}
}
