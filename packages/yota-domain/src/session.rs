use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{theme, video::VideoCandidate};

/// Not-interested strikes after which a channel is blocked outright.
pub const AUTO_BLOCK_STRIKES: u32 = 2;

/// Feedback accumulated by the client. The pipeline reads a snapshot of it per request and
/// never writes it back.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSignals {
	pub hidden_video_ids: BTreeSet<String>,
	pub blocked_channel_ids: BTreeSet<String>,
	pub channel_not_interested_count: BTreeMap<String, u32>,
	pub theme_dislikes: BTreeSet<String>,
	pub liked_themes: BTreeSet<String>,
	pub saved_video_ids: BTreeSet<String>,
}
impl SessionSignals {
	pub fn strikes(&self, channel_id: &str) -> u32 {
		self.channel_not_interested_count.get(channel_id).copied().unwrap_or(0)
	}

	/// Hidden videos and blocked channels are dropped. A channel at the strike limit counts as
	/// blocked even when the snapshot's block set missed it.
	pub fn is_excluded(&self, video: &VideoCandidate) -> bool {
		self.hidden_video_ids.contains(&video.id)
			|| self.blocked_channel_ids.contains(&video.channel_id)
			|| self.strikes(&video.channel_id) >= AUTO_BLOCK_STRIKES
	}

	/// Client-side "not interested" action.
	pub fn mark_not_interested(&mut self, video: &VideoCandidate) {
		self.hidden_video_ids.insert(video.id.clone());

		let strikes =
			self.channel_not_interested_count.entry(video.channel_id.clone()).or_insert(0);

		*strikes += 1;

		if *strikes >= AUTO_BLOCK_STRIKES {
			self.blocked_channel_ids.insert(video.channel_id.clone());
		}

		for theme in theme::detect_themes(&video.title) {
			self.theme_dislikes.insert(theme.to_string());
		}
	}

	/// Client-side "save" action.
	pub fn save(&mut self, video: &VideoCandidate) {
		self.saved_video_ids.insert(video.id.clone());

		for theme in theme::detect_themes(&video.title) {
			self.liked_themes.insert(theme.to_string());
		}
	}
}

/// Per-feed-session state owned by the caller: passed in with each page request and returned
/// updated with the page.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedSessionState {
	pub shown_ids: BTreeSet<String>,
}
