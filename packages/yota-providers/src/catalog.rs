//! YouTube Data API v3 lookups. Raw payloads are decoded into boundary structs here and
//! nowhere else; counts arrive as decimal strings and a missing or garbled count reads as 0.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use yota_config::{CatalogProviderConfig, MAX_BATCH_IDS};
use yota_domain::Language;

use crate::{Error, Result};

/// Parameters of one search call. Results are always requested newest first (`order=date`)
/// so the publish window is exact.
#[derive(Clone, Debug)]
pub struct SearchParams {
	pub query: String,
	pub published_after: OffsetDateTime,
	pub max_results: u32,
	pub region_code: String,
	pub language: Option<Language>,
	pub page_token: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPage {
	pub hits: Vec<SearchHit>,
	pub next_page_token: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
	pub video_id: String,
	pub snippet: Snippet,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snippet {
	pub title: String,
	pub channel_id: String,
	pub channel_title: String,
	pub published_at: Option<OffsetDateTime>,
	pub thumbnail_url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoStatistics {
	pub id: String,
	pub views: u64,
	pub likes: u64,
	pub comments: u64,
	pub duration_code: String,
	pub snippet: Snippet,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChannelStatistics {
	pub id: String,
	pub country: Option<String>,
	pub subscriber_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchResponse {
	#[serde(default)]
	items: Vec<RawSearchItem>,
	next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct RawSearchItem {
	id: RawSearchId,
	#[serde(default)]
	snippet: RawSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchId {
	video_id: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSnippet {
	title: String,
	channel_id: String,
	channel_title: String,
	#[serde(with = "yota_domain::time_serde::option")]
	published_at: Option<OffsetDateTime>,
	thumbnails: RawThumbnails,
}
impl From<RawSnippet> for Snippet {
	fn from(raw: RawSnippet) -> Self {
		Self {
			title: raw.title,
			channel_id: raw.channel_id,
			channel_title: raw.channel_title,
			published_at: raw.published_at,
			thumbnail_url: raw.thumbnails.best_url(),
		}
	}
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawThumbnails {
	high: Option<RawThumbnail>,
	medium: Option<RawThumbnail>,
	default: Option<RawThumbnail>,
}
impl RawThumbnails {
	fn best_url(self) -> String {
		self.high.or(self.medium).or(self.default).map(|thumb| thumb.url).unwrap_or_default()
	}
}

#[derive(Deserialize)]
struct RawThumbnail {
	url: String,
}

#[derive(Deserialize)]
struct RawListResponse<T> {
	#[serde(default = "Vec::new")]
	items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideo {
	id: String,
	#[serde(default)]
	snippet: RawSnippet,
	#[serde(default)]
	statistics: RawVideoCounts,
	#[serde(default)]
	content_details: RawContentDetails,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawVideoCounts {
	view_count: Option<String>,
	like_count: Option<String>,
	comment_count: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawContentDetails {
	duration: String,
}

#[derive(Deserialize)]
struct RawChannel {
	id: String,
	#[serde(default)]
	snippet: RawChannelSnippet,
	#[serde(default)]
	statistics: RawChannelCounts,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawChannelSnippet {
	country: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawChannelCounts {
	subscriber_count: Option<String>,
}

pub async fn search(cfg: &CatalogProviderConfig, params: &SearchParams) -> Result<SearchPage> {
	let published_after = params.published_after.format(&Rfc3339)?;
	let max_results = params.max_results.clamp(1, MAX_BATCH_IDS).to_string();
	let mut query = vec![
		("part", "snippet"),
		("type", "video"),
		("order", "date"),
		("q", params.query.as_str()),
		("publishedAfter", published_after.as_str()),
		("maxResults", max_results.as_str()),
		("regionCode", params.region_code.as_str()),
		("key", cfg.api_key.as_str()),
	];

	if let Some(language) = params.language {
		query.push(("relevanceLanguage", language.as_str()));
	}
	if let Some(token) = params.page_token.as_deref() {
		query.push(("pageToken", token));
	}

	tracing::debug!(query = %params.query, region = %params.region_code, "Catalog search.");

	let json = get(cfg, "search", &query).await?;

	parse_search_response(json)
}

/// Looks up statistics for at most one batch of ids; extra ids are ignored.
pub async fn statistics(
	cfg: &CatalogProviderConfig,
	ids: &[String],
) -> Result<Vec<VideoStatistics>> {
	let batch = batch_ids(ids);

	if batch.is_empty() {
		return Ok(Vec::new());
	}

	let json = get(cfg, "videos", &[
		("part", "snippet,statistics,contentDetails"),
		("id", batch.as_str()),
		("key", cfg.api_key.as_str()),
	])
	.await?;

	parse_videos_response(json)
}

/// Looks up channel country and subscriber counts in as many batches as needed.
pub async fn channels(
	cfg: &CatalogProviderConfig,
	ids: &[String],
) -> Result<Vec<ChannelStatistics>> {
	let mut out = Vec::new();

	for chunk in ids.chunks(MAX_BATCH_IDS as usize) {
		let batch = batch_ids(chunk);

		if batch.is_empty() {
			continue;
		}

		let json = get(cfg, "channels", &[
			("part", "snippet,statistics"),
			("id", batch.as_str()),
			("key", cfg.api_key.as_str()),
		])
		.await?;

		out.extend(parse_channels_response(json)?);
	}

	Ok(out)
}

pub fn parse_search_response(json: Value) -> Result<SearchPage> {
	let raw: RawSearchResponse = serde_json::from_value(json)?;
	let hits = raw
		.items
		.into_iter()
		.filter_map(|item| {
			let video_id = item.id.video_id.filter(|id| !id.is_empty())?;

			Some(SearchHit { video_id, snippet: item.snippet.into() })
		})
		.collect();

	Ok(SearchPage { hits, next_page_token: raw.next_page_token.filter(|token| !token.is_empty()) })
}

pub fn parse_videos_response(json: Value) -> Result<Vec<VideoStatistics>> {
	let raw: RawListResponse<RawVideo> = serde_json::from_value(json)?;

	Ok(raw
		.items
		.into_iter()
		.map(|video| VideoStatistics {
			id: video.id,
			views: count(video.statistics.view_count.as_deref()),
			likes: count(video.statistics.like_count.as_deref()),
			comments: count(video.statistics.comment_count.as_deref()),
			duration_code: video.content_details.duration,
			snippet: video.snippet.into(),
		})
		.collect())
}

pub fn parse_channels_response(json: Value) -> Result<Vec<ChannelStatistics>> {
	let raw: RawListResponse<RawChannel> = serde_json::from_value(json)?;

	Ok(raw
		.items
		.into_iter()
		.map(|channel| ChannelStatistics {
			id: channel.id,
			country: channel.snippet.country.filter(|country| !country.trim().is_empty()),
			subscriber_count: count(channel.statistics.subscriber_count.as_deref()),
		})
		.collect())
}

async fn get(
	cfg: &CatalogProviderConfig,
	resource: &str,
	query: &[(&str, &str)],
) -> Result<Value> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}/{resource}", cfg.api_base);
	let res = client.get(url).query(query).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	if let Some(error) = json.get("error") {
		return Err(Error::invalid_response(format!("Catalog returned an error payload: {error}")));
	}

	Ok(json)
}

fn batch_ids(ids: &[String]) -> String {
	let mut seen = HashSet::new();

	ids.iter()
		.map(|id| id.trim())
		.filter(|id| !id.is_empty() && seen.insert(*id))
		.take(MAX_BATCH_IDS as usize)
		.collect::<Vec<_>>()
		.join(",")
}

fn count(raw: Option<&str>) -> u64 {
	raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}
