//! Candidate aggregation: fan the planned queries out per language branch, merge in branch
//! order with first-sighting deduplication, cap, then enrich with statistics and channels.

use std::collections::{HashMap, HashSet};

use futures::future;
use time::{Duration, OffsetDateTime};

use yota_domain::{LanguageMode, VideoCandidate};
use yota_providers::catalog::{SearchPage, SearchParams, Snippet};

use crate::{Error, Result, YotaService};

#[derive(Clone, Debug)]
pub struct AggregateParams<'a> {
	pub queries: &'a [String],
	pub window_days: u32,
	pub region_code: &'a str,
	pub language_mode: LanguageMode,
	/// Continuation token for the primary branch only.
	pub page_token: Option<&'a str>,
	pub max_results: u32,
	pub now: OffsetDateTime,
}

#[derive(Clone, Debug, Default)]
pub struct Aggregated {
	pub candidates: Vec<VideoCandidate>,
	/// Token of the primary branch: the first query of the first language.
	pub next_page_token: Option<String>,
}

impl YotaService {
	pub async fn aggregate(&self, params: AggregateParams<'_>) -> Result<Aggregated> {
		let catalog_cfg = &self.cfg.providers.catalog;
		let max_queries = self.cfg.discovery.max_queries as usize;
		let published_after = params.now - Duration::days(i64::from(params.window_days));
		let mut branches = Vec::new();

		for (language_idx, language) in params.language_mode.languages().iter().enumerate() {
			for (query_idx, query) in params.queries.iter().take(max_queries).enumerate() {
				let primary = language_idx == 0 && query_idx == 0;

				branches.push(SearchParams {
					query: query.clone(),
					published_after,
					max_results: params.max_results,
					region_code: params.region_code.to_string(),
					language: Some(*language),
					page_token: params.page_token.filter(|_| primary).map(str::to_string),
				});
			}
		}

		let pages = future::join_all(branches.iter().map(|search| async move {
			match self.providers.catalog.search(catalog_cfg, search).await {
				Ok(page) => page,
				Err(err) => {
					tracing::warn!(
						error = %err,
						query = %search.query,
						language = search.language.map(|language| language.as_str()),
						"Search branch failed. Treating it as empty."
					);

					SearchPage::default()
				},
			}
		}))
		.await;
		let next_page_token = pages.first().and_then(|page| page.next_page_token.clone());
		let mut candidates = merge_pages(pages);

		candidates.truncate(self.cfg.discovery.candidate_cap as usize);

		tracing::debug!(
			branch_count = branches.len(),
			candidate_count = candidates.len(),
			"Search branches merged."
		);

		if candidates.is_empty() {
			return Ok(Aggregated { candidates, next_page_token });
		}

		self.enrich(&mut candidates).await?;

		Ok(Aggregated { candidates, next_page_token })
	}

	/// Statistics failure is terminal for the request; channel lookup failure is not.
	async fn enrich(&self, candidates: &mut [VideoCandidate]) -> Result<()> {
		let catalog_cfg = &self.cfg.providers.catalog;
		let ids: Vec<String> = candidates.iter().map(|video| video.id.clone()).collect();
		let stats = self
			.providers
			.catalog
			.statistics(catalog_cfg, &ids)
			.await
			.map_err(|err| Error::Upstream {
				message: format!("Failed to fetch statistics: {err}"),
			})?;
		let stats: HashMap<String, _> =
			stats.into_iter().map(|stat| (stat.id.clone(), stat)).collect();

		for video in candidates.iter_mut() {
			let Some(stat) = stats.get(&video.id) else {
				continue;
			};

			video.views = stat.views;
			video.likes = stat.likes;
			video.comments = stat.comments;
			video.duration_code = stat.duration_code.clone();

			fill_snippet_gaps(video, &stat.snippet);
		}

		let mut seen = HashSet::new();
		let channel_ids: Vec<String> = candidates
			.iter()
			.map(|video| video.channel_id.clone())
			.filter(|id| !id.is_empty() && seen.insert(id.clone()))
			.collect();

		if channel_ids.is_empty() {
			return Ok(());
		}

		match self.providers.catalog.channels(catalog_cfg, &channel_ids).await {
			Ok(channels) => {
				let channels: HashMap<&str, _> =
					channels.iter().map(|channel| (channel.id.as_str(), channel)).collect();

				for video in candidates.iter_mut() {
					if let Some(channel) = channels.get(video.channel_id.as_str()) {
						video.channel_country = channel.country.clone();
						video.subscriber_count = channel.subscriber_count;
					}
				}
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					channel_count = channel_ids.len(),
					"Channel lookup failed. Continuing without channel data."
				);
			},
		}

		Ok(())
	}
}

/// Flattens pages in branch order; the first sighting of a video id wins.
pub fn merge_pages(pages: Vec<SearchPage>) -> Vec<VideoCandidate> {
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for hit in pages.into_iter().flat_map(|page| page.hits) {
		if !seen.insert(hit.video_id.clone()) {
			continue;
		}

		out.push(VideoCandidate {
			id: hit.video_id,
			title: hit.snippet.title,
			channel_id: hit.snippet.channel_id,
			channel_title: hit.snippet.channel_title,
			thumbnail_url: hit.snippet.thumbnail_url,
			published_at: hit.snippet.published_at,
			..Default::default()
		});
	}

	out
}

fn fill_snippet_gaps(video: &mut VideoCandidate, snippet: &Snippet) {
	if video.title.is_empty() {
		video.title = snippet.title.clone();
	}
	if video.channel_id.is_empty() {
		video.channel_id = snippet.channel_id.clone();
	}
	if video.channel_title.is_empty() {
		video.channel_title = snippet.channel_title.clone();
	}
	if video.thumbnail_url.is_empty() {
		video.thumbnail_url = snippet.thumbnail_url.clone();
	}
	if video.published_at.is_none() {
		video.published_at = snippet.published_at;
	}
}
