//! Plain keyword search ranked with the bounded 0..=100 trend score, plus the channels that
//! dominate the results and the videos that outperform them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use yota_domain::{
	Language, LanguageMode, Mode, ScoredVideo,
	outlier::{self, OutlierReport},
	scoring::{self, ScoringContext},
	trend::{self, ChannelTrend},
};

use crate::{
	Error, Result, YotaService,
	aggregate::AggregateParams,
	discover::{resolve_region, validate_window},
};

pub const DEFAULT_MAX_RESULTS: u32 = 20;
pub const TOP_CHANNELS: usize = 10;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchRequest {
	pub query: String,
	pub window_days: Option<u32>,
	pub region_code: Option<String>,
	pub language: Option<Language>,
	pub max_results: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub items: Vec<ScoredVideo>,
	pub channels: Vec<ChannelTrend>,
	/// Results whose views beat the result set's median by the outlier threshold.
	pub outliers: OutlierReport,
	pub meta: SearchMeta,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
	pub query: String,
	pub window_days: u32,
	pub region_code: String,
	pub count: usize,
}

impl YotaService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		self.search_at(req, OffsetDateTime::now_utc()).await
	}

	pub async fn search_at(
		&self,
		req: SearchRequest,
		now: OffsetDateTime,
	) -> Result<SearchResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query is required.".to_string() });
		}

		let window_days = req.window_days.unwrap_or(Mode::LegacySearch.default_window_days());

		validate_window(window_days)?;

		let region_code =
			resolve_region(req.region_code.as_deref(), &self.cfg.discovery.default_region)?;
		let max_results = req
			.max_results
			.unwrap_or(DEFAULT_MAX_RESULTS)
			.clamp(1, yota_config::MAX_BATCH_IDS);
		let queries = [query.to_string()];
		let aggregated = self
			.aggregate(AggregateParams {
				queries: &queries,
				window_days,
				region_code: &region_code,
				language_mode: req.language.map(LanguageMode::from).unwrap_or_default(),
				page_token: None,
				max_results,
				now,
			})
			.await?;
		let ctx = ScoringContext::new(&self.cfg.scoring, &region_code, now);
		let mut items = scoring::score_candidates(aggregated.candidates, Mode::LegacySearch, &ctx);

		items.truncate(max_results as usize);

		let mut channels = trend::trending_channels(&items);

		channels.truncate(TOP_CHANNELS);

		let outliers = outlier::analyze(&items);

		tracing::info!(
			query,
			count = items.len(),
			channel_count = channels.len(),
			outlier_count = outliers.outliers.len(),
			"Search ranked."
		);

		Ok(SearchResponse {
			meta: SearchMeta {
				query: query.to_string(),
				window_days,
				region_code,
				count: items.len(),
			},
			items,
			channels,
			outliers,
		})
	}
}
