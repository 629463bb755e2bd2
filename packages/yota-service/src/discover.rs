use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use yota_domain::{
	FeedSessionState, LanguageMode, Mode, ScoredVideo, SessionSignals,
	paginate,
	personalize::{self, PersonalizationWeights},
	planner::{MAX_WINDOW_DAYS, PlanSource, SearchPlan},
	scoring::{self, ScoringContext},
};

use crate::{Error, Result, YotaService, aggregate::AggregateParams};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryRequest {
	pub mode: Option<Mode>,
	pub niche: Option<String>,
	pub query: Option<String>,
	pub window_days: Option<u32>,
	pub region_code: Option<String>,
	pub language_mode: Option<LanguageMode>,
	pub page_token: Option<String>,
	pub seed: Option<u64>,
	pub session: FeedSessionState,
	pub signals: SessionSignals,
	/// Ask for external relevance blending; honored only when the re-ranker is enabled.
	pub ai_rerank: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
	pub items: Vec<ScoredVideo>,
	/// Token to send with the next request. While the current batch still holds unshown
	/// candidates this is the token the batch was fetched with, possibly none.
	pub next_page_token: Option<String>,
	pub has_more: bool,
	pub meta: DiscoveryMeta,
	pub session: FeedSessionState,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryMeta {
	pub mode: Mode,
	pub window_days: u32,
	pub region_code: String,
	pub language_mode: LanguageMode,
	pub count: usize,
	pub queries: Vec<String>,
	pub intent_summary: String,
	pub plan_source: PlanSource,
	pub ai_blended: bool,
}

impl YotaService {
	pub async fn discover(&self, req: DiscoveryRequest) -> Result<DiscoveryResponse> {
		self.discover_at(req, OffsetDateTime::now_utc()).await
	}

	/// Runs the feed pipeline: plan, aggregate, score, personalize, optionally blend, page.
	pub async fn discover_at(
		&self,
		req: DiscoveryRequest,
		now: OffsetDateTime,
	) -> Result<DiscoveryResponse> {
		if let Some(window_days) = req.window_days {
			validate_window(window_days)?;
		}

		let region_code =
			resolve_region(req.region_code.as_deref(), &self.cfg.discovery.default_region)?;
		let query = req.query.as_deref().map(str::trim).filter(|query| !query.is_empty());
		let plan = match query {
			Some(query) => self.plan_query(query, &region_code).await,
			None => self.niche_plan(&req),
		};
		let mode = req.mode.unwrap_or(plan.suggested_mode);
		let window_days = req
			.window_days
			.or_else(|| req.mode.map(|mode| self.default_window(mode)))
			.unwrap_or(plan.suggested_window_days);
		let language_mode = req
			.language_mode
			.or(plan.language_hint.map(LanguageMode::from))
			.unwrap_or_default();

		tracing::info!(
			%mode,
			window_days,
			region = %region_code,
			query_count = plan.queries.len(),
			source = ?plan.source,
			"Discovery request planned."
		);

		let aggregated = self
			.aggregate(AggregateParams {
				queries: &plan.queries,
				window_days,
				region_code: &region_code,
				language_mode,
				page_token: req.page_token.as_deref(),
				max_results: self.cfg.providers.catalog.search_max_results,
				now,
			})
			.await?;
		let ctx = ScoringContext::new(&self.cfg.scoring, &region_code, now);
		let scored = scoring::score_candidates(aggregated.candidates, mode, &ctx);
		let weights = PersonalizationWeights::from(&self.cfg.personalization);
		let mut ranked = personalize::apply_session_signals(scored, &req.signals, &weights);

		scoring::rank_by_score(&mut ranked);

		let ai_blended = if req.ai_rerank && self.cfg.providers.rerank.enabled {
			self.blend_ai_relevance(&mut ranked, &req.signals, &plan.intent_summary, &region_code)
				.await
		} else {
			false
		};

		if ai_blended {
			scoring::rank_by_score(&mut ranked);
		}

		let mut session = req.session;
		let page = paginate::paginate(
			ranked,
			req.seed,
			req.page_token,
			aggregated.next_page_token,
			&mut session,
			self.cfg.feed.page_size as usize,
		);

		tracing::debug!(count = page.items.len(), "Discovery page assembled.");

		Ok(DiscoveryResponse {
			meta: DiscoveryMeta {
				mode,
				window_days,
				region_code,
				language_mode,
				count: page.items.len(),
				queries: plan.queries,
				intent_summary: plan.intent_summary,
				plan_source: plan.source,
				ai_blended,
			},
			items: page.items,
			next_page_token: page.next_page_token,
			has_more: page.has_more,
			session,
		})
	}

	fn niche_plan(&self, req: &DiscoveryRequest) -> SearchPlan {
		let niche = req
			.niche
			.as_deref()
			.map(str::trim)
			.filter(|niche| !niche.is_empty())
			.unwrap_or(self.cfg.discovery.default_niche.as_str());
		let mode = req.mode.or(req.window_days.map(Mode::for_window)).unwrap_or_default();
		let window_days = req.window_days.unwrap_or_else(|| self.default_window(mode));

		SearchPlan::for_niche(niche, window_days, mode)
	}

	/// Window used when the request names a mode but no window. Shared by the niche and query
	/// paths so both search the same span for the same mode.
	fn default_window(&self, mode: Mode) -> u32 {
		match mode {
			Mode::Trending | Mode::LegacySearch => mode.default_window_days(),
			_ => self.cfg.discovery.default_window_days,
		}
	}
}

pub(crate) fn validate_window(window_days: u32) -> Result<()> {
	if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
		return Err(Error::InvalidRequest {
			message: format!("windowDays must be between 1 and {MAX_WINDOW_DAYS}."),
		});
	}

	Ok(())
}

pub(crate) fn resolve_region(requested: Option<&str>, default_region: &str) -> Result<String> {
	let region =
		requested.map(str::trim).filter(|region| !region.is_empty()).unwrap_or(default_region);

	if region.len() != 2 || !region.chars().all(|ch| ch.is_ascii_alphabetic()) {
		return Err(Error::InvalidRequest {
			message: "regionCode must be a two-letter country code.".to_string(),
		});
	}

	Ok(region.to_ascii_uppercase())
}
