use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use serde_json::Map;
use time::{Duration, OffsetDateTime, macros::datetime};

use yota_config::{
	CatalogProviderConfig, Config, Discovery, Feed, LlmProviderConfig, Personalization, Providers,
	Scoring, Service,
};
use yota_domain::{
	LanguageMode, Mode, SessionSignals,
	personalize::{RelevanceScore, RerankRequest},
	planner::{PlanSource, SearchPlan},
};
use yota_providers::catalog::{
	ChannelStatistics, SearchHit, SearchPage, SearchParams, Snippet, VideoStatistics,
};
use yota_service::{
	BoxFuture, DiscoveryRequest, Error, QueryPlanner, Reranker, Result, SearchRequest,
	VideoCatalog, YotaService,
};

const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

fn llm_provider(enabled: bool) -> LlmProviderConfig {
	LlmProviderConfig {
		enabled,
		api_base: "http://localhost".to_string(),
		api_key: "key".to_string(),
		path: "/chat".to_string(),
		model: "m".to_string(),
		temperature: 0.0,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

fn test_config(planner: bool, rerank: bool) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:8080".to_string(), log_level: "info".to_string() },
		providers: Providers {
			catalog: CatalogProviderConfig {
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				timeout_ms: 1_000,
				search_max_results: 25,
			},
			planner: llm_provider(planner),
			rerank: llm_provider(rerank),
		},
		discovery: Discovery::default(),
		scoring: Scoring::default(),
		personalization: Personalization::default(),
		feed: Feed { page_size: 3 },
	}
}

/// Video fixture: id, channel, views, hours since publish.
type Fixture = (&'static str, &'static str, u64, i64);

struct FakeCatalog {
	/// Hits per (page key, language) branch; unknown branches return nothing. The page key is the
	/// query, suffixed with `#token` when a page token is sent.
	branches: Vec<(&'static str, &'static str, Vec<Fixture>)>,
	/// Next-page token per page key; keys not listed get `next-{query}-{language}`.
	next_tokens: Vec<(&'static str, Option<&'static str>)>,
	failing_language: Option<&'static str>,
	fail_statistics: bool,
	fail_channels: bool,
	searches: Mutex<Vec<SearchParams>>,
}
impl FakeCatalog {
	fn new(branches: Vec<(&'static str, &'static str, Vec<Fixture>)>) -> Self {
		Self {
			branches,
			next_tokens: Vec::new(),
			failing_language: None,
			fail_statistics: false,
			fail_channels: false,
			searches: Mutex::new(Vec::new()),
		}
	}

	fn fixtures(&self) -> impl Iterator<Item = &Fixture> {
		self.branches.iter().flat_map(|(_, _, fixtures)| fixtures.iter())
	}

	fn snippet(&self, id: &str, title_prefix: &str) -> Snippet {
		let (_, channel, _, hours) =
			self.fixtures().find(|fixture| fixture.0 == id).copied().unwrap_or(("", "", 0, 1));

		Snippet {
			title: format!("{title_prefix} {id}"),
			channel_id: channel.to_string(),
			channel_title: format!("{channel} title"),
			published_at: Some(NOW - Duration::hours(hours)),
			thumbnail_url: String::new(),
		}
	}
}
impl VideoCatalog for FakeCatalog {
	fn search<'a>(
		&'a self,
		_cfg: &'a CatalogProviderConfig,
		params: &'a SearchParams,
	) -> BoxFuture<'a, Result<SearchPage>> {
		self.searches.lock().expect("Lock poisoned.").push(params.clone());

		let language = params.language.map(|language| language.as_str()).unwrap_or("");
		let page_key = match &params.page_token {
			Some(token) => format!("{}#{token}", params.query),
			None => params.query.clone(),
		};
		let result = if self.failing_language == Some(language) {
			Err(Error::Provider { message: "boom".to_string() })
		} else {
			let hits = self
				.branches
				.iter()
				.filter(|(key, lang, _)| *key == page_key && *lang == language)
				.flat_map(|(_, lang, fixtures)| {
					fixtures.iter().map(move |(id, ..)| SearchHit {
						video_id: id.to_string(),
						snippet: self.snippet(id, lang),
					})
				})
				.collect();
			let next_page_token =
				match self.next_tokens.iter().find(|(key, _)| *key == page_key) {
					Some((_, token)) => token.map(str::to_string),
					None => Some(format!("next-{}-{language}", params.query)),
				};

			Ok(SearchPage { hits, next_page_token })
		};

		Box::pin(async move { result })
	}

	fn statistics<'a>(
		&'a self,
		_cfg: &'a CatalogProviderConfig,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<VideoStatistics>>> {
		let result = if self.fail_statistics {
			Err(Error::Provider { message: "quota".to_string() })
		} else {
			Ok(ids
				.iter()
				.filter_map(|id| {
					let (_, _, views, _) = self.fixtures().find(|fixture| fixture.0 == id)?;

					Some(VideoStatistics {
						id: id.clone(),
						views: *views,
						likes: 0,
						comments: 0,
						duration_code: "PT1M".to_string(),
						snippet: self.snippet(id, "stats"),
					})
				})
				.collect())
		};

		Box::pin(async move { result })
	}

	fn channels<'a>(
		&'a self,
		_cfg: &'a CatalogProviderConfig,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChannelStatistics>>> {
		let result = if self.fail_channels {
			Err(Error::Provider { message: "channels down".to_string() })
		} else {
			Ok(ids
				.iter()
				.map(|id| ChannelStatistics {
					id: id.clone(),
					country: Some("US".to_string()),
					subscriber_count: 10_000,
				})
				.collect())
		};

		Box::pin(async move { result })
	}
}

struct FailingPlanner {
	calls: Arc<AtomicUsize>,
}
impl QueryPlanner for FailingPlanner {
	fn plan<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
		_user_country: &'a str,
	) -> BoxFuture<'a, Result<SearchPlan>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move { Err(Error::Provider { message: "not JSON".to_string() }) })
	}
}

struct FixedPlanner;
impl QueryPlanner for FixedPlanner {
	fn plan<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
		_user_country: &'a str,
	) -> BoxFuture<'a, Result<SearchPlan>> {
		Box::pin(async move {
			Ok(SearchPlan {
				queries: vec!["cats".to_string(), " cats ".to_string(), "kittens".to_string()],
				suggested_window_days: 7,
				suggested_mode: Mode::WeekMovers,
				must_include: Vec::new(),
				language_hint: None,
				intent_summary: String::new(),
				source: PlanSource::Planner,
			})
		})
	}
}

struct ScriptedReranker {
	scores: Result<Vec<RelevanceScore>, String>,
	seen: Mutex<Option<RerankRequest>>,
}
impl Reranker for ScriptedReranker {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		request: &'a RerankRequest,
	) -> BoxFuture<'a, Result<Vec<RelevanceScore>>> {
		*self.seen.lock().expect("Lock poisoned.") = Some(request.clone());

		let result =
			self.scores.clone().map_err(|message| Error::Provider { message });

		Box::pin(async move { result })
	}
}

fn service(
	cfg: Config,
	catalog: Arc<FakeCatalog>,
	planner: Arc<dyn QueryPlanner>,
	reranker: Arc<dyn Reranker>,
) -> YotaService {
	YotaService::with_providers(cfg, yota_service::Providers::new(catalog, planner, reranker))
}

fn empty_service(cfg: Config, planner: Arc<dyn QueryPlanner>) -> YotaService {
	service(cfg, Arc::new(FakeCatalog::new(Vec::new())), planner, no_rerank())
}

fn no_rerank() -> Arc<ScriptedReranker> {
	Arc::new(ScriptedReranker { scores: Ok(Vec::new()), seen: Mutex::new(None) })
}

fn ids(items: &[yota_domain::ScoredVideo]) -> Vec<&str> {
	items.iter().map(|item| item.video.id.as_str()).collect()
}

fn vlog_request() -> DiscoveryRequest {
	DiscoveryRequest { niche: Some("vlog".to_string()), ..Default::default() }
}

fn mixed_catalog() -> FakeCatalog {
	FakeCatalog::new(vec![
		("vlog", "en", vec![("a", "c1", 9_000, 10), ("b", "c2", 5_000, 10)]),
		("vlog", "es", vec![("b", "c2", 5_000, 10), ("c", "c3", 1_000, 10)]),
	])
}

fn failing_planner() -> (Arc<FailingPlanner>, Arc<AtomicUsize>) {
	let calls = Arc::new(AtomicUsize::new(0));

	(Arc::new(FailingPlanner { calls: calls.clone() }), calls)
}

#[tokio::test]
async fn mixed_language_branches_are_deduplicated_first_sighting_wins() {
	let (planner, _) = failing_planner();
	let svc = service(test_config(false, false), Arc::new(mixed_catalog()), planner, no_rerank());
	let res = svc
		.discover_at(
			DiscoveryRequest {
				niche: Some("vlog".to_string()),
				mode: Some(Mode::WeekMovers),
				language_mode: Some(LanguageMode::Mixed),
				..Default::default()
			},
			NOW,
		)
		.await
		.expect("Discovery failed.");

	assert_eq!(ids(&res.items), vec!["a", "b", "c"]);

	let b = res.items.iter().find(|item| item.video.id == "b").expect("Missing b.");

	assert_eq!(b.video.title, "en b");
	assert_eq!(res.next_page_token.as_deref(), Some("next-vlog-en"));
	assert_eq!(res.meta.count, 3);
	assert_eq!(res.meta.plan_source, PlanSource::Niche);
	assert_eq!(res.session.shown_ids.len(), 3);
}

#[tokio::test]
async fn failing_branch_degrades_to_empty() {
	let (planner, _) = failing_planner();
	let mut catalog = mixed_catalog();

	catalog.failing_language = Some("es");

	let svc = service(test_config(false, false), Arc::new(catalog), planner, no_rerank());
	let res = svc
		.discover_at(
			DiscoveryRequest {
				niche: Some("vlog".to_string()),
				language_mode: Some(LanguageMode::Mixed),
				..Default::default()
			},
			NOW,
		)
		.await
		.expect("Discovery failed.");

	assert_eq!(ids(&res.items), vec!["a", "b"]);
}

#[tokio::test]
async fn statistics_failure_is_terminal() {
	let (planner, _) = failing_planner();
	let mut catalog = mixed_catalog();

	catalog.fail_statistics = true;

	let svc = service(test_config(false, false), Arc::new(catalog), planner, no_rerank());
	let err = svc
		.discover_at(vlog_request(), NOW)
		.await
		.expect_err("Expected an upstream failure.");

	assert!(matches!(err, Error::Upstream { .. }));
}

#[tokio::test]
async fn channel_failure_keeps_candidates_with_unknown_channel_data() {
	let (planner, _) = failing_planner();
	let mut catalog = mixed_catalog();

	catalog.fail_channels = true;

	let svc = service(test_config(false, false), Arc::new(catalog), planner, no_rerank());
	let res = svc
		.discover_at(vlog_request(), NOW)
		.await
		.expect("Discovery failed.");

	assert_eq!(res.items.len(), 2);
	assert!(res.items.iter().all(|item| item.video.subscriber_count == 0));
	assert!(res.items.iter().all(|item| item.video.channel_country.is_none()));
}

#[tokio::test]
async fn empty_candidate_set_is_not_an_error() {
	let (planner, _) = failing_planner();
	let svc = empty_service(test_config(false, false), planner);
	let res = svc
		.discover_at(
			DiscoveryRequest {
				query: Some("nothing matches this".to_string()),
				region_code: Some("mx".to_string()),
				..Default::default()
			},
			NOW,
		)
		.await
		.expect("Discovery failed.");

	assert!(res.items.is_empty());
	assert_eq!(res.meta.region_code, "MX");
	assert_eq!(res.meta.plan_source, PlanSource::Fallback);
}

#[tokio::test]
async fn planner_failure_falls_back_to_keyword_plan() {
	let (planner, calls) = failing_planner();
	let svc = empty_service(test_config(true, false), planner);
	let plan = svc.plan_query("viral baby vlog today", "US").await;

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(plan.source, PlanSource::Fallback);
	assert_eq!(plan.suggested_window_days, 1);
	assert_eq!(plan.suggested_mode, Mode::Trending);
	assert_eq!(plan.queries[0], "baby vlog");
}

#[tokio::test]
async fn disabled_planner_is_never_called() {
	let (planner, calls) = failing_planner();
	let svc = empty_service(test_config(false, false), planner);

	svc.plan_query("cooking", "US").await;

	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn planner_output_is_validated_and_deduplicated() {
	let svc = service(
		test_config(true, false),
		Arc::new(FakeCatalog::new(Vec::new())),
		Arc::new(FixedPlanner),
		no_rerank(),
	);
	let plan = svc.plan_query("cats", "US").await;

	assert_eq!(plan.queries, vec!["cats", "kittens"]);
	assert_eq!(plan.source, PlanSource::Planner);
	assert!(!plan.intent_summary.is_empty());
}

#[tokio::test]
async fn malformed_rerank_output_leaves_scores_unchanged() {
	let (planner, _) = failing_planner();
	let req = || DiscoveryRequest {
		niche: Some("vlog".to_string()),
		language_mode: Some(LanguageMode::Mixed),
		ai_rerank: true,
		..Default::default()
	};
	let base_svc =
		service(test_config(false, false), Arc::new(mixed_catalog()), planner.clone(), no_rerank());
	let base = base_svc
		.discover_at(req(), NOW)
		.await
		.expect("Discovery failed.");
	let reranker = Arc::new(ScriptedReranker {
		scores: Err("Model output is not valid JSON.".to_string()),
		seen: Mutex::new(None),
	});
	let failed_svc =
		service(test_config(false, true), Arc::new(mixed_catalog()), planner, reranker.clone());
	let failed = failed_svc
		.discover_at(req(), NOW)
		.await
		.expect("Discovery must fail open.");

	assert!(reranker.seen.lock().expect("Lock poisoned.").is_some());
	assert!(!failed.meta.ai_blended);
	assert_eq!(ids(&failed.items), ids(&base.items));

	for (left, right) in failed.items.iter().zip(&base.items) {
		assert_eq!(left.score, right.score);
	}
}

#[tokio::test]
async fn rerank_scores_blend_and_reorder() {
	let (planner, _) = failing_planner();
	let reranker = Arc::new(ScriptedReranker {
		scores: Ok(vec![
			RelevanceScore { video_id: "a".to_string(), ai_relevance_score: 0.0 },
			RelevanceScore { video_id: "c".to_string(), ai_relevance_score: 1.0 },
		]),
		seen: Mutex::new(None),
	});
	let mut signals = SessionSignals::default();

	signals.blocked_channel_ids.insert("c2".to_string());

	let svc =
		service(test_config(false, true), Arc::new(mixed_catalog()), planner, reranker.clone());
	let res = svc
		.discover_at(
			DiscoveryRequest {
				niche: Some("vlog".to_string()),
				mode: Some(Mode::WeekMovers),
				language_mode: Some(LanguageMode::Mixed),
				signals,
				ai_rerank: true,
				..Default::default()
			},
			NOW,
		)
		.await
		.expect("Discovery failed.");
	let sent = reranker.seen.lock().expect("Lock poisoned.").clone().expect("Re-ranker unused.");

	assert!(res.meta.ai_blended);
	assert_eq!(sent.blocked_channel_ids, vec!["c2"]);
	assert!(sent.videos.iter().all(|video| video.video_id != "b"));
	assert!(res.items.iter().all(|item| item.score_breakdown.ai_blended));

	let a = res.items.iter().find(|item| item.video.id == "a").expect("Missing a.");

	assert!((a.score - a.score_breakdown.base_score * 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn seen_ids_are_not_repeated_across_pages() {
	let (planner, _) = failing_planner();
	let catalog = FakeCatalog::new(vec![(
		"vlog",
		"en",
		vec![
			("v1", "c1", 500, 5),
			("v2", "c2", 400, 5),
			("v3", "c3", 300, 5),
			("v4", "c4", 200, 5),
			("v5", "c5", 100, 5),
		],
	)]);
	let svc = service(test_config(false, false), Arc::new(catalog), planner, no_rerank());
	let first = svc
		.discover_at(vlog_request(), NOW)
		.await
		.expect("Discovery failed.");
	let second = svc
		.discover_at(
			DiscoveryRequest {
				niche: Some("vlog".to_string()),
				session: first.session.clone(),
				..Default::default()
			},
			NOW,
		)
		.await
		.expect("Discovery failed.");

	assert_eq!(first.items.len(), 3);
	assert_eq!(second.items.len(), 2);
	assert!(second.items.iter().all(|item| !first.session.shown_ids.contains(&item.video.id)));
}

#[tokio::test]
async fn following_continuation_tokens_shows_every_candidate() {
	let (planner, _) = failing_planner();
	let mut catalog = FakeCatalog::new(vec![
		(
			"vlog",
			"en",
			vec![
				("v1", "c1", 500, 5),
				("v2", "c2", 400, 5),
				("v3", "c3", 300, 5),
				("v4", "c4", 200, 5),
				("v5", "c5", 100, 5),
			],
		),
		("vlog#p2", "en", vec![("v6", "c6", 50, 5)]),
	]);

	catalog.next_tokens = vec![("vlog", Some("p2")), ("vlog#p2", None)];

	let svc = service(test_config(false, false), Arc::new(catalog), planner, no_rerank());
	let mut req = vlog_request();
	let mut shown = Vec::new();
	let mut pages = 0;

	loop {
		let res = svc.discover_at(req.clone(), NOW).await.expect("Discovery failed.");

		pages += 1;

		assert!(res.items.len() <= 3);

		shown.extend(res.items.iter().map(|item| item.video.id.clone()));

		if !res.has_more || pages == 10 {
			break;
		}

		req.page_token = res.next_page_token;
		req.session = res.session;
	}

	shown.sort();

	assert_eq!(shown, vec!["v1", "v2", "v3", "v4", "v5", "v6"]);
	assert_eq!(pages, 3);
}

#[tokio::test]
async fn page_token_goes_to_the_primary_branch_only() {
	let (planner, _) = failing_planner();
	let catalog = Arc::new(mixed_catalog());
	let svc = service(test_config(false, false), catalog.clone(), planner, no_rerank());

	svc.discover_at(
		DiscoveryRequest {
			niche: Some("vlog".to_string()),
			language_mode: Some(LanguageMode::Mixed),
			page_token: Some("tok".to_string()),
			..Default::default()
		},
		NOW,
	)
	.await
	.expect("Discovery failed.");

	let searches = catalog.searches.lock().expect("Lock poisoned.");
	let with_token: Vec<_> =
		searches.iter().filter(|search| search.page_token.is_some()).collect();

	assert_eq!(searches.len(), 2);
	assert_eq!(with_token.len(), 1);
	assert_eq!(with_token[0].language.map(|language| language.as_str()), Some("en"));
	assert!(searches.iter().all(|search| search.published_after == NOW - Duration::days(7)));
}

#[tokio::test]
async fn requested_mode_sets_the_window_on_the_query_path() {
	let (planner, _) = failing_planner();
	let catalog = Arc::new(FakeCatalog::new(Vec::new()));
	let svc = service(test_config(false, false), catalog.clone(), planner, no_rerank());
	let res = svc
		.discover_at(
			DiscoveryRequest {
				query: Some("cooking".to_string()),
				mode: Some(Mode::Trending),
				..Default::default()
			},
			NOW,
		)
		.await
		.expect("Discovery failed.");

	assert_eq!(res.meta.mode, Mode::Trending);
	assert_eq!(res.meta.window_days, 1);

	let searches = catalog.searches.lock().expect("Lock poisoned.");

	assert!(!searches.is_empty());
	assert!(searches.iter().all(|search| search.published_after == NOW - Duration::days(1)));
}

#[tokio::test]
async fn explicit_window_wins_over_requested_mode() {
	let (planner, _) = failing_planner();
	let svc = empty_service(test_config(false, false), planner);
	let res = svc
		.discover_at(
			DiscoveryRequest {
				query: Some("cooking".to_string()),
				mode: Some(Mode::Trending),
				window_days: Some(14),
				..Default::default()
			},
			NOW,
		)
		.await
		.expect("Discovery failed.");

	assert_eq!(res.meta.window_days, 14);
}

#[tokio::test]
async fn search_requires_a_query() {
	let (planner, _) = failing_planner();
	let svc = empty_service(test_config(false, false), planner);
	let err = svc
		.search_at(SearchRequest { query: "   ".to_string(), ..Default::default() }, NOW)
		.await
		.expect_err("Expected an invalid request.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn invalid_window_is_rejected() {
	let (planner, _) = failing_planner();
	let svc = empty_service(test_config(false, false), planner);
	let err = svc
		.discover_at(DiscoveryRequest { window_days: Some(90), ..Default::default() }, NOW)
		.await
		.expect_err("Expected an invalid request.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn legacy_search_ranks_and_aggregates_channels() {
	let (planner, _) = failing_planner();
	let catalog = FakeCatalog::new(vec![(
		"cooking",
		"en",
		vec![("x1", "c1", 100_000, 48), ("x2", "c1", 10, 48), ("x3", "c2", 50_000, 48)],
	)]);
	let svc = service(test_config(false, false), Arc::new(catalog), planner, no_rerank());
	let res = svc
		.search_at(SearchRequest { query: "cooking".to_string(), ..Default::default() }, NOW)
		.await
		.expect("Search failed.");

	assert_eq!(res.meta.window_days, 30);
	assert!(res.items.iter().all(|item| item.score_breakdown.mode == Mode::LegacySearch));
	assert!(res.items.iter().all(|item| (0.0..=100.0).contains(&item.score)));
	assert_eq!(res.channels.len(), 2);
	assert_eq!(res.channels[0].channel_id, "c2");
	assert_eq!(res.outliers.baseline.median_views, 50_000);
	assert_eq!(res.outliers.outliers.len(), 1);
	assert_eq!(res.outliers.outliers[0].video_id, "x1");
	assert_eq!(res.outliers.outliers[0].outlier_ratio, 2.0);
}
