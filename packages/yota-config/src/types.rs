use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub discovery: Discovery,
	#[serde(default)]
	pub scoring: Scoring,
	#[serde(default)]
	pub personalization: Personalization,
	#[serde(default)]
	pub feed: Feed,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub catalog: CatalogProviderConfig,
	pub planner: LlmProviderConfig,
	pub rerank: LlmProviderConfig,
}

/// YouTube Data API v3 access. The key travels as a query parameter, not a header.
#[derive(Debug, Deserialize)]
pub struct CatalogProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
	#[serde(default = "default_search_max_results")]
	pub search_max_results: u32,
}

/// An OpenAI-compatible chat completion endpoint.
#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	#[serde(default)]
	pub enabled: bool,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default)]
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Discovery {
	pub max_queries: u32,
	/// Hard ceiling of the statistics batch call.
	pub candidate_cap: u32,
	pub default_window_days: u32,
	pub default_region: String,
	/// Search term used by feed requests that carry neither a query nor a niche.
	pub default_niche: String,
}
impl Default for Discovery {
	fn default() -> Self {
		Self {
			max_queries: 5,
			candidate_cap: 50,
			default_window_days: 7,
			default_region: "US".to_string(),
			default_niche: "vlog".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Scoring {
	pub rising_small_max_subs: u64,
	pub wildcard_diversity_decay: f64,
}
impl Default for Scoring {
	fn default() -> Self {
		Self { rising_small_max_subs: 200_000, wildcard_diversity_decay: 0.6 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Personalization {
	pub theme_dislike_multiplier: f64,
	pub liked_theme_multiplier: f64,
	pub channel_strike_multiplier: f64,
	pub rerank_max_candidates: u32,
	pub rerank_base_weight: f64,
	pub rerank_ai_weight: f64,
}
impl Default for Personalization {
	fn default() -> Self {
		Self {
			theme_dislike_multiplier: 0.7,
			liked_theme_multiplier: 1.2,
			channel_strike_multiplier: 0.8,
			rerank_max_candidates: 20,
			rerank_base_weight: 0.8,
			rerank_ai_weight: 0.2,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Feed {
	pub page_size: u32,
}
impl Default for Feed {
	fn default() -> Self {
		Self { page_size: 20 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_search_max_results() -> u32 {
	25
}
