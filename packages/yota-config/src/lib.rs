mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CatalogProviderConfig, Config, Discovery, Feed, LlmProviderConfig, Personalization,
	Providers, Scoring, Service,
};

use std::{fs, path::Path};

/// Upper bound of a single statistics/channels batch lookup.
pub const MAX_BATCH_IDS: u32 = 50;
/// Upper bound of the searches issued for one request.
pub const MAX_SEARCH_QUERIES: u32 = 5;
/// Upper bound of the candidates sent to the re-ranker.
pub const MAX_RERANK_CANDIDATES: u32 = 20;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config =
		toml::from_str(&raw).map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty."));
	}
	if cfg.providers.catalog.api_key.trim().is_empty() {
		return Err(Error::invalid("providers.catalog.api_key", "must be non-empty."));
	}
	if cfg.providers.catalog.api_base.trim().is_empty() {
		return Err(Error::invalid("providers.catalog.api_base", "must be non-empty."));
	}
	if !(1..=MAX_BATCH_IDS).contains(&cfg.providers.catalog.search_max_results) {
		return Err(Error::invalid(
			"providers.catalog.search_max_results",
			format!("must be in the range 1-{MAX_BATCH_IDS}."),
		));
	}

	for (key, provider) in [
		("providers.planner.api_key", &cfg.providers.planner),
		("providers.rerank.api_key", &cfg.providers.rerank),
	] {
		if provider.enabled && provider.api_key.trim().is_empty() {
			return Err(Error::invalid(key, "must be non-empty when the provider is enabled."));
		}
	}

	if !(1..=MAX_SEARCH_QUERIES).contains(&cfg.discovery.max_queries) {
		return Err(Error::invalid(
			"discovery.max_queries",
			format!("must be in the range 1-{MAX_SEARCH_QUERIES}."),
		));
	}
	if !(1..=MAX_BATCH_IDS).contains(&cfg.discovery.candidate_cap) {
		return Err(Error::invalid(
			"discovery.candidate_cap",
			format!("must be in the range 1-{MAX_BATCH_IDS}."),
		));
	}
	if cfg.discovery.default_window_days == 0 {
		return Err(Error::invalid("discovery.default_window_days", "must be greater than zero."));
	}
	if cfg.discovery.default_region.len() != 2 {
		return Err(Error::invalid(
			"discovery.default_region",
			"must be a two-letter region code.",
		));
	}
	if cfg.discovery.default_niche.trim().is_empty() {
		return Err(Error::invalid("discovery.default_niche", "must be non-empty."));
	}
	if cfg.scoring.rising_small_max_subs == 0 {
		return Err(Error::invalid("scoring.rising_small_max_subs", "must be greater than zero."));
	}

	let decay = cfg.scoring.wildcard_diversity_decay;

	if !decay.is_finite() || decay < 0.0 {
		return Err(Error::invalid(
			"scoring.wildcard_diversity_decay",
			"must be a finite number, zero or greater.",
		));
	}

	for (key, value) in [
		(
			"personalization.theme_dislike_multiplier",
			cfg.personalization.theme_dislike_multiplier,
		),
		("personalization.liked_theme_multiplier", cfg.personalization.liked_theme_multiplier),
		(
			"personalization.channel_strike_multiplier",
			cfg.personalization.channel_strike_multiplier,
		),
	] {
		if !value.is_finite() || value <= 0.0 {
			return Err(Error::invalid(key, "must be a finite number greater than zero."));
		}
	}
	for (key, value) in [
		("personalization.rerank_base_weight", cfg.personalization.rerank_base_weight),
		("personalization.rerank_ai_weight", cfg.personalization.rerank_ai_weight),
	] {
		if !value.is_finite() || !(0.0..=1.0).contains(&value) {
			return Err(Error::invalid(key, "must be in the range 0.0-1.0."));
		}
	}

	if !(1..=MAX_RERANK_CANDIDATES).contains(&cfg.personalization.rerank_max_candidates) {
		return Err(Error::invalid(
			"personalization.rerank_max_candidates",
			format!("must be in the range 1-{MAX_RERANK_CANDIDATES}."),
		));
	}
	if cfg.feed.page_size == 0 {
		return Err(Error::invalid("feed.page_size", "must be greater than zero."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.discovery.default_region = cfg.discovery.default_region.trim().to_uppercase();
	cfg.providers.catalog.api_base =
		cfg.providers.catalog.api_base.trim_end_matches('/').to_string();

	for provider in [&mut cfg.providers.planner, &mut cfg.providers.rerank] {
		if !provider.enabled {
			provider.api_key.clear();
		}

		provider.api_base = provider.api_base.trim_end_matches('/').to_string();
	}
}
