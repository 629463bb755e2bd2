pub mod aggregate;
pub mod discover;
pub mod plan;
pub mod rerank;
pub mod search;

mod error;

pub use discover::{DiscoveryMeta, DiscoveryRequest, DiscoveryResponse};
pub use error::{Error, Result};
pub use search::{SearchMeta, SearchRequest, SearchResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use yota_config::{CatalogProviderConfig, Config, LlmProviderConfig};
use yota_domain::{
	personalize::{RelevanceScore, RerankRequest},
	planner::SearchPlan,
};
use yota_providers::catalog::{self, ChannelStatistics, SearchPage, SearchParams, VideoStatistics};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VideoCatalog
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		params: &'a SearchParams,
	) -> BoxFuture<'a, Result<SearchPage>>;

	fn statistics<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<VideoStatistics>>>;

	fn channels<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChannelStatistics>>>;
}

pub trait QueryPlanner
where
	Self: Send + Sync,
{
	fn plan<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		user_country: &'a str,
	) -> BoxFuture<'a, Result<SearchPlan>>;
}

pub trait Reranker
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a RerankRequest,
	) -> BoxFuture<'a, Result<Vec<RelevanceScore>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub catalog: Arc<dyn VideoCatalog>,
	pub planner: Arc<dyn QueryPlanner>,
	pub reranker: Arc<dyn Reranker>,
}
impl Providers {
	pub fn new(
		catalog: Arc<dyn VideoCatalog>,
		planner: Arc<dyn QueryPlanner>,
		reranker: Arc<dyn Reranker>,
	) -> Self {
		Self { catalog, planner, reranker }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { catalog: provider.clone(), planner: provider.clone(), reranker: provider }
	}
}

pub struct YotaService {
	pub cfg: Config,
	pub providers: Providers,
}
impl YotaService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}

struct DefaultProviders;
impl VideoCatalog for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		params: &'a SearchParams,
	) -> BoxFuture<'a, Result<SearchPage>> {
		Box::pin(async move { Ok(catalog::search(cfg, params).await?) })
	}

	fn statistics<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<VideoStatistics>>> {
		Box::pin(async move { Ok(catalog::statistics(cfg, ids).await?) })
	}

	fn channels<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChannelStatistics>>> {
		Box::pin(async move { Ok(catalog::channels(cfg, ids).await?) })
	}
}
impl QueryPlanner for DefaultProviders {
	fn plan<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		user_country: &'a str,
	) -> BoxFuture<'a, Result<SearchPlan>> {
		Box::pin(async move { Ok(yota_providers::planner::plan(cfg, query, user_country).await?) })
	}
}
impl Reranker for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a RerankRequest,
	) -> BoxFuture<'a, Result<Vec<RelevanceScore>>> {
		Box::pin(async move { Ok(yota_providers::rerank::rerank(cfg, request).await?) })
	}
}
