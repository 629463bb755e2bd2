use yota_domain::planner::{self, SearchPlan};

use crate::YotaService;

impl YotaService {
	/// Plans a free-text query. The external planner is consulted only when enabled; any
	/// failure or out-of-bounds plan falls back to the keyword planner. Never fails.
	pub async fn plan_query(&self, query: &str, user_country: &str) -> SearchPlan {
		let max_queries = self.cfg.discovery.max_queries as usize;
		let cfg = &self.cfg.providers.planner;

		if cfg.enabled {
			match self.providers.planner.plan(cfg, query, user_country).await {
				Ok(plan) => match planner::validate_plan(plan, max_queries) {
					Some(plan) => {
						tracing::debug!(query_count = plan.queries.len(), "Planner plan accepted.");

						return plan;
					},
					None => tracing::warn!("Planner plan is out of bounds. Using fallback plan."),
				},
				Err(err) => {
					tracing::warn!(error = %err, "Planner request failed. Using fallback plan.");
				},
			}
		}

		planner::fallback_plan(query, max_queries)
	}
}
