use yota_domain::{
	ScoredVideo, SessionSignals,
	personalize::{self, build_rerank_request},
};

use crate::YotaService;

impl YotaService {
	/// Blends external relevance into `ranked`, which must already be sorted. Fails open: on
	/// any re-ranker error the scores are left untouched and `false` is returned.
	pub async fn blend_ai_relevance(
		&self,
		ranked: &mut [ScoredVideo],
		signals: &SessionSignals,
		intent_summary: &str,
		user_country: &str,
	) -> bool {
		if ranked.is_empty() {
			return false;
		}

		let weights = &self.cfg.personalization;
		let request = build_rerank_request(
			ranked,
			weights.rerank_max_candidates as usize,
			signals,
			intent_summary,
			user_country,
		);

		match self.providers.reranker.rerank(&self.cfg.providers.rerank, &request).await {
			Ok(scores) => {
				tracing::debug!(
					scored = scores.len(),
					sent = request.videos.len(),
					"Re-ranker scores received."
				);
				personalize::blend_relevance(
					ranked,
					&scores,
					weights.rerank_base_weight,
					weights.rerank_ai_weight,
				);

				true
			},
			Err(err) => {
				tracing::warn!(error = %err, "Re-ranker failed. Keeping base scores.");

				false
			},
		}
	}
}
