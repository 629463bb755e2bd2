//! Page assembly: drop already-shown ids, cut a page, optionally shuffle it with a seeded
//! generator, and record what was shown.
//!
//! A catalog batch can hold more unshown candidates than one page. Until the batch is drained
//! the continuation token replays the batch's own token, so the shown-id filter walks through
//! it before the catalog's next page is requested.

use serde::{Deserialize, Serialize};

use crate::{session::FeedSessionState, video::ScoredVideo};

const LCG_MULTIPLIER: u64 = 9_301;
const LCG_INCREMENT: u64 = 49_297;
const LCG_MODULUS: u64 = 233_280;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
	pub items: Vec<ScoredVideo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_page_token: Option<String>,
	/// False only when both this batch and the catalog are exhausted.
	pub has_more: bool,
}

/// Linear congruential generator used for reproducible in-page shuffles.
#[derive(Clone, Copy, Debug)]
pub struct Lcg {
	state: u64,
}
impl Lcg {
	pub fn new(seed: u64) -> Self {
		Self { state: seed % LCG_MODULUS }
	}

	/// Advances the generator and returns the raw state in `[0, LCG_MODULUS)`.
	pub fn next_state(&mut self) -> u64 {
		self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;

		self.state
	}
}

/// Fisher-Yates from the back, drawing `j = floor(r * (i + 1))` with `r = state / modulus`.
pub fn lcg_shuffle<T>(items: &mut [T], seed: u64) {
	let mut rng = Lcg::new(seed);

	for i in (1..items.len()).rev() {
		let state = rng.next_state();
		let j = (state * (i as u64 + 1) / LCG_MODULUS) as usize;

		items.swap(i, j);
	}
}

/// Cuts the next page out of ranked `candidates` fetched with `page_token`.
///
/// Ids already in `session.shown_ids` are skipped, at most `page_size` items are kept, a
/// `seed` shuffles only within the page, and the page's ids are added to the session. The
/// catalog's `next_page_token` is handed out only once no unshown candidate is left behind;
/// otherwise `page_token` is returned so the same batch is fetched again.
pub fn paginate(
	candidates: Vec<ScoredVideo>,
	seed: Option<u64>,
	page_token: Option<String>,
	next_page_token: Option<String>,
	session: &mut FeedSessionState,
	page_size: usize,
) -> Page {
	let mut items: Vec<ScoredVideo> = candidates
		.into_iter()
		.filter(|item| !session.shown_ids.contains(&item.video.id))
		.collect();
	let left_behind = items.len() > page_size;

	items.truncate(page_size);

	if let Some(seed) = seed {
		lcg_shuffle(&mut items, seed);
	}

	session.shown_ids.extend(items.iter().map(|item| item.video.id.clone()));

	if left_behind {
		return Page { items, next_page_token: page_token, has_more: true };
	}

	let has_more = next_page_token.is_some();

	Page { items, next_page_token, has_more }
}
