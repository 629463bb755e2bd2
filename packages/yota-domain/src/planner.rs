//! Search plans and the deterministic keyword planner used when the external planner is off,
//! unreachable, or returns something unusable.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::mode::{Language, Mode};

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
pub const MAX_WINDOW_DAYS: u32 = 30;
/// Every plan, planner-made or not, stays within this many queries.
pub const MAX_PLAN_QUERIES: usize = 6;

const SEASONAL_SUFFIX: &str = "2024";
const MIN_SIGNIFICANT_CHARS: usize = 3;
const MUST_INCLUDE_WORDS: usize = 3;

const WINDOW_PATTERNS: &[(u32, &str)] = &[
	(1, r"(?i)\b(?:24\s*h(?:ours?|rs?)?|today|tonight|hoy|last\s+day|past\s+day)\b"),
	(7, r"(?i)\b(?:7\s*d(?:ays?)?|this\s+week|last\s+week|past\s+week|weekly|week|semana)\b"),
	(
		30,
		concat!(
			r"(?i)\b(?:30\s*d(?:ays?)?|this\s+month|last\s+month|past\s+month|",
			r"monthly|month|mes)\b",
		),
	),
];
const LANGUAGE_PATTERNS: &[(Language, &str)] = &[
	(Language::Es, r"(?i)\b(?:en\s+español|en\s+espanol|español|espanol|spanish|latino|latina)\b"),
	(Language::En, r"(?i)\b(?:in\s+english|english)\b"),
];
const MODE_PATTERNS: &[(Mode, &str)] = &[
	(Mode::Trending, r"(?i)\b(?:trending|viral|hot|blowing\s+up|tendencia)\b"),
	(
		Mode::RisingSmall,
		concat!(
			r"(?i)\b(?:small\s+creators?|small\s+channels?|rising|underrated|",
			r"hidden\s+gems?|up\s+and\s+coming)\b",
		),
	),
	(Mode::Wildcard, r"(?i)\b(?:wildcard|random|surprise\s+me)\b"),
];
const TOPIC_SYNONYMS: &[(&str, &[&str])] = &[
	("baby", &["newborn", "toddler"]),
	("couple", &["relationship", "boyfriend girlfriend"]),
	("family", &["parenting", "family day"]),
	("cooking", &["recipe", "kitchen"]),
	("travel", &["trip", "travel diary"]),
	("fitness", &["workout", "gym"]),
	("gaming", &["gameplay", "lets play"]),
	("makeup", &["beauty", "grwm"]),
	("music", &["cover", "song"]),
	("comida", &["receta", "cocina"]),
];

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanSource {
	Planner,
	#[default]
	Fallback,
	Niche,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPlan {
	pub queries: Vec<String>,
	pub suggested_window_days: u32,
	pub suggested_mode: Mode,
	#[serde(default)]
	pub must_include: Vec<String>,
	#[serde(default)]
	pub language_hint: Option<Language>,
	#[serde(default)]
	pub intent_summary: String,
	#[serde(default)]
	pub source: PlanSource,
}
impl SearchPlan {
	/// A single-query plan for a bare niche keyword; no planning is attempted.
	pub fn for_niche(niche: &str, window_days: u32, mode: Mode) -> Self {
		let niche = niche.trim().to_lowercase();

		Self {
			intent_summary: intent_summary(mode, &niche, window_days),
			must_include: must_include(&niche),
			queries: vec![niche],
			suggested_window_days: window_days,
			suggested_mode: mode,
			language_hint: None,
			source: PlanSource::Niche,
		}
	}
}

/// Deterministic keyword-pattern plan.
///
/// Window, language and mode hints are detected and stripped to obtain the clean query, which
/// is always query #1. Expansions come from the topic table and two fixed suffixes.
pub fn fallback_plan(raw_query: &str, max_queries: usize) -> SearchPlan {
	let mut stripped = raw_query.to_string();
	let mut window_days = None;
	let mut language_hint = None;
	let mut mode_hint = None;

	for (days, pattern) in WINDOW_PATTERNS {
		if strip_matches(&mut stripped, pattern) && window_days.is_none() {
			window_days = Some(*days);
		}
	}
	for (language, pattern) in LANGUAGE_PATTERNS {
		if strip_matches(&mut stripped, pattern) && language_hint.is_none() {
			language_hint = Some(*language);
		}
	}
	for (mode, pattern) in MODE_PATTERNS {
		if strip_matches(&mut stripped, pattern) && mode_hint.is_none() {
			mode_hint = Some(*mode);
		}
	}

	let mut clean = collapse_whitespace(&stripped).to_lowercase();

	if clean.is_empty() {
		clean = collapse_whitespace(raw_query).to_lowercase();
	}

	let window_days = window_days.unwrap_or(DEFAULT_WINDOW_DAYS);
	let mode = mode_hint.unwrap_or_else(|| Mode::for_window(window_days));
	let limit = max_queries.clamp(1, MAX_PLAN_QUERIES);
	let mut queries = Vec::new();
	let mut seen = HashSet::new();

	push_query(&mut queries, &mut seen, &clean);

	for (topic, synonyms) in TOPIC_SYNONYMS {
		if !clean.contains(topic) {
			continue;
		}

		for synonym in *synonyms {
			push_query(&mut queries, &mut seen, &clean.replacen(topic, synonym, 1));
		}
	}

	if clean.chars().count() > MIN_SIGNIFICANT_CHARS {
		if !clean.split_whitespace().any(|word| word == "vlog") {
			push_query(&mut queries, &mut seen, &format!("{clean} vlog"));
		}

		push_query(&mut queries, &mut seen, &format!("{clean} {SEASONAL_SUFFIX}"));
	}

	queries.truncate(limit);

	SearchPlan {
		intent_summary: intent_summary(mode, &clean, window_days),
		must_include: must_include(&clean),
		queries,
		suggested_window_days: window_days,
		suggested_mode: mode,
		language_hint,
		source: PlanSource::Fallback,
	}
}

/// Bounds-checks a plan from the external planner. `None` means "use the fallback".
pub fn validate_plan(plan: SearchPlan, max_queries: usize) -> Option<SearchPlan> {
	let limit = max_queries.clamp(1, MAX_PLAN_QUERIES);
	let mut queries = Vec::new();
	let mut seen = HashSet::new();

	for query in &plan.queries {
		push_query(&mut queries, &mut seen, query);
	}

	queries.truncate(limit);

	if queries.is_empty() {
		return None;
	}
	if !(1..=MAX_WINDOW_DAYS).contains(&plan.suggested_window_days) {
		return None;
	}

	let mode = match plan.suggested_mode {
		Mode::LegacySearch => Mode::for_window(plan.suggested_window_days),
		mode => mode,
	};
	let mut must_include = Vec::new();
	let mut seen_terms = HashSet::new();

	for term in &plan.must_include {
		push_query(&mut must_include, &mut seen_terms, term);
	}

	let intent_summary = match plan.intent_summary.trim() {
		"" => intent_summary(mode, &queries[0], plan.suggested_window_days),
		summary => summary.to_string(),
	};

	Some(SearchPlan {
		queries,
		suggested_window_days: plan.suggested_window_days,
		suggested_mode: mode,
		must_include,
		language_hint: plan.language_hint,
		intent_summary,
		source: PlanSource::Planner,
	})
}

fn strip_matches(text: &mut String, pattern: &str) -> bool {
	let Ok(re) = Regex::new(pattern) else {
		return false;
	};

	if !re.is_match(text) {
		return false;
	}

	*text = re.replace_all(text, " ").into_owned();

	true
}

fn push_query(out: &mut Vec<String>, seen: &mut HashSet<String>, value: &str) {
	let trimmed = collapse_whitespace(value);

	if trimmed.is_empty() {
		return;
	}
	if seen.insert(trimmed.to_lowercase()) {
		out.push(trimmed);
	}
}

fn collapse_whitespace(value: &str) -> String {
	value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn must_include(clean: &str) -> Vec<String> {
	clean
		.split_whitespace()
		.filter(|word| word.chars().count() > MIN_SIGNIFICANT_CHARS)
		.take(MUST_INCLUDE_WORDS)
		.map(str::to_string)
		.collect()
}

fn intent_summary(mode: Mode, clean: &str, window_days: u32) -> String {
	let unit = if window_days == 1 { "day" } else { "days" };

	format!("{mode} videos about \"{clean}\" from the last {window_days} {unit}")
}
