//! Outlier pass over a ranked result set: videos whose views beat the set's median by a fixed
//! ratio, plus the words and formats those videos share.

use serde::{Deserialize, Serialize};

use crate::{scoring::cmp_f64_desc, theme, video::ScoredVideo};

/// Views at or above `median * OUTLIER_THRESHOLD` make an outlier.
pub const OUTLIER_THRESHOLD: f64 = 1.8;
pub const TOP_KEYWORDS: usize = 5;

const SUMMARY_KEYWORDS: usize = 3;
const MIN_KEYWORD_CHARS: usize = 3;
const STOPWORDS: &[&str] = &[
	"the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "is", "was",
	"are", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
	"would", "could", "should", "may", "might", "must", "can", "cant", "our", "we", "us", "my",
	"me", "i", "you", "he", "she", "it", "they", "them", "this", "that", "these", "those", "what",
	"which", "who", "when", "where", "why", "how", "all", "each", "every", "both", "few", "more",
	"most", "other", "some", "such", "no", "not", "only", "own", "same", "so", "than", "too",
	"very", "just",
];

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
	pub median_views: u64,
	pub mean_views: u64,
	/// Sample standard deviation, rounded to two decimals; zero below two videos.
	pub std_dev: f64,
	pub total_videos: usize,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outlier {
	pub video_id: String,
	pub title: String,
	pub channel_id: String,
	pub views: u64,
	pub themes: Vec<String>,
	/// `views / median`, rounded to two decimals.
	pub outlier_ratio: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordCount {
	pub word: String,
	pub count: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierPatterns {
	pub common_keywords: Vec<KeywordCount>,
	pub detected_formats: Vec<String>,
	pub pattern_summary: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierReport {
	pub baseline: Baseline,
	pub threshold: f64,
	pub outliers: Vec<Outlier>,
	pub patterns: OutlierPatterns,
}

/// Baseline, outliers and shared patterns of `items` at the default threshold.
pub fn analyze(items: &[ScoredVideo]) -> OutlierReport {
	let views: Vec<u64> = items.iter().map(|item| item.video.views).collect();
	let outliers = detect(items, OUTLIER_THRESHOLD);
	let patterns = patterns(&outliers);

	OutlierReport { baseline: baseline(&views), threshold: OUTLIER_THRESHOLD, outliers, patterns }
}

pub fn baseline(views: &[u64]) -> Baseline {
	if views.is_empty() {
		return Baseline::default();
	}

	let total: u128 = views.iter().map(|&count| u128::from(count)).sum();
	let mean = total as f64 / views.len() as f64;
	let std_dev = if views.len() > 1 {
		let squares: f64 = views.iter().map(|&count| (count as f64 - mean).powi(2)).sum();

		round2((squares / (views.len() - 1) as f64).sqrt())
	} else {
		0.0
	};

	Baseline {
		median_views: median(views),
		mean_views: (total / views.len() as u128) as u64,
		std_dev,
		total_videos: views.len(),
	}
}

/// Videos with `views >= median * threshold`, highest ratio first. A zero median yields none.
pub fn detect(items: &[ScoredVideo], threshold: f64) -> Vec<Outlier> {
	let views: Vec<u64> = items.iter().map(|item| item.video.views).collect();

	if views.is_empty() {
		return Vec::new();
	}

	let median_views = median(&views);

	if median_views == 0 {
		return Vec::new();
	}

	let cutoff = median_views as f64 * threshold;
	let mut outliers: Vec<Outlier> = items
		.iter()
		.filter(|item| item.video.views as f64 >= cutoff)
		.map(|item| Outlier {
			video_id: item.video.id.clone(),
			title: item.video.title.clone(),
			channel_id: item.video.channel_id.clone(),
			views: item.video.views,
			themes: item.themes.clone(),
			outlier_ratio: round2(item.video.views as f64 / median_views as f64),
		})
		.collect();

	outliers.sort_by(|a, b| cmp_f64_desc(a.outlier_ratio, b.outlier_ratio));

	outliers
}

/// Most frequent title words outside the stopword list, ties in first-seen order.
pub fn keywords<'a, I>(titles: I, top_n: usize) -> Vec<KeywordCount>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut counts: Vec<KeywordCount> = Vec::new();

	for title in titles {
		let cleaned = title.to_lowercase().replace(['!', '?'], "");

		for word in cleaned.split_whitespace() {
			if STOPWORDS.contains(&word) || word.chars().count() < MIN_KEYWORD_CHARS {
				continue;
			}

			match counts.iter_mut().find(|entry| entry.word == word) {
				Some(entry) => entry.count += 1,
				None => counts.push(KeywordCount { word: word.to_string(), count: 1 }),
			}
		}
	}

	counts.sort_by(|a, b| b.count.cmp(&a.count));
	counts.truncate(top_n);

	counts
}

pub fn patterns(outliers: &[Outlier]) -> OutlierPatterns {
	if outliers.is_empty() {
		return OutlierPatterns {
			common_keywords: Vec::new(),
			detected_formats: Vec::new(),
			pattern_summary: "No outliers found".to_string(),
		};
	}

	let titles = outliers.iter().map(|outlier| outlier.title.as_str());
	let common_keywords = keywords(titles, TOP_KEYWORDS);
	let detected_formats: Vec<String> = theme::THEMES
		.iter()
		.filter(|name| {
			outliers.iter().any(|outlier| outlier.themes.iter().any(|theme| theme == *name))
		})
		.map(|name| name.to_string())
		.collect();
	let mut parts = Vec::with_capacity(2);

	if !common_keywords.is_empty() {
		let words: Vec<String> = common_keywords
			.iter()
			.take(SUMMARY_KEYWORDS)
			.map(|entry| format!("\"{}\"", entry.word))
			.collect();

		parts.push(format!("Common words: {}", words.join(", ")));
	}
	if !detected_formats.is_empty() {
		parts.push(format!("Formats: {}", detected_formats.join(", ")));
	}

	let pattern_summary = if parts.is_empty() {
		"No clear pattern detected".to_string()
	} else {
		parts.join(" • ")
	};

	OutlierPatterns { common_keywords, detected_formats, pattern_summary }
}

/// Even counts average the two middle values, truncated.
fn median(views: &[u64]) -> u64 {
	let mut sorted = views.to_vec();

	sorted.sort_unstable();

	let mid = sorted.len() / 2;

	if sorted.len() % 2 == 0 {
		((u128::from(sorted[mid - 1]) + u128::from(sorted[mid])) / 2) as u64
	} else {
		sorted[mid]
	}
}

fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}
