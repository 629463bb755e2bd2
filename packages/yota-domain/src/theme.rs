//! Content themes inferred from titles. Session feedback is keyed by these theme names.

const THEME_PATTERNS: &[(&str, &[&str])] = &[
	("qa", &["q&a", "questions", "answers", "ask me", "ama"]),
	("vlog", &["vlog", "day in", "daily", "life", "routine"]),
	("challenge", &["challenge", "try", "trying", "attempt", "vs"]),
	("tutorial", &["how to", "tutorial", "guide", "tips", "learn"]),
	("storytime", &["storytime", "story", "happened", "time i", "time we"]),
	("announcement", &["announcement", "news", "update", "reveal", "surprise"]),
	("reaction", &["reaction", "react", "reacting", "respond"]),
	("review", &["review", "unboxing", "haul", "first impression"]),
];

pub const THEMES: [&str; 8] =
	["qa", "vlog", "challenge", "tutorial", "storytime", "announcement", "reaction", "review"];

/// Themes whose phrases occur in `title` as whole words, in table order.
pub fn detect_themes(title: &str) -> Vec<&'static str> {
	let normalized = normalize(title);

	THEME_PATTERNS
		.iter()
		.filter(|(_, phrases)| {
			phrases.iter().any(|phrase| normalized.contains(&format!(" {phrase} ")))
		})
		.map(|(theme, _)| *theme)
		.collect()
}

fn normalize(title: &str) -> String {
	let lowered = title.to_lowercase();
	let words: Vec<&str> = lowered
		.split(|ch: char| !(ch.is_alphanumeric() || ch == '&'))
		.filter(|word| !word.is_empty())
		.collect();

	format!(" {} ", words.join(" "))
}
