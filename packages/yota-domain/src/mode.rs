use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A named scoring strategy. Fixed for the lifetime of one request.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
	Trending,
	WeekMovers,
	RisingSmall,
	Wildcard,
	#[default]
	ForYou,
	/// 0-100 trend score used by plain search.
	LegacySearch,
}
impl Mode {
	pub const ALL: [Self; 6] = [
		Self::Trending,
		Self::WeekMovers,
		Self::RisingSmall,
		Self::Wildcard,
		Self::ForYou,
		Self::LegacySearch,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Trending => "trending",
			Self::WeekMovers => "weekMovers",
			Self::RisingSmall => "risingSmall",
			Self::Wildcard => "wildcard",
			Self::ForYou => "forYou",
			Self::LegacySearch => "legacySearch",
		}
	}

	/// Mode implied by a recency window when nothing else names one.
	pub fn for_window(window_days: u32) -> Self {
		match window_days {
			0..=1 => Self::Trending,
			2..=7 => Self::WeekMovers,
			_ => Self::ForYou,
		}
	}

	pub fn default_window_days(self) -> u32 {
		match self {
			Self::Trending => 1,
			Self::WeekMovers | Self::RisingSmall | Self::Wildcard | Self::ForYou => 7,
			Self::LegacySearch => 30,
		}
	}
}
impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Mode {
	type Err = UnknownMode;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let trimmed = raw.trim();

		Self::ALL
			.into_iter()
			.find(|mode| mode.as_str().eq_ignore_ascii_case(trimmed))
			.ok_or_else(|| UnknownMode(trimmed.to_string()))
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMode(pub String);
impl fmt::Display for UnknownMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown discovery mode {:?}.", self.0)
	}
}
impl std::error::Error for UnknownMode {}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
	En,
	Es,
}
impl Language {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::En => "en",
			Self::Es => "es",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"en" | "english" => Some(Self::En),
			"es" | "spanish" | "español" => Some(Self::Es),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
	#[default]
	En,
	Es,
	Mixed,
}
impl LanguageMode {
	/// Language branches to search, the designated pagination branch first.
	pub fn languages(self) -> &'static [Language] {
		match self {
			Self::En => &[Language::En],
			Self::Es => &[Language::Es],
			Self::Mixed => &[Language::En, Language::Es],
		}
	}
}
impl From<Language> for LanguageMode {
	fn from(language: Language) -> Self {
		match language {
			Language::En => Self::En,
			Language::Es => Self::Es,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_wire_names_case_insensitively() {
		assert_eq!("weekMovers".parse::<Mode>(), Ok(Mode::WeekMovers));
		assert_eq!("RISINGSMALL".parse::<Mode>(), Ok(Mode::RisingSmall));
		assert!("viral".parse::<Mode>().is_err());
	}

	#[test]
	fn window_implies_mode() {
		assert_eq!(Mode::for_window(1), Mode::Trending);
		assert_eq!(Mode::for_window(7), Mode::WeekMovers);
		assert_eq!(Mode::for_window(30), Mode::ForYou);
	}

	#[test]
	fn mixed_mode_searches_english_first() {
		assert_eq!(LanguageMode::Mixed.languages(), &[Language::En, Language::Es]);
	}
}
