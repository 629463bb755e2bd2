//! Pure discovery-feed logic: scoring, personalization, query planning fallbacks, outlier
//! analysis and pagination. Nothing here performs I/O.

pub mod mode;
pub mod outlier;
pub mod paginate;
pub mod personalize;
pub mod planner;
pub mod scoring;
pub mod session;
pub mod theme;
pub mod time_serde;
pub mod trend;
pub mod video;

pub use mode::{Language, LanguageMode, Mode};
pub use session::{FeedSessionState, SessionSignals};
pub use video::{ScoreBreakdown, ScoredVideo, VideoCandidate, VideoMetrics};
