//! Core domain model for appgauge reliability estimation.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `AppQuery`: The fuzzy lookup input (name plus optional hints)
//! - `Candidate`: One store listing under evaluation
//! - `Resolution`: The outcome of identity resolution
//! - `ScoreCard`: The final 1-10 reliability score with grade

use serde::{Deserialize, Serialize};

/// A store platform whose catalog we query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Google Play (exposes install-tier badges)
    Play,
    /// Apple App Store (exposes per-region rating counts)
    AppStore,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::AppStore => "app_store",
        }
    }
}

/// Fuzzy lookup input: an app name plus optional disambiguation hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppQuery {
    /// The app name as shown on the listing being annotated
    pub name: String,

    /// Category hint from the listing's own taxonomy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Short tagline/subtitle, used as a description tiebreaker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,

    /// Developer/publisher name, if known from another platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_hint: Option<String>,
}

impl AppQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tagline(mut self, tagline: impl Into<String>) -> Self {
        self.tagline = Some(tagline.into());
        self
    }

    pub fn with_developer_hint(mut self, developer: impl Into<String>) -> Self {
        self.developer_hint = Some(developer.into());
        self
    }
}

/// One store search result, fully populated from the detail payload.
///
/// Candidates are ephemeral: they are scored, ranked, and discarded except
/// for the winner. They are never mutated once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Platform-specific listing id (package name or numeric track id)
    pub id: String,

    /// Listing title
    #[serde(default)]
    pub title: String,

    /// Store-reported category, if the payload carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Full listing description
    #[serde(default)]
    pub description: String,

    /// Developer/publisher name
    #[serde(default)]
    pub developer: String,

    /// Rating count as reported by the store
    #[serde(default)]
    pub rating_count: u64,

    /// Disclosed install-tier floor (Play badge), absent on App Store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_floor: Option<u64>,
}

impl Candidate {
    /// Create a minimal candidate for testing.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            description: String::new(),
            developer: String::new(),
            rating_count: 0,
            install_floor: None,
        }
    }
}

/// Per-signal match scores for one candidate against a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Category compatibility: 1.0 or 0.0
    pub category_score: f64,
    /// Tagline-token fraction found in the description, in [0, 1]
    pub description_score: f64,
    /// Developer similarity: 1.0, 0.9 or 0.0
    pub developer_score: f64,
    /// category*3.0 + description + developer*2.0
    pub composite: f64,
}

/// The winning candidate for one (query, platform) resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub platform: Platform,
    pub candidate: Candidate,
    pub score: MatchScore,
}

/// Outcome of identity resolution. Absence is a first-class result, not an
/// error: callers branch on the variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Matched(ResolvedIdentity),
    NotFound,
}

impl Resolution {
    pub fn matched(&self) -> Option<&ResolvedIdentity> {
        match self {
            Self::Matched(identity) => Some(identity),
            Self::NotFound => None,
        }
    }
}

/// Rating data for one regional storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalRatingSample {
    pub region: String,
    pub rating_count: u64,
    pub average_rating: f64,
}

/// Global rating estimate summed over sampled regional storefronts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRating {
    pub total_estimated: u64,
    /// Rating-count-weighted average rating across contributing regions
    pub weighted_average: f64,
    /// Regions that contributed a non-zero rating count, in sample order
    pub regions_used: Vec<String>,
}

/// Which input supplied the genre used for the download multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreSource {
    /// Externally supplied category hint
    Hint,
    /// Category reported by one of the store listings
    Store,
    /// No usable genre; platform default multiplier applied
    Default,
}

/// Install estimate for a single platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadEstimate {
    pub platform: Platform,
    pub estimated_installs: u64,
    pub genre_used: String,
}

/// Combined install estimate across platforms, with genre diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadBreakdown {
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play: Option<DownloadEstimate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store: Option<DownloadEstimate>,
    pub genre_used: String,
    pub genre_source: GenreSource,
}

/// Qualitative reliability grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Elite,
    High,
    Medium,
    Low,
}

impl Grade {
    /// Grade thresholds over the final [2, 10] score.
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            Self::Elite
        } else if score >= 7.5 {
            Self::High
        } else if score >= 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Final reliability verdict for one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// Final score in [2, 10], snapped to the nearest 0.5
    pub score: f64,
    pub grade: Grade,
    /// Downloads subscore in [1, 5]
    pub downloads_subscore: f64,
    /// Growth subscore in [1, 5]; absent when no review history exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_subscore: Option<f64>,
}
