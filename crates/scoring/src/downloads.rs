//! Download estimation: rating count -> install estimate.
//!
//! Each genre carries a hand-tuned ratings-to-installs multiplier (Play
//! scale; the App Store runs at 0.75x since its users review less per
//! install). Play estimates are clamped into the install tier the store
//! itself disclosed; App Store estimates are unclamped.

use appgauge_model::{DownloadBreakdown, DownloadEstimate, GenreSource, Platform};

/// Ratings-to-installs multipliers at Play scale. Lookup is a
/// case-insensitive substring match, first entry wins.
const GENRE_MULTIPLIERS: &[(&str, f64)] = &[
    // Entertainment / leisure
    ("game", 150.0),
    ("entertainment", 170.0),
    ("social networking", 190.0),
    ("music & audio", 190.0),
    ("sports", 175.0),
    ("photo & video", 190.0),
    ("lifestyle", 200.0),
    // Transactional / general
    ("shopping", 175.0),
    ("travel", 180.0),
    ("food & drink", 180.0),
    ("education", 200.0),
    ("reference", 200.0),
    ("collaboration", 200.0),
    ("graphics & design", 200.0),
    // Professional / business
    ("communication", 200.0),
    ("productivity", 215.0),
    ("business", 220.0),
    ("developer tools", 225.0),
    ("jobs & recruitment", 220.0),
    ("maps & navigation", 195.0),
    ("ai", 225.0),
    ("crm", 240.0),
    ("real estate", 220.0),
    // Financial / safety-critical
    ("utilities", 195.0),
    ("finance", 230.0),
    ("news", 195.0),
    ("crypto & web3", 245.0),
    ("medical", 265.0),
    ("health", 285.0),
];

const DEFAULT_MULTIPLIER_PLAY: f64 = 55.0;
const DEFAULT_MULTIPLIER_APP_STORE: f64 = 40.0;
const APP_STORE_SCALE: f64 = 0.75;

/// Disclosed Play install-tier thresholds, ascending.
const PLAY_INSTALL_TIERS: &[u64] = &[
    100,
    500,
    1_000,
    5_000,
    10_000,
    50_000,
    100_000,
    500_000,
    1_000_000,
    5_000_000,
    10_000_000,
    50_000_000,
    100_000_000,
    500_000_000,
    1_000_000_000,
];

/// Gap kept below the next tier boundary when clamping down.
const TIER_CAP_GAP: u64 = 1_000;

/// The tier boundary strictly above the disclosed floor, or `None` at the
/// top tier.
fn next_tier(floor: u64) -> Option<u64> {
    PLAY_INSTALL_TIERS.iter().copied().find(|&tier| tier > floor)
}

/// Store-scaled multiplier for a genre string.
pub fn multiplier_for(genre: Option<&str>, platform: Platform) -> f64 {
    let scale = match platform {
        Platform::Play => 1.0,
        Platform::AppStore => APP_STORE_SCALE,
    };
    let default = match platform {
        Platform::Play => DEFAULT_MULTIPLIER_PLAY,
        Platform::AppStore => DEFAULT_MULTIPLIER_APP_STORE,
    };

    let Some(genre) = genre else {
        return default;
    };
    let genre = genre.to_lowercase();
    if genre.is_empty() {
        return default;
    }

    for (keyword, base) in GENRE_MULTIPLIERS {
        if genre.contains(keyword) {
            return (base * scale).round();
        }
    }
    default
}

/// Clamp a raw Play estimate into the disclosed install tier: never below
/// the floor, and capped just under the next tier boundary.
fn clamp_to_tier(raw: u64, floor: Option<u64>) -> u64 {
    let Some(floor) = floor.filter(|&f| f > 0) else {
        return raw;
    };

    if raw < floor {
        return floor;
    }
    if let Some(next) = next_tier(floor) {
        if raw >= next {
            return floor.max(next - TIER_CAP_GAP);
        }
    }
    raw
}

/// Per-platform inputs to the estimator.
#[derive(Debug, Clone, Default)]
pub struct PlatformSignals {
    pub rating_count: u64,
    /// Disclosed install-tier floor (Play only)
    pub install_floor: Option<u64>,
    /// Store-reported category
    pub genre: Option<String>,
}

/// Resolve which genre drives the multipliers: the external hint wins,
/// then either store's reported category, then the platform default.
fn resolve_genre(
    hint: Option<&str>,
    play: Option<&PlatformSignals>,
    app_store: Option<&PlatformSignals>,
) -> (Option<String>, GenreSource) {
    if let Some(hint) = hint {
        if !hint.trim().is_empty() {
            return (Some(hint.to_string()), GenreSource::Hint);
        }
    }
    for signals in [play, app_store].into_iter().flatten() {
        if let Some(genre) = &signals.genre {
            if !genre.trim().is_empty() {
                return (Some(genre.clone()), GenreSource::Store);
            }
        }
    }
    (None, GenreSource::Default)
}

/// Estimate installs per platform and in total.
pub fn estimate_downloads(
    play: Option<&PlatformSignals>,
    app_store: Option<&PlatformSignals>,
    genre_hint: Option<&str>,
) -> DownloadBreakdown {
    let (genre, genre_source) = resolve_genre(genre_hint, play, app_store);
    let genre_used = genre.clone().unwrap_or_else(|| "N/A".to_string());

    let play_estimate = play.map(|signals| {
        let multiplier = multiplier_for(genre.as_deref(), Platform::Play);
        let raw = (signals.rating_count as f64 * multiplier).floor() as u64;
        let clamped = clamp_to_tier(raw, signals.install_floor);
        tracing::debug!(raw, clamped, multiplier, "play install estimate");
        DownloadEstimate {
            platform: Platform::Play,
            estimated_installs: clamped,
            genre_used: genre_used.clone(),
        }
    });

    let app_store_estimate = app_store.map(|signals| {
        let multiplier = multiplier_for(genre.as_deref(), Platform::AppStore);
        let raw = (signals.rating_count as f64 * multiplier).floor() as u64;
        tracing::debug!(raw, multiplier, "app store install estimate");
        DownloadEstimate {
            platform: Platform::AppStore,
            estimated_installs: raw,
            genre_used: genre_used.clone(),
        }
    });

    let total = play_estimate
        .as_ref()
        .map(|e| e.estimated_installs)
        .unwrap_or(0)
        + app_store_estimate
            .as_ref()
            .map(|e| e.estimated_installs)
            .unwrap_or(0);

    DownloadBreakdown {
        total,
        play: play_estimate,
        app_store: app_store_estimate,
        genre_used,
        genre_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn finance_play(rating_count: u64, floor: u64) -> PlatformSignals {
        PlatformSignals {
            rating_count,
            install_floor: Some(floor),
            genre: Some("Finance".to_string()),
        }
    }

    #[test]
    fn test_multiplier_lookup() {
        assert_eq!(multiplier_for(Some("Finance"), Platform::Play), 230.0);
        // App Store runs at 0.75x, rounded
        assert_eq!(multiplier_for(Some("Finance"), Platform::AppStore), 173.0);
        // Substring match: "Casual Games" hits the game entry
        assert_eq!(multiplier_for(Some("Casual Games"), Platform::Play), 150.0);
        // Unknown genre falls back to the platform default
        assert_eq!(multiplier_for(Some("Quilting"), Platform::Play), 55.0);
        assert_eq!(multiplier_for(None, Platform::AppStore), 40.0);
    }

    #[test]
    fn test_clamp_up_to_floor() {
        // Raw estimate 100 * 230 = 23,000, far below the disclosed 1M floor
        let breakdown = estimate_downloads(Some(&finance_play(100, 1_000_000)), None, None);
        assert_eq!(breakdown.play.unwrap().estimated_installs, 1_000_000);
    }

    #[test]
    fn test_clamp_down_to_tier_cap() {
        // Raw estimate 50,000 * 230 = 11.5M overshoots the 1M..5M tier
        let breakdown = estimate_downloads(Some(&finance_play(50_000, 1_000_000)), None, None);
        assert_eq!(breakdown.play.unwrap().estimated_installs, 4_999_000);
    }

    #[test]
    fn test_in_range_estimate_kept() {
        // Raw estimate 10,000 * 230 = 2.3M sits inside the disclosed tier
        let breakdown = estimate_downloads(Some(&finance_play(10_000, 1_000_000)), None, None);
        assert_eq!(breakdown.play.unwrap().estimated_installs, 2_300_000);
    }

    #[test]
    fn test_top_tier_has_no_upper_clamp() {
        let breakdown =
            estimate_downloads(Some(&finance_play(10_000_000, 1_000_000_000)), None, None);
        assert_eq!(
            breakdown.play.unwrap().estimated_installs,
            2_300_000_000
        );
    }

    #[test]
    fn test_clamp_bounds_property() {
        // result is always within [floor, max(floor, next_tier - 1000)]
        let floor = 1_000_000u64;
        let cap = 4_999_000u64;
        for rating_count in [0u64, 1, 100, 5_000, 10_000, 50_000, 1_000_000] {
            let breakdown =
                estimate_downloads(Some(&finance_play(rating_count, floor)), None, None);
            let installs = breakdown.play.unwrap().estimated_installs;
            assert!(installs >= floor, "below floor for {rating_count}");
            assert!(installs <= cap, "above cap for {rating_count}");
        }
    }

    #[test]
    fn test_app_store_unclamped_and_scaled() {
        let app_store = PlatformSignals {
            rating_count: 1_000,
            install_floor: None,
            genre: Some("Finance".to_string()),
        };
        let breakdown = estimate_downloads(None, Some(&app_store), None);
        assert_eq!(breakdown.app_store.unwrap().estimated_installs, 173_000);
        assert!(breakdown.play.is_none());
    }

    #[test]
    fn test_total_sums_platforms() {
        let play = PlatformSignals {
            rating_count: 1_000,
            install_floor: None,
            genre: Some("Finance".to_string()),
        };
        let app_store = PlatformSignals {
            rating_count: 1_000,
            install_floor: None,
            genre: None,
        };
        let breakdown = estimate_downloads(Some(&play), Some(&app_store), None);
        assert_eq!(breakdown.total, 230_000 + 173_000);
    }

    #[test]
    fn test_genre_precedence_and_source() {
        let play = PlatformSignals {
            rating_count: 100,
            install_floor: None,
            genre: Some("Games".to_string()),
        };

        // Hint beats the store category
        let hinted = estimate_downloads(Some(&play), None, Some("Finance"));
        assert_eq!(hinted.genre_source, GenreSource::Hint);
        assert_eq!(hinted.genre_used, "Finance");
        assert_eq!(hinted.play.unwrap().estimated_installs, 23_000);

        // No hint: the store category applies
        let store = estimate_downloads(Some(&play), None, None);
        assert_eq!(store.genre_source, GenreSource::Store);
        assert_eq!(store.genre_used, "Games");

        // Neither: platform default
        let bare = PlatformSignals {
            rating_count: 100,
            install_floor: None,
            genre: None,
        };
        let defaulted = estimate_downloads(Some(&bare), None, None);
        assert_eq!(defaulted.genre_source, GenreSource::Default);
        assert_eq!(defaulted.genre_used, "N/A");
        assert_eq!(defaulted.play.unwrap().estimated_installs, 5_500);
    }
}
