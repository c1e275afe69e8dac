//! Identity resolution: pick the correct store listing for a fuzzy query.
//!
//! Candidates from the store client are filtered by a title fuzzy-equality
//! gate, scored on category/description/developer signals, and ranked by a
//! weighted composite. Resolution is pure: it never fetches, and absence is
//! returned as `Resolution::NotFound` rather than an error.

use appgauge_features::{
    category_matches, description_score, developer_score, title_matches, StoreTaxonomy,
};
use appgauge_model::{
    AppQuery, Candidate, MatchScore, Platform, Resolution, ResolvedIdentity,
};

/// Weights for the composite candidate ranking.
///
/// Category dominates, developer is a strong secondary signal, description
/// acts as a tiebreaker.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub category_weight: f64,
    pub developer_weight: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            category_weight: 3.0,
            developer_weight: 2.0,
        }
    }
}

fn taxonomy_for(platform: Platform) -> StoreTaxonomy {
    match platform {
        Platform::Play => StoreTaxonomy::Play,
        Platform::AppStore => StoreTaxonomy::AppStore,
    }
}

/// Score one candidate against the query. Returns `None` when the candidate
/// fails a hard gate (title mismatch, or the query names a category the
/// listing cannot confirm).
fn score_candidate(
    query: &AppQuery,
    candidate: &Candidate,
    platform: Platform,
    config: &ResolverConfig,
) -> Option<MatchScore> {
    if !title_matches(&query.name, &candidate.title) {
        return None;
    }

    // A query category with no listing category cannot be safely confirmed.
    if query.category.is_some() && candidate.category.is_none() {
        return None;
    }

    let category_ok = category_matches(
        query.category.as_deref(),
        candidate.category.as_deref(),
        taxonomy_for(platform),
    );
    let category_score = if category_ok { 1.0 } else { 0.0 };

    let description_score = description_score(query.tagline.as_deref(), &candidate.description);
    let developer_score = developer_score(query.developer_hint.as_deref(), &candidate.developer);

    let composite = category_score * config.category_weight
        + description_score
        + developer_score * config.developer_weight;

    Some(MatchScore {
        category_score,
        description_score,
        developer_score,
        composite,
    })
}

/// Resolve a query against a candidate set from one platform.
///
/// Every candidate the store client hands over is scored: the client already
/// caps its search pages, and augmented searches deliberately widen the set
/// past one page. Candidates are evaluated in the order the store client
/// returned them; composite ties keep that order (stable sort). The top
/// candidate must show at least some positive evidence: composite <= 0
/// resolves to `NotFound`.
pub fn resolve(
    query: &AppQuery,
    candidates: Vec<Candidate>,
    platform: Platform,
    config: &ResolverConfig,
) -> Resolution {
    let mut scored: Vec<(Candidate, MatchScore)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            match score_candidate(query, &candidate, platform, config) {
                Some(score) => {
                    tracing::debug!(
                        candidate = %candidate.id,
                        title = %candidate.title,
                        composite = score.composite,
                        "candidate scored"
                    );
                    Some((candidate, score))
                }
                None => {
                    tracing::debug!(
                        candidate = %candidate.id,
                        title = %candidate.title,
                        "candidate dropped by match gates"
                    );
                    None
                }
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.composite
            .partial_cmp(&a.1.composite)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    match scored.into_iter().next() {
        Some((candidate, score)) if score.composite > 0.0 => {
            tracing::debug!(
                winner = %candidate.id,
                composite = score.composite,
                "resolved identity"
            );
            Resolution::Matched(ResolvedIdentity {
                platform,
                candidate,
                score,
            })
        }
        Some((candidate, _)) => {
            tracing::debug!(
                candidate = %candidate.id,
                "best candidate has no positive evidence, rejecting"
            );
            Resolution::NotFound
        }
        None => Resolution::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(
        id: &str,
        title: &str,
        category: Option<&str>,
        description: &str,
        developer: &str,
    ) -> Candidate {
        Candidate {
            id: id.to_string(),
            title: title.to_string(),
            category: category.map(|c| c.to_string()),
            description: description.to_string(),
            developer: developer.to_string(),
            rating_count: 0,
            install_floor: None,
        }
    }

    #[test]
    fn test_title_gate_never_selected() {
        // Perfect category and developer, but the title fails every variant
        let query = AppQuery::new("Binance")
            .with_category("Finance")
            .with_developer_hint("Binance Inc");
        let candidates = vec![candidate(
            "com.coinbase",
            "Coinbase",
            Some("Finance"),
            "",
            "Binance Inc",
        )];

        let resolution = resolve(&query, candidates, Platform::Play, &ResolverConfig::default());
        assert!(resolution.matched().is_none());
    }

    #[test]
    fn test_zero_composite_rejected() {
        // Title matches but no category/description/developer evidence
        let query = AppQuery::new("Craft")
            .with_category("Productivity")
            .with_developer_hint("Luki Labs");
        let candidates = vec![candidate(
            "com.other.craft",
            "Craft",
            Some("Games"),
            "A crafting survival game.",
            "Somebody Else",
        )];

        let resolution = resolve(&query, candidates, Platform::Play, &ResolverConfig::default());
        assert!(matches!(resolution, Resolution::NotFound));
    }

    #[test]
    fn test_missing_listing_category_rejected_when_query_has_one() {
        let query = AppQuery::new("Craft").with_category("Productivity");
        let candidates = vec![candidate("com.craft", "Craft", None, "", "")];

        let resolution = resolve(&query, candidates, Platform::Play, &ResolverConfig::default());
        assert!(matches!(resolution, Resolution::NotFound));
    }

    #[test]
    fn test_category_dominates_ranking() {
        let query = AppQuery::new("Craft")
            .with_category("Productivity")
            .with_tagline("Docs and notes for teams");
        let candidates = vec![
            candidate(
                "com.game.craft",
                "Craft",
                Some("Games"),
                "Docs and notes for teams appear in this game too, somehow.",
                "",
            ),
            candidate(
                "com.luki.craft",
                "Craft",
                Some("Productivity"),
                "Write docs.",
                "",
            ),
        ];

        let resolution = resolve(&query, candidates, Platform::Play, &ResolverConfig::default());
        let identity = resolution.matched().expect("should resolve");
        assert_eq!(identity.candidate.id, "com.luki.craft");
        assert_eq!(identity.score.category_score, 1.0);
    }

    #[test]
    fn test_ties_keep_store_order() {
        let query = AppQuery::new("Craft");
        let candidates = vec![
            candidate("first", "Craft", Some("Games"), "", "dev"),
            candidate("second", "Craft", Some("Games"), "", "dev"),
        ];

        // No query category: both get category_score 1.0 and identical
        // composites; the store's original order must win.
        let resolution = resolve(&query, candidates, Platform::Play, &ResolverConfig::default());
        assert_eq!(resolution.matched().unwrap().candidate.id, "first");
    }

    #[test]
    fn test_determinism() {
        let query = AppQuery::new("Slack")
            .with_category("Communication")
            .with_tagline("Team chat and channels")
            .with_developer_hint("Slack Technologies");
        let candidates = vec![
            candidate(
                "com.slack",
                "Slack - Team Communication",
                Some("Communication"),
                "Channels keep team chat organised.",
                "Slack Technologies, Inc.",
            ),
            candidate(
                "com.clone",
                "Slack",
                Some("Communication"),
                "",
                "Unknown",
            ),
        ];

        let config = ResolverConfig::default();
        let first = resolve(&query, candidates.clone(), Platform::Play, &config);
        let second = resolve(&query, candidates, Platform::Play, &config);

        let a = first.matched().unwrap();
        let b = second.matched().unwrap();
        assert_eq!(a.candidate.id, b.candidate.id);
        assert_eq!(a.score, b.score);
        assert_eq!(a.candidate.id, "com.slack");
    }

    #[test]
    fn test_augmented_candidates_beyond_first_page_are_scored() {
        // The Play client unions a full primary page with augmented-search
        // results, so the winner can sit past the per-page cap of 5.
        let query = AppQuery::new("Craft").with_tagline("Docs and notes for teams");
        let mut candidates: Vec<Candidate> = (0..5)
            .map(|i| candidate(&format!("com.noise.{i}"), "Nothing Alike", None, "", ""))
            .collect();
        candidates.push(candidate(
            "com.luki.craft",
            "Craft",
            Some("Productivity"),
            "Docs and notes for teams.",
            "",
        ));

        let resolution = resolve(&query, candidates, Platform::Play, &ResolverConfig::default());
        assert_eq!(
            resolution.matched().expect("should resolve").candidate.id,
            "com.luki.craft"
        );
    }
}
