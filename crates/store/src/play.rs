//! Google Play store client.
//!
//! Play has no public JSON search API, so candidates are discovered from
//! the search page and each listing's fields are extracted from the JSON
//! fragments embedded in its detail payload. All extraction lives in pure
//! functions so it can be tested against payload snippets.

use std::sync::LazyLock;

use appgauge_features::tagline_keywords;
use appgauge_model::{AppQuery, Candidate, Platform};
use regex::Regex;

use crate::{FetchError, StoreClient};

static CANDIDATE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/store/apps/details\?id=([a-zA-Z0-9_.]+)").expect("static regex"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""name":"([^"]+)""#).expect("static regex"));
static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""applicationCategory":"([^"]+)""#).expect("static regex"));
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""description":"([^"]+)""#).expect("static regex"));
static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""author":\s*\{[^}]*?"name":"([^"]+)""#).expect("static regex"));
static RATING_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""ratingCount":"(\d+)""#).expect("static regex"));

/// Install badge extraction strategies, ordered by reliability.
static INSTALL_BADGE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // "10M+ Downloads" badge text
        Regex::new(r"(?i)([0-9,.]+[MkK]?)\+\s*Downloads").expect("static regex"),
        // "10,000,000+" as a JSON string with thousands separators
        Regex::new(r#""([0-9]{1,3}(?:,[0-9]{3})*\+)""#).expect("static regex"),
        // "10M+" or "5B+" as a JSON string with a magnitude suffix
        Regex::new(r#""([0-9,.]+[MkB]\+)""#).expect("static regex"),
    ]
});

/// Play store client configuration.
#[derive(Debug, Clone)]
pub struct PlayStoreConfig {
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Candidate ids collected per search page
    pub max_candidates: usize,
}

impl Default for PlayStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://play.google.com".to_string(),
            timeout_secs: 10,
            max_candidates: 5,
        }
    }
}

/// Google Play store client.
pub struct PlayStoreClient {
    config: PlayStoreConfig,
    client: reqwest::Client,
}

impl PlayStoreClient {
    pub fn new(config: PlayStoreConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    async fn fetch_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let response = self.client.get(url).query(query).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// One search page fetch: returns candidate ids in page order.
    async fn search_ids(&self, term: &str) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/store/search", self.config.base_url);
        let payload = self.fetch_text(&url, &[("q", term), ("c", "apps")]).await?;
        let ids = parse_candidate_ids(&payload, self.config.max_candidates);
        tracing::debug!(term = %term, count = ids.len(), "play search candidates");
        Ok(ids)
    }

    /// Check the search endpoint answers at all.
    pub async fn health_check(&self) -> Result<(), FetchError> {
        let url = format!("{}/store/search", self.config.base_url);
        self.fetch_text(&url, &[("q", "test"), ("c", "apps")])
            .await
            .map(|_| ())
    }
}

impl StoreClient for PlayStoreClient {
    async fn search(&self, query: &AppQuery) -> Result<Vec<Candidate>, FetchError> {
        let mut ids = self.search_ids(&query.name).await?;

        // Generic names often miss the right listing in the top results;
        // a second search augmented with tagline keywords widens the net.
        if let Some(tagline) = &query.tagline {
            let keywords = tagline_keywords(tagline, 4);
            if !keywords.is_empty() {
                let augmented = format!("{} {}", query.name, keywords);
                match self.search_ids(&augmented).await {
                    Ok(extra) => {
                        for id in extra {
                            if !ids.contains(&id) {
                                ids.push(id);
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "augmented play search failed, using primary results");
                    }
                }
            }
        }

        let mut candidates = Vec::new();
        for id in ids {
            match self.fetch_details(&id).await {
                Ok(candidate) => candidates.push(candidate),
                Err(err) => {
                    tracing::warn!(candidate = %id, error = %err, "skipping play candidate");
                }
            }
        }

        Ok(candidates)
    }

    async fn fetch_details(&self, candidate_id: &str) -> Result<Candidate, FetchError> {
        let url = format!("{}/store/apps/details", self.config.base_url);
        let payload = self
            .fetch_text(&url, &[("id", candidate_id), ("hl", "en_US"), ("gl", "US")])
            .await?;
        parse_details(candidate_id, &payload)
    }

    fn platform(&self) -> Platform {
        Platform::Play
    }
}

/// Extract unique listing ids from a search payload, in page order.
pub fn parse_candidate_ids(payload: &str, cap: usize) -> Vec<String> {
    let mut ids = Vec::new();
    for captures in CANDIDATE_ID_RE.captures_iter(payload) {
        let id = captures[1].to_string();
        if !ids.contains(&id) {
            ids.push(id);
            if ids.len() >= cap {
                break;
            }
        }
    }
    ids
}

/// Convert a Play category code like `MUSIC_AND_AUDIO` to the display form
/// `Music & Audio` used by the category table.
pub fn normalize_play_category(code: &str) -> String {
    let spaced = code.to_lowercase().replace('_', " ");
    let joined = spaced
        .split_whitespace()
        .map(|w| if w == "and" { "&" } else { w })
        .collect::<Vec<_>>()
        .join(" ");

    joined
        .split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse an install badge string ("10,000,000+", "10M+", "5B+") into a
/// number. Unparseable input yields 0, which downstream treats as no floor.
pub fn parse_install_count(raw: &str) -> u64 {
    let cleaned = raw
        .to_lowercase()
        .replace([',', '+', '>', '<'], "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return 0;
    }

    let (digits, scale) = if let Some(stripped) = cleaned.strip_suffix('b') {
        (stripped.to_string(), 1_000_000_000.0)
    } else if let Some(stripped) = cleaned.strip_suffix('m') {
        (stripped.to_string(), 1_000_000.0)
    } else if let Some(stripped) = cleaned.strip_suffix('k') {
        (stripped.to_string(), 1_000.0)
    } else {
        (cleaned, 1.0)
    };

    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => (value * scale).floor() as u64,
        _ => 0,
    }
}

/// Extract a fully populated candidate from a Play detail payload.
pub fn parse_details(candidate_id: &str, payload: &str) -> Result<Candidate, FetchError> {
    let title = NAME_RE
        .captures(payload)
        .map(|c| c[1].to_string())
        .ok_or_else(|| FetchError::Parse(format!("no listing name for {candidate_id}")))?;

    let category = CATEGORY_RE
        .captures(payload)
        .map(|c| normalize_play_category(&c[1]));

    let description = DESCRIPTION_RE
        .captures(payload)
        .map(|c| c[1].replace("\\u0027", "'"))
        .unwrap_or_default();

    let developer = AUTHOR_RE
        .captures(payload)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let rating_count = RATING_COUNT_RE
        .captures(payload)
        .and_then(|c| c[1].parse::<u64>().ok())
        .unwrap_or(0);

    let install_floor = INSTALL_BADGE_RES
        .iter()
        .find_map(|re| re.captures(payload))
        .map(|c| parse_install_count(&c[1]))
        .filter(|&floor| floor > 0);

    Ok(Candidate {
        id: candidate_id.to_string(),
        title,
        category,
        description,
        developer,
        rating_count,
        install_floor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SEARCH_PAYLOAD: &str = r#"
        <a href="/store/apps/details?id=com.binance.dev">Binance</a>
        <a href="/store/apps/details?id=com.binance.dev">Binance again</a>
        <a href="/store/apps/details?id=com.coinbase.android">Coinbase</a>
        <a href="/store/apps/details?id=org.toshi">Other</a>
        <a href="/store/apps/details?id=com.kraken.invest.app">Kraken</a>
        <a href="/store/apps/details?id=com.crypto.one">One</a>
        <a href="/store/apps/details?id=com.crypto.two">Two</a>
    "#;

    #[test]
    fn test_parse_candidate_ids_dedup_and_cap() {
        let ids = parse_candidate_ids(SEARCH_PAYLOAD, 5);
        assert_eq!(
            ids,
            vec![
                "com.binance.dev",
                "com.coinbase.android",
                "org.toshi",
                "com.kraken.invest.app",
                "com.crypto.one",
            ]
        );
    }

    #[test]
    fn test_normalize_play_category() {
        assert_eq!(normalize_play_category("MUSIC_AND_AUDIO"), "Music & Audio");
        assert_eq!(normalize_play_category("FINANCE"), "Finance");
        assert_eq!(
            normalize_play_category("MAPS_AND_NAVIGATION"),
            "Maps & Navigation"
        );
    }

    #[test]
    fn test_parse_install_count() {
        assert_eq!(parse_install_count("10,000,000+"), 10_000_000);
        assert_eq!(parse_install_count("10M+"), 10_000_000);
        assert_eq!(parse_install_count("500k"), 500_000);
        assert_eq!(parse_install_count("5B+"), 5_000_000_000);
        assert_eq!(parse_install_count("1.5M+"), 1_500_000);
        assert_eq!(parse_install_count("garbage"), 0);
        assert_eq!(parse_install_count(""), 0);
    }

    #[test]
    fn test_parse_details() {
        let payload = r#"
            {"name":"Binance.US: Buy Bitcoin","applicationCategory":"FINANCE",
             "description":"Binance.US is America's home for crypto trading.",
             "author": {"@type":"Organization","name":"Binance.US"},
             "aggregateRating":{"ratingCount":"128345"}}
            <div>10M+ Downloads</div>
        "#;
        let candidate = parse_details("com.binance.us", payload).unwrap();

        assert_eq!(candidate.id, "com.binance.us");
        assert_eq!(candidate.title, "Binance.US: Buy Bitcoin");
        assert_eq!(candidate.category.as_deref(), Some("Finance"));
        assert!(candidate.description.contains("America's home"));
        assert_eq!(candidate.developer, "Binance.US");
        assert_eq!(candidate.rating_count, 128_345);
        assert_eq!(candidate.install_floor, Some(10_000_000));
    }

    #[test]
    fn test_parse_details_missing_name_is_error() {
        let result = parse_details("com.x", "<html>nothing useful</html>");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_parse_details_tolerates_missing_fields() {
        let payload = r#"{"name":"Tiny App"}"#;
        let candidate = parse_details("com.tiny", payload).unwrap();
        assert_eq!(candidate.title, "Tiny App");
        assert!(candidate.category.is_none());
        assert_eq!(candidate.rating_count, 0);
        assert!(candidate.install_floor.is_none());
    }
}
