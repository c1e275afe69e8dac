//! Apple App Store client.
//!
//! Search and per-listing detail come from the public lookup JSON API,
//! which also serves per-country storefronts for the rating aggregator.
//! Review timestamps for the growth signal come from the most-recent
//! customer reviews feed.

use appgauge_model::{AppQuery, Candidate, Platform, RegionalRatingSample};
use serde_json::Value;

use crate::{FetchError, RegionalSource, StoreClient};

/// App Store client configuration.
#[derive(Debug, Clone)]
pub struct AppStoreConfig {
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Search result cap
    pub limit: usize,
}

impl Default for AppStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://itunes.apple.com".to_string(),
            timeout_secs: 10,
            limit: 5,
        }
    }
}

/// Apple App Store client.
#[derive(Clone)]
pub struct AppStoreClient {
    config: AppStoreConfig,
    client: reqwest::Client,
}

impl AppStoreClient {
    pub fn new(config: AppStoreConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    async fn fetch_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
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
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Timestamps (ISO-8601) of the most recent reviews, newest first.
    pub async fn fetch_review_timestamps(&self, app_id: &str) -> Result<Vec<String>, FetchError> {
        let url = format!(
            "{}/us/rss/customerreviews/id={}/sortBy=mostRecent/json",
            self.config.base_url, app_id
        );
        let json = self.fetch_json(&url, &[]).await?;
        Ok(parse_review_feed(&json))
    }

    pub async fn health_check(&self) -> Result<(), FetchError> {
        let url = format!("{}/search", self.config.base_url);
        self.fetch_json(&url, &[("term", "app"), ("entity", "software"), ("limit", "1")])
            .await
            .map(|_| ())
    }
}

impl StoreClient for AppStoreClient {
    async fn search(&self, query: &AppQuery) -> Result<Vec<Candidate>, FetchError> {
        let url = format!("{}/search", self.config.base_url);
        let limit = self.config.limit.to_string();
        let json = self
            .fetch_json(
                &url,
                &[
                    ("term", query.name.as_str()),
                    ("entity", "software"),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        let candidates = parse_search_results(&json);
        tracing::debug!(term = %query.name, count = candidates.len(), "app store search candidates");
        Ok(candidates)
    }

    async fn fetch_details(&self, candidate_id: &str) -> Result<Candidate, FetchError> {
        let url = format!("{}/lookup", self.config.base_url);
        let json = self.fetch_json(&url, &[("id", candidate_id)]).await?;
        parse_search_results(&json)
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Parse(format!("no listing for id {candidate_id}")))
    }

    fn platform(&self) -> Platform {
        Platform::AppStore
    }
}

impl RegionalSource for AppStoreClient {
    async fn fetch_region(
        &self,
        app_id: &str,
        region: &str,
    ) -> Result<Option<RegionalRatingSample>, FetchError> {
        let url = format!("{}/lookup", self.config.base_url);
        let json = self
            .fetch_json(&url, &[("id", app_id), ("country", region)])
            .await?;
        Ok(parse_regional_sample(&json, region))
    }
}

fn candidate_from_result(result: &Value) -> Option<Candidate> {
    let id = match result.get("trackId") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return None,
    };
    let title = result.get("trackName")?.as_str()?.to_string();

    Some(Candidate {
        id,
        title,
        category: result
            .get("primaryGenreName")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        description: result
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        developer: result
            .get("artistName")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        rating_count: result
            .get("userRatingCount")
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        install_floor: None,
    })
}

/// Parse a search/lookup response into candidates, skipping malformed rows.
pub fn parse_search_results(json: &Value) -> Vec<Candidate> {
    json.get("results")
        .and_then(|r| r.as_array())
        .map(|results| results.iter().filter_map(candidate_from_result).collect())
        .unwrap_or_default()
}

/// Parse a per-country lookup into a regional sample. `None` means the app
/// is not listed in that storefront.
pub fn parse_regional_sample(json: &Value, region: &str) -> Option<RegionalRatingSample> {
    let results = json.get("results")?.as_array()?;
    let first = results.first()?;

    Some(RegionalRatingSample {
        region: region.to_string(),
        rating_count: first
            .get("userRatingCount")
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        average_rating: first
            .get("averageUserRating")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
    })
}

/// Pull review timestamps out of the reviews feed. The feed serves `entry`
/// as an array normally but as a single object when only one review exists.
pub fn parse_review_feed(json: &Value) -> Vec<String> {
    let Some(entry) = json.get("feed").and_then(|f| f.get("entry")) else {
        return Vec::new();
    };

    let entries: Vec<&Value> = match entry {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    entries
        .into_iter()
        .filter_map(|e| e.get("updated")?.get("label")?.as_str())
        .map(|s| s.to_string())
        .collect()
}
