//! Regional rating aggregation.
//!
//! The App Store only exposes per-country rating counts, so the global
//! count is estimated by sampling storefronts in priority order and summing
//! their counts, with an early-stop heuristic once marginal regions stop
//! contributing. Per-region samples and the final aggregate are cached
//! under separate TTLs, and concurrent aggregations for the same app share
//! one in-flight run.

use std::time::Duration;

use appgauge_cache::{get_typed, set_typed, Cache, SingleFlight};
use appgauge_model::{AggregatedRating, RegionalRatingSample};
use appgauge_store::RegionalSource;

/// Storefronts in priority order: high-volume English and European regions
/// first, then Asia and the remaining tiers.
pub const REGIONS: &[&str] = &[
    "us", "gb", "ca", "au", "de", "fr", "it", "es", "pt", "pl", "br", "mx", "in", "pk", "jp",
    "kr", "cn", "tw", "sg", "ru",
];

/// Aggregation policy knobs.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Hard cap on regions sampled per run
    pub max_regions: usize,
    /// Contributing regions required before the early-stop rule applies
    pub min_regions_before_stop: usize,
    /// Trailing contributions inspected by the early-stop rule
    pub stop_window: usize,
    /// Early stop once the trailing window contributes less than this
    /// fraction of the running total
    pub early_stop_ratio: f64,
    /// Per-region fetch timeout
    pub region_timeout: Duration,
    /// TTL for per-region samples (raw counts change slowly)
    pub sample_ttl: Duration,
    /// TTL for the aggregate (policy may evolve faster than raw counts)
    pub aggregate_ttl: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_regions: 15,
            min_regions_before_stop: 5,
            stop_window: 3,
            early_stop_ratio: 0.03,
            region_timeout: Duration::from_secs(3),
            sample_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            aggregate_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

fn sample_key(app_id: &str, region: &str) -> String {
    format!("app_ratings:{app_id}:{region}")
}

fn aggregate_key(app_id: &str) -> String {
    format!("app_ratings_agg_v1:{app_id}")
}

/// Aggregates regional rating samples into a global estimate.
pub struct Aggregator<C, S> {
    cache: C,
    source: S,
    config: AggregatorConfig,
    flights: SingleFlight<AggregatedRating>,
}

impl<C: Cache, S: RegionalSource> Aggregator<C, S> {
    pub fn new(cache: C, source: S, config: AggregatorConfig) -> Self {
        Self {
            cache,
            source,
            config,
            flights: SingleFlight::new(),
        }
    }

    /// Estimate the global rating count for one listing id. Never fails:
    /// regions that error or time out are skipped, and an app with no
    /// reachable storefront data aggregates to zero.
    pub async fn aggregate(&self, app_id: &str) -> AggregatedRating {
        self.flights
            .run(app_id, || self.aggregate_inner(app_id))
            .await
    }

    async fn aggregate_inner(&self, app_id: &str) -> AggregatedRating {
        let agg_key = aggregate_key(app_id);
        if let Some(cached) = get_typed::<_, AggregatedRating>(&self.cache, &agg_key).await {
            tracing::debug!(app_id = %app_id, "aggregate cache hit");
            return cached;
        }

        let mut total: u64 = 0;
        let mut weighted_sum: f64 = 0.0;
        let mut regions_used: Vec<String> = Vec::new();
        let mut history: Vec<u64> = Vec::new();
        let mut processed = 0usize;

        for region in REGIONS {
            if processed >= self.config.max_regions {
                tracing::debug!(app_id = %app_id, "stop: region cap reached");
                break;
            }

            // Early stop: enough regions contributed and the last few added
            // almost nothing, so further storefronts are not worth latency.
            if regions_used.len() >= self.config.min_regions_before_stop
                && history.len() >= self.config.stop_window
                && total > 0
            {
                let trailing: u64 = history[history.len() - self.config.stop_window..]
                    .iter()
                    .sum();
                let ratio = trailing as f64 / total as f64;
                if ratio < self.config.early_stop_ratio {
                    tracing::debug!(
                        app_id = %app_id,
                        ratio,
                        "stop: trailing regions below contribution threshold"
                    );
                    break;
                }
            }

            let sample = self.region_sample(app_id, region).await;

            if let Some(sample) = sample {
                processed += 1;
                if sample.rating_count > 0 {
                    total += sample.rating_count;
                    weighted_sum += sample.average_rating * sample.rating_count as f64;
                    history.push(sample.rating_count);
                    regions_used.push(region.to_string());
                    tracing::debug!(
                        app_id = %app_id,
                        region = %region,
                        count = sample.rating_count,
                        total,
                        "region contributed"
                    );
                }
            }
        }

        let weighted_average = if total > 0 {
            weighted_sum / total as f64
        } else {
            0.0
        };

        let result = AggregatedRating {
            total_estimated: total,
            weighted_average,
            regions_used,
        };

        set_typed(&self.cache, &agg_key, &result, self.config.aggregate_ttl).await;
        result
    }

    /// One region's sample, from cache or a timed network fetch. A timeout
    /// or fetch error skips the region without failing the aggregation.
    async fn region_sample(&self, app_id: &str, region: &str) -> Option<RegionalRatingSample> {
        let key = sample_key(app_id, region);
        if let Some(cached) = get_typed::<_, RegionalRatingSample>(&self.cache, &key).await {
            return Some(cached);
        }

        let fetch = self.source.fetch_region(app_id, region);
        match tokio::time::timeout(self.config.region_timeout, fetch).await {
            Ok(Ok(Some(sample))) => {
                set_typed(&self.cache, &key, &sample, self.config.sample_ttl).await;
                Some(sample)
            }
            Ok(Ok(None)) => {
                tracing::debug!(app_id = %app_id, region = %region, "not listed in storefront");
                None
            }
            Ok(Err(err)) => {
                tracing::warn!(app_id = %app_id, region = %region, error = %err, "region fetch failed, skipping");
                None
            }
            Err(_) => {
                tracing::warn!(app_id = %app_id, region = %region, "region fetch timed out, skipping");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appgauge_cache::MemoryCache;
    use appgauge_store::FetchError;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted regional source: fixed counts per region, optional failures.
    struct FakeSource {
        counts: HashMap<&'static str, u64>,
        failing: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(counts: &[(&'static str, u64)]) -> Self {
            Self {
                counts: counts.iter().copied().collect(),
                failing: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RegionalSource for &FakeSource {
        async fn fetch_region(
            &self,
            _app_id: &str,
            region: &str,
        ) -> Result<Option<RegionalRatingSample>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&region) {
                return Err(FetchError::Connection("boom".to_string()));
            }
            Ok(self.counts.get(region).map(|&count| RegionalRatingSample {
                region: region.to_string(),
                rating_count: count,
                average_rating: 4.0,
            }))
        }
    }

    fn config() -> AggregatorConfig {
        AggregatorConfig {
            region_timeout: Duration::from_millis(100),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sums_regions_and_weighted_average() {
        let source = FakeSource::new(&[("us", 1000), ("gb", 500), ("ca", 0)]);
        let aggregator = Aggregator::new(MemoryCache::new(), &source, config());

        let result = aggregator.aggregate("42").await;
        assert_eq!(result.total_estimated, 1500);
        assert_eq!(result.regions_used, vec!["us", "gb"]);
        assert!((result.weighted_average - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_early_stop_after_marginal_regions() {
        // Five big contributors, then regions too small to matter.
        let source = FakeSource::new(&[
            ("us", 100_000),
            ("gb", 50_000),
            ("ca", 30_000),
            ("au", 20_000),
            ("de", 10_000),
            ("fr", 10),
            ("it", 10),
            ("es", 10),
            ("pt", 10),
            ("pl", 10),
            ("br", 10),
        ]);
        let aggregator = Aggregator::new(MemoryCache::new(), &source, config());

        let result = aggregator.aggregate("42").await;
        // Stops once the trailing three contributions fall under 3%:
        // after fr/it/es the window is 30 / 210_030.
        assert_eq!(
            result.regions_used,
            vec!["us", "gb", "ca", "au", "de", "fr", "it", "es"]
        );
        assert_eq!(result.total_estimated, 210_030);
    }

    #[tokio::test]
    async fn test_failing_region_is_skipped_not_fatal() {
        let mut source = FakeSource::new(&[("us", 1000), ("ca", 200)]);
        source.failing.push("gb");
        let aggregator = Aggregator::new(MemoryCache::new(), &source, config());

        let result = aggregator.aggregate("42").await;
        assert_eq!(result.total_estimated, 1200);
        assert_eq!(result.regions_used, vec!["us", "ca"]);
    }

    #[tokio::test]
    async fn test_region_cap() {
        // Every region contributes heavily, so the early-stop rule never
        // fires and only the hard cap ends the run.
        let counts: Vec<(&'static str, u64)> = REGIONS.iter().map(|&r| (r, 10_000)).collect();
        let source = FakeSource::new(&counts);
        let aggregator = Aggregator::new(MemoryCache::new(), &source, config());

        let result = aggregator.aggregate("42").await;
        assert_eq!(result.regions_used.len(), 15);
        assert_eq!(result.total_estimated, 150_000);
    }

    #[tokio::test]
    async fn test_aggregate_cache_prevents_refetch() {
        let source = FakeSource::new(&[("us", 1000)]);
        let aggregator = Aggregator::new(MemoryCache::new(), &source, config());

        let first = aggregator.aggregate("42").await;
        let calls_after_first = source.calls.load(Ordering::SeqCst);
        // Single-flight caches the result too; force a fresh run so the hit
        // comes from the TTL cache.
        aggregator.flights.forget("42").await;
        let second = aggregator.aggregate("42").await;

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn test_no_data_aggregates_to_zero() {
        let source = FakeSource::new(&[]);
        let aggregator = Aggregator::new(MemoryCache::new(), &source, config());

        let result = aggregator.aggregate("42").await;
        assert_eq!(result.total_estimated, 0);
        assert!(result.regions_used.is_empty());
        assert_eq!(result.weighted_average, 0.0);
    }
}
