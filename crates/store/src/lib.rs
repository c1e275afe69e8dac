//! Store clients: search and detail payloads from the app store platforms.
//!
//! Provides the `StoreClient` trait plus its Play and App Store
//! implementations. Network failures surface as a single `FetchError`
//! variant set; callers branch on the variant instead of catching ad hoc
//! exceptions, and a missing listing is never an error (empty result list
//! or `Ok(None)`).

use std::future::Future;

use appgauge_model::{AppQuery, Candidate, Platform, RegionalRatingSample};
use thiserror::Error;

pub mod appstore;
pub mod play;

pub use appstore::{AppStoreClient, AppStoreConfig};
pub use play::{PlayStoreClient, PlayStoreConfig};

/// Errors from store fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Trait for per-platform store clients.
///
/// `search` returns a bounded, best-effort list of fully populated
/// candidates; `fetch_details` re-fetches one listing by id.
pub trait StoreClient {
    fn search(
        &self,
        query: &AppQuery,
    ) -> impl Future<Output = Result<Vec<Candidate>, FetchError>> + Send;

    fn fetch_details(
        &self,
        candidate_id: &str,
    ) -> impl Future<Output = Result<Candidate, FetchError>> + Send;

    fn platform(&self) -> Platform;
}

/// Per-region rating lookup, consumed by the rating aggregator.
///
/// `Ok(None)` means the app is not listed in that regional storefront.
pub trait RegionalSource {
    fn fetch_region(
        &self,
        app_id: &str,
        region: &str,
    ) -> impl Future<Output = Result<Option<RegionalRatingSample>, FetchError>> + Send;
}
