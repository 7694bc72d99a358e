// Trait abstractions for the pipeline's external collaborators.
//
// ContentFetcher: page retrieval and discovery search, backed by Archive.
// RedemptionAuthority: the authoritative code check, backed by RedeemClient.
//
// Both are swapped for MockFetcher / MockAuthority in tests: no network.

use anyhow::Result;
use async_trait::async_trait;

use codeharvest_archive::{Archive, SearchResult};
use redeem_client::{RedeemClient, Redemption};

// ---------------------------------------------------------------------------
// ContentFetcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Raw markup of a page. Every failure kind is an `Err`.
    async fn page(&self, url: &str) -> Result<String>;

    /// Discovery search, at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}

#[async_trait]
impl ContentFetcher for Archive {
    async fn page(&self, url: &str) -> Result<String> {
        Ok(Archive::page(self, url).await?)
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        Ok(Archive::search(self, query, max_results).await?)
    }
}

// ---------------------------------------------------------------------------
// RedemptionAuthority
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RedemptionAuthority: Send + Sync {
    /// Submit a code. `Err` means the authority could not be asked
    /// (network, rate limit, server error), not that the code is bad.
    async fn submit(&self, code: &str) -> Result<Redemption>;
}

#[async_trait]
impl RedemptionAuthority for RedeemClient {
    async fn submit(&self, code: &str) -> Result<Redemption> {
        Ok(RedeemClient::submit(self, code).await?)
    }
}
