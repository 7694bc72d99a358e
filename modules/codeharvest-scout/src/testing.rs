//! Test doubles for the pipeline's collaborators. Built with chained
//! `on_*` calls; anything not registered fails the way a dead site would.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use codeharvest_archive::SearchResult;
use redeem_client::Redemption;

use crate::traits::{ContentFetcher, RedemptionAuthority};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// HashMap-based fetcher. Unregistered pages are `Err`; unregistered
/// searches return no results.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    searches: HashMap<String, Vec<SearchResult>>,
    delays: HashMap<String, Duration>,
    page_calls: Mutex<Vec<String>>,
    search_calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }

    /// Like `on_page`, but the answer arrives after `delay`.
    pub fn on_slow_page(mut self, url: &str, markup: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self.on_page(url, markup)
    }

    pub fn on_search(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.searches.insert(query.to_string(), results);
        self
    }

    /// Every `page` call so far, in call order.
    pub fn page_calls(&self) -> Vec<String> {
        self.page_calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn page(&self, url: &str) -> Result<String> {
        self.page_calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockFetcher: no page registered for {url}"))
    }

    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        self.search_calls.lock().unwrap().push(query.to_string());
        Ok(self.searches.get(query).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockAuthority
// ---------------------------------------------------------------------------

/// Accepts every code unless told otherwise.
#[derive(Default)]
pub struct MockAuthority {
    rejected: HashMap<String, String>,
    unreachable: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `code` with a 400 and `body`.
    pub fn reject(mut self, code: &str, body: &str) -> Self {
        self.rejected.insert(code.to_string(), body.to_string());
        self
    }

    /// Fail submissions of `code` as if the endpoint were down.
    pub fn unreachable(mut self, code: &str) -> Self {
        self.unreachable.insert(code.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RedemptionAuthority for MockAuthority {
    async fn submit(&self, code: &str) -> Result<Redemption> {
        self.calls.lock().unwrap().push(code.to_string());
        if self.unreachable.contains(code) {
            anyhow::bail!("MockAuthority: {code} unreachable");
        }
        Ok(match self.rejected.get(code) {
            Some(body) => Redemption {
                status: 400,
                body: body.clone(),
            },
            None => Redemption {
                status: 200,
                body: r#"{"success":true}"#.to_string(),
            },
        })
    }
}
