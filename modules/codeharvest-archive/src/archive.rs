// Archive: the single entry point for getting content off the web.
// Callers ask for a page or a discovery search; which concrete backend
// answers is decided once, at construction.

use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::search::{GoogleHtmlSearcher, SearchBackend, SearchResult, SerperSearcher};

/// Configuration for which concrete fetchers to use.
pub struct ArchiveConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub serper_api_key: Option<String>,
}

pub struct Archive {
    pages: PageFetcher,
    search: SearchBackend,
}

impl Archive {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        let pages = PageFetcher::new(&config.user_agent, config.timeout)?;

        let search = match config.serper_api_key {
            Some(ref key) => {
                let client = reqwest::Client::builder()
                    .timeout(config.timeout)
                    .build()
                    .map_err(|e| crate::error::ArchiveError::Client(e.to_string()))?;
                SearchBackend::Serper(SerperSearcher::new(key, client))
            }
            None => SearchBackend::GoogleHtml(GoogleHtmlSearcher::new(pages.clone())),
        };

        info!(search = search.name(), "Archive initialized");
        Ok(Self { pages, search })
    }

    /// Fetch a page's raw markup.
    pub async fn page(&self, url: &str) -> Result<String> {
        self.pages.fetch(url).await
    }

    /// Run a discovery search, returning at most `max_results` hits.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        self.search.search(query, max_results).await
    }

    pub fn search_backend(&self) -> &str {
        self.search.name()
    }
}
