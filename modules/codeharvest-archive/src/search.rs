// Discovery search backends. Serper when an API key is configured,
// otherwise the public Google HTML results page.

use serde::Deserialize;
use tracing::info;

use crate::error::{ArchiveError, Result};
use crate::fetcher::PageFetcher;
use crate::links::search_result_links;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
}

pub enum SearchBackend {
    Serper(SerperSearcher),
    GoogleHtml(GoogleHtmlSearcher),
}

impl SearchBackend {
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        match self {
            SearchBackend::Serper(s) => s.search(query, max_results).await,
            SearchBackend::GoogleHtml(s) => s.search(query, max_results).await,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SearchBackend::Serper(_) => "serper",
            SearchBackend::GoogleHtml(_) => "google-html",
        }
    }
}

// --- Serper (Google Search API) ---

pub struct SerperSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
}

impl SerperSearcher {
    pub fn new(api_key: &str, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            client,
        }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        info!(query, max_results, "Serper search");

        let failed = |reason: String| ArchiveError::SearchFailed {
            query: query.to_string(),
            reason,
        };

        let body = serde_json::json!({
            "q": query,
            "num": max_results,
        });

        let resp = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(failed(format!("status {}", resp.status().as_u16())));
        }

        let data: SerperResponse = resp.json().await.map_err(|e| failed(e.to_string()))?;

        let results: Vec<SearchResult> = data
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .take(max_results)
            .map(|r| SearchResult {
                url: r.link,
                title: r.title,
            })
            .collect();

        info!(query, count = results.len(), "Serper search complete");
        Ok(results)
    }
}

// --- Google HTML results page ---

pub struct GoogleHtmlSearcher {
    pages: PageFetcher,
}

impl GoogleHtmlSearcher {
    pub fn new(pages: PageFetcher) -> Self {
        Self { pages }
    }

    pub fn results_url(query: &str, max_results: usize) -> String {
        let q: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("https://www.google.com/search?q={q}&num={}&hl=en", max_results.max(5))
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        info!(query, max_results, "Google HTML search");

        let html = self
            .pages
            .fetch(&Self::results_url(query, max_results))
            .await
            .map_err(|e| ArchiveError::SearchFailed {
                query: query.to_string(),
                reason: e.to_string(),
            })?;

        let results: Vec<SearchResult> = search_result_links(&html, max_results)
            .into_iter()
            .map(|url| SearchResult {
                url,
                title: String::new(),
            })
            .collect();

        info!(query, count = results.len(), "Google HTML search complete");
        Ok(results)
    }
}
