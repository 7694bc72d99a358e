// Plain HTTP page fetcher. One GET per call, no retries: a failed
// fetch is reported and the caller moves on.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ArchiveError, Result};

#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ArchiveError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// GET `url` and return the body. Anything but 200 is an error.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url).map_err(|e| ArchiveError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ArchiveError::InvalidUrl {
                url: url.to_string(),
                reason: format!("only http/https URLs are allowed, got: {}", parsed.scheme()),
            });
        }

        info!(url, fetcher = "http", "Fetching page");

        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ArchiveError::from_reqwest(url, e))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            warn!(url, status = status.as_u16(), "Non-200 response");
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ArchiveError::from_reqwest(url, e))?;

        info!(url, fetcher = "http", bytes = body.len(), "Fetched successfully");
        Ok(body)
    }
}
