/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Search failed for {query:?}: {reason}")]
    SearchFailed { query: String, reason: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl ArchiveError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ArchiveError::Timeout {
                url: url.to_string(),
            }
        } else {
            ArchiveError::FetchFailed {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}
