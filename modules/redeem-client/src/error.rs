use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedeemError>;

#[derive(Debug, Error)]
pub enum RedeemError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited by redemption endpoint")]
    RateLimited,

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },
}

impl From<reqwest::Error> for RedeemError {
    fn from(err: reqwest::Error) -> Self {
        RedeemError::Network(err.to_string())
    }
}
