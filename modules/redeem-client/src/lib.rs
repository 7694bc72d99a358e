pub mod error;

pub use error::{RedeemError, Result};

use std::time::Duration;

use tracing::debug;

/// Raw answer from the redemption endpoint. Client errors (4xx) are answers
/// too: the body usually says why the code was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    pub status: u16,
    pub body: String,
}

pub struct RedeemClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RedeemClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/redeem", self.base_url)
    }

    /// Submit a code via the `/redeem` endpoint.
    ///
    /// 429 becomes [`RedeemError::RateLimited`] and 5xx becomes
    /// [`RedeemError::Server`]; everything else is returned as-is.
    pub async fn submit(&self, code: &str) -> Result<Redemption> {
        let body = serde_json::json!({ "code": code });

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RedeemError::RateLimited);
        }
        if status.is_server_error() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RedeemError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        debug!(code, status = status.as_u16(), bytes = text.len(), "Redemption answered");

        Ok(Redemption {
            status: status.as_u16(),
            body: text,
        })
    }
}
