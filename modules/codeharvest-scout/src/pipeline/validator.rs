//! Optional authoritative check of codes for platform-wide games.
//!
//! Verdicts are tri-state. Only a response carrying a negative marker makes a
//! code Invalid; an authority that cannot be asked yields Unknown, and
//! [`admits`] lets Unknown through.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use codeharvest_common::config::ValidationConfig;
use codeharvest_common::game_key;
use redeem_client::Redemption;

use crate::traits::RedemptionAuthority;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    Unknown,
}

/// Admission policy for a verdict.
pub fn admits(verdict: Verdict) -> bool {
    match verdict {
        Verdict::Valid | Verdict::Unknown => true,
        Verdict::Invalid => false,
    }
}

pub struct Validator {
    authority: Arc<dyn RedemptionAuthority>,
    pacing: Duration,
    markers: Vec<String>,
}

impl Validator {
    pub fn new(authority: Arc<dyn RedemptionAuthority>, pacing: Duration, markers: &[String]) -> Self {
        Self {
            authority,
            pacing,
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    pub fn from_config(authority: Arc<dyn RedemptionAuthority>, config: &ValidationConfig) -> Self {
        Self::new(
            authority,
            Duration::from_millis(config.pacing_ms),
            &config.negative_markers,
        )
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    pub fn classify(&self, redemption: &Redemption) -> Verdict {
        let body = redemption.body.to_lowercase();
        if self.markers.iter().any(|m| body.contains(m.as_str())) {
            Verdict::Invalid
        } else {
            Verdict::Valid
        }
    }

    pub async fn check(&self, code: &str) -> Verdict {
        match self.authority.submit(code).await {
            Ok(redemption) => {
                let verdict = self.classify(&redemption);
                debug!(code, status = redemption.status, ?verdict, "Redemption checked");
                verdict
            }
            Err(e) => {
                warn!(code, error = %e, "Redemption check indeterminate");
                Verdict::Unknown
            }
        }
    }

    /// Check `codes` one at a time, waiting `pacing` between submissions.
    pub async fn check_all(&self, codes: &[String]) -> Vec<(String, Verdict)> {
        let mut verdicts = Vec::with_capacity(codes.len());
        for (i, code) in codes.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            verdicts.push((code.clone(), self.check(code).await));
        }
        verdicts
    }
}

/// Which games have their codes validated.
#[derive(Debug, Clone, Default)]
pub struct ValidationScope {
    global: HashSet<String>,
}

impl ValidationScope {
    pub fn new<I, S>(games: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            global: games.into_iter().map(|g| game_key(g.as_ref())).collect(),
        }
    }

    pub fn applies_to(&self, game: &str) -> bool {
        self.global.contains(&game_key(game))
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty()
    }
}
