//! Running one tier of a game's plan: fetch → sanitize → extract → normalize.
//!
//! Pages are cached per game in [`GamePages`] so a later tier never refetches
//! what an earlier one already tried, failures included.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::future::join_all;
use tracing::{debug, warn};

use codeharvest_archive::{strip_expired_markup, visible_text};
use codeharvest_common::Tier;

use super::extractor::CandidatePattern;
use super::normalizer::Normalizer;
use super::resolver::TierPlan;
use super::state::SourceFailure;
use crate::traits::ContentFetcher;

/// Per-game page cache. `None` marks a locator whose fetch failed.
#[derive(Debug, Default)]
pub struct GamePages {
    pages: HashMap<String, Option<String>>,
    discovered: Vec<String>,
}

impl GamePages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links found by the discovery search, in result order.
    pub fn discovered(&self) -> &[String] {
        &self.discovered
    }

    pub fn fetched(&self) -> usize {
        self.pages.len()
    }

    fn discover(&mut self, url: String) {
        if !self.discovered.contains(&url) {
            self.discovered.push(url);
        }
    }
}

/// What one tier produced for one game.
#[derive(Debug, Clone)]
pub struct TierOutcome {
    pub tier: Tier,
    /// Normalized, unique within the game, in discovery order.
    pub codes: Vec<String>,
    pub candidates: u32,
    pub rejected: u32,
    pub failures: Vec<SourceFailure>,
}

impl TierOutcome {
    fn new(tier: Tier) -> Self {
        Self {
            tier,
            codes: Vec::new(),
            candidates: 0,
            rejected: 0,
            failures: Vec::new(),
        }
    }

    fn absorb(&mut self, candidates: impl Iterator<Item = String>, normalizer: &Normalizer) {
        let mut seen: HashSet<String> = self.codes.iter().cloned().collect();
        for raw in candidates {
            self.candidates += 1;
            match normalizer.normalize(&raw) {
                Some(code) => {
                    if seen.insert(code.clone()) {
                        self.codes.push(code);
                    }
                }
                None => self.rejected += 1,
            }
        }
    }
}

pub struct TierRunner {
    fetcher: Arc<dyn ContentFetcher>,
    normalizer: Normalizer,
    fetch_timeout: Duration,
}

impl TierRunner {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, normalizer: Normalizer, fetch_timeout: Duration) -> Self {
        Self {
            fetcher,
            normalizer,
            fetch_timeout,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub async fn run(&self, game: &str, plan: &TierPlan, pages: &mut GamePages) -> TierOutcome {
        let mut outcome = TierOutcome::new(plan.tier());

        match plan {
            TierPlan::Curated { sources } => {
                let locators: Vec<String> = sources.iter().map(|s| s.locator.clone()).collect();
                let bodies = self
                    .fetch_all(game, plan.tier(), &locators, pages, &mut outcome.failures)
                    .await;
                for source in sources {
                    if let Some(body) = bodies.get(&source.locator) {
                        self.extract_markup(body, &source.pattern, &mut outcome);
                    }
                }
            }
            TierPlan::FallbackSearch { queries, max_links } => {
                for query in queries {
                    let links = match self.search(&query.query, *max_links).await {
                        Ok(links) => links,
                        Err(e) => {
                            warn!(game, query = query.query.as_str(), error = %e, "Discovery search failed");
                            outcome.failures.push(SourceFailure {
                                game: game.to_string(),
                                tier: plan.tier(),
                                locator: query.query.clone(),
                                error: e.to_string(),
                            });
                            continue;
                        }
                    };
                    debug!(game, query = query.query.as_str(), links = links.len(), "Discovery search");
                    for link in &links {
                        pages.discover(link.clone());
                    }
                    let bodies = self
                        .fetch_all(game, plan.tier(), &links, pages, &mut outcome.failures)
                        .await;
                    for link in &links {
                        if let Some(body) = bodies.get(link) {
                            self.extract_markup(body, &query.pattern, &mut outcome);
                        }
                    }
                }
            }
            TierPlan::GenericHeuristic { locators, pattern } => {
                let mut targets: Vec<String> = locators.clone();
                for link in pages.discovered() {
                    if !targets.contains(link) {
                        targets.push(link.clone());
                    }
                }
                let bodies = self
                    .fetch_all(game, plan.tier(), &targets, pages, &mut outcome.failures)
                    .await;
                for target in &targets {
                    if let Some(body) = bodies.get(target) {
                        let text = visible_text(&strip_expired_markup(body));
                        let found: Vec<String> =
                            pattern.candidates(&text).map(String::from).collect();
                        outcome.absorb(found.into_iter(), &self.normalizer);
                    }
                }
            }
        }

        outcome
    }

    fn extract_markup(&self, body: &str, pattern: &CandidatePattern, outcome: &mut TierOutcome) {
        let clean = strip_expired_markup(body);
        let found: Vec<String> = pattern.candidates(&clean).map(String::from).collect();
        outcome.absorb(found.into_iter(), &self.normalizer);
    }

    async fn search(&self, query: &str, max_links: usize) -> anyhow::Result<Vec<String>> {
        let results = tokio::time::timeout(self.fetch_timeout, self.fetcher.search(query, max_links))
            .await
            .map_err(|_| anyhow!("search timed out after {:?}", self.fetch_timeout))??;

        let mut links = Vec::new();
        for r in results {
            if !links.contains(&r.url) {
                links.push(r.url);
            }
            if links.len() >= max_links {
                break;
            }
        }
        Ok(links)
    }

    /// Fetch every locator not already in the cache, concurrently. Returns the
    /// bodies of all locators (cached or new) that are available.
    async fn fetch_all(
        &self,
        game: &str,
        tier: Tier,
        locators: &[String],
        pages: &mut GamePages,
        failures: &mut Vec<SourceFailure>,
    ) -> HashMap<String, String> {
        let mut pending: Vec<&String> = Vec::new();
        for locator in locators {
            if !pages.pages.contains_key(locator) && !pending.contains(&locator) {
                pending.push(locator);
            }
        }

        let fetched = join_all(pending.into_iter().map(|locator| async move {
            let result = tokio::time::timeout(self.fetch_timeout, self.fetcher.page(locator))
                .await
                .map_err(|_| anyhow!("timed out after {:?}", self.fetch_timeout))
                .and_then(|r| r);
            (locator.clone(), result)
        }))
        .await;

        for (locator, result) in fetched {
            match result {
                Ok(body) => {
                    debug!(game, %tier, url = locator.as_str(), bytes = body.len(), "Fetched source");
                    pages.pages.insert(locator, Some(body));
                }
                Err(e) => {
                    warn!(game, %tier, url = locator.as_str(), error = %e, "Source unavailable");
                    failures.push(SourceFailure {
                        game: game.to_string(),
                        tier,
                        locator: locator.clone(),
                        error: e.to_string(),
                    });
                    pages.pages.insert(locator, None);
                }
            }
        }

        locators
            .iter()
            .filter_map(|l| match pages.pages.get(l) {
                Some(Some(body)) => Some((l.clone(), body.clone())),
                _ => None,
            })
            .collect()
    }
}
