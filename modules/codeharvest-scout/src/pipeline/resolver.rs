//! Source resolution: which tiers to try for a game, in what order, and
//! when to stop.
//!
//! Plan shape:
//! - game has curated descriptors → `[Curated, FallbackSearch]`
//! - otherwise                    → `[FallbackSearch, GenericHeuristic]`
//!
//! A [`Resolution`] walks the plan as a small state machine:
//! `Pending → Trying(i) → { Succeeded | Trying(i+1) | Exhausted }`.
//! A tier succeeds when it yields at least one accepted code.

use std::collections::HashMap;

use codeharvest_common::config::PipelineConfig;
use codeharvest_common::{HarvestError, SourceTable, Tier};

use super::extractor::CandidatePattern;

#[derive(Debug, Clone)]
pub struct PatternSource {
    pub locator: String,
    pub pattern: CandidatePattern,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub pattern: CandidatePattern,
}

#[derive(Debug, Clone)]
pub enum TierPlan {
    /// Every source is attempted; results are unioned.
    Curated { sources: Vec<PatternSource> },
    /// Each query's top `max_links` results are scraped with its pattern.
    FallbackSearch {
        queries: Vec<SearchQuery>,
        max_links: usize,
    },
    /// Visible text of `locators` plus whatever the search tier discovered.
    GenericHeuristic {
        locators: Vec<String>,
        pattern: CandidatePattern,
    },
}

impl TierPlan {
    pub fn tier(&self) -> Tier {
        match self {
            TierPlan::Curated { .. } => Tier::Curated,
            TierPlan::FallbackSearch { .. } => Tier::FallbackSearch,
            TierPlan::GenericHeuristic { .. } => Tier::GenericHeuristic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Pending,
    Trying(usize),
    Succeeded(Tier),
    Exhausted,
}

/// Per-game walk through a tier plan.
#[derive(Debug, Clone)]
pub struct Resolution {
    plan: Vec<TierPlan>,
    state: ResolutionState,
}

impl Resolution {
    pub fn new(plan: Vec<TierPlan>) -> Self {
        Self {
            plan,
            state: ResolutionState::Pending,
        }
    }

    pub fn plan(&self) -> &[TierPlan] {
        &self.plan
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    /// Leave `Pending`. An empty plan is exhausted immediately.
    pub fn start(&mut self) {
        if self.state == ResolutionState::Pending {
            self.state = if self.plan.is_empty() {
                ResolutionState::Exhausted
            } else {
                ResolutionState::Trying(0)
            };
        }
    }

    /// The tier to run now, if any.
    pub fn current(&self) -> Option<&TierPlan> {
        match self.state {
            ResolutionState::Trying(i) => self.plan.get(i),
            _ => None,
        }
    }

    /// Report how many codes the current tier accepted.
    pub fn settle(&mut self, accepted: usize) {
        let ResolutionState::Trying(i) = self.state else {
            return;
        };
        self.state = if accepted > 0 {
            ResolutionState::Succeeded(self.plan[i].tier())
        } else if i + 1 < self.plan.len() {
            ResolutionState::Trying(i + 1)
        } else {
            ResolutionState::Exhausted
        };
    }

    pub fn succeeded_tier(&self) -> Option<Tier> {
        match self.state {
            ResolutionState::Succeeded(tier) => Some(tier),
            _ => None,
        }
    }
}

/// Defaults applied when a game has no descriptor for a tier.
#[derive(Debug, Clone)]
pub struct SearchDefaults {
    pub query_template: String,
    pub pattern: CandidatePattern,
    pub heuristic: CandidatePattern,
    pub max_links: usize,
}

impl SearchDefaults {
    pub fn from_config(config: &PipelineConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            query_template: config.search_query_template.clone(),
            pattern: CandidatePattern::case_insensitive(&config.search_pattern)?,
            heuristic: CandidatePattern::case_sensitive(&config.heuristic_pattern)?,
            max_links: config.max_search_links,
        })
    }
}

pub fn render_query(template: &str, game: &str) -> String {
    if template.contains("{game}") {
        template.replace("{game}", game)
    } else {
        format!("{game} {template}")
    }
}

pub struct SourceResolver {
    table: SourceTable,
    patterns: HashMap<String, CandidatePattern>,
    defaults: SearchDefaults,
}

impl SourceResolver {
    /// Compile every descriptor pattern up front; a bad pattern or a curated
    /// descriptor without one is a configuration error.
    pub fn new(table: SourceTable, defaults: SearchDefaults) -> Result<Self, HarvestError> {
        let mut patterns = HashMap::new();
        for (game, descriptor) in table.iter() {
            match (&descriptor.pattern, descriptor.tier) {
                (Some(p), Tier::Curated | Tier::FallbackSearch) => {
                    if !patterns.contains_key(p) {
                        patterns.insert(p.clone(), CandidatePattern::case_insensitive(p)?);
                    }
                }
                (None, Tier::Curated) => {
                    return Err(HarvestError::Config(format!(
                        "curated source {} for {game} has no pattern",
                        descriptor.locator
                    )));
                }
                _ => {}
            }
        }
        Ok(Self {
            table,
            patterns,
            defaults,
        })
    }

    pub fn table(&self) -> &SourceTable {
        &self.table
    }

    fn compiled(&self, pattern: Option<&String>) -> CandidatePattern {
        pattern
            .and_then(|p| self.patterns.get(p))
            .cloned()
            .unwrap_or_else(|| self.defaults.pattern.clone())
    }

    /// The ordered tier plan for `game`.
    pub fn plan(&self, game: &str) -> Vec<TierPlan> {
        let curated: Vec<PatternSource> = self
            .table
            .descriptors(game, Tier::Curated)
            .into_iter()
            .map(|d| PatternSource {
                locator: d.locator.clone(),
                pattern: self.compiled(d.pattern.as_ref()),
            })
            .collect();

        let mut queries: Vec<SearchQuery> = self
            .table
            .descriptors(game, Tier::FallbackSearch)
            .into_iter()
            .map(|d| SearchQuery {
                query: render_query(&d.locator, game),
                pattern: self.compiled(d.pattern.as_ref()),
            })
            .collect();
        if queries.is_empty() {
            queries.push(SearchQuery {
                query: render_query(&self.defaults.query_template, game),
                pattern: self.defaults.pattern.clone(),
            });
        }
        let search = TierPlan::FallbackSearch {
            queries,
            max_links: self.defaults.max_links,
        };

        if !curated.is_empty() {
            return vec![TierPlan::Curated { sources: curated }, search];
        }

        let locators = self
            .table
            .descriptors(game, Tier::GenericHeuristic)
            .into_iter()
            .map(|d| d.locator.clone())
            .collect();
        vec![
            search,
            TierPlan::GenericHeuristic {
                locators,
                pattern: self.defaults.heuristic.clone(),
            },
        ]
    }

    pub fn resolve(&self, game: &str) -> Resolution {
        Resolution::new(self.plan(game))
    }
}

#[cfg(test)]
mod tests {
    use codeharvest_common::SourceDescriptor;

    use super::*;

    fn defaults() -> SearchDefaults {
        SearchDefaults::from_config(&PipelineConfig::default()).unwrap()
    }

    fn tiers(plan: &[TierPlan]) -> Vec<Tier> {
        plan.iter().map(TierPlan::tier).collect()
    }

    #[test]
    fn curated_games_fall_back_to_search_only() {
        let table = SourceTable::new()
            .with("Blox Fruits", SourceDescriptor::curated("https://a", r"<code>(\w+)</code>"))
            .with("Blox Fruits", SourceDescriptor::curated("https://b", r"<b>(\w+)</b>"));
        let resolver = SourceResolver::new(table, defaults()).unwrap();

        let plan = resolver.plan("blox fruits");
        assert_eq!(tiers(&plan), vec![Tier::Curated, Tier::FallbackSearch]);
        let TierPlan::Curated { sources } = &plan[0] else {
            panic!("expected curated tier first");
        };
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn unmapped_games_search_then_heuristic() {
        let resolver = SourceResolver::new(SourceTable::new(), defaults()).unwrap();
        let plan = resolver.plan("Adopt Me!");
        assert_eq!(tiers(&plan), vec![Tier::FallbackSearch, Tier::GenericHeuristic]);

        let TierPlan::FallbackSearch { queries, max_links } = &plan[0] else {
            panic!("expected search tier first");
        };
        assert_eq!(queries[0].query, "Adopt Me! codes");
        assert_eq!(*max_links, 3);
    }

    #[test]
    fn configured_search_descriptor_replaces_default_query() {
        let table = SourceTable::new()
            .with("Doors", SourceDescriptor::search("roblox {game} promo", Some(r"<i>(\w+)</i>")))
            .with("Doors", SourceDescriptor::heuristic("https://wiki/doors"));
        let resolver = SourceResolver::new(table, defaults()).unwrap();

        let plan = resolver.plan("Doors");
        let TierPlan::FallbackSearch { queries, .. } = &plan[0] else {
            panic!("expected search tier first");
        };
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].query, "roblox Doors promo");
        assert_eq!(queries[0].pattern.as_str(), r"<i>(\w+)</i>");

        let TierPlan::GenericHeuristic { locators, .. } = &plan[1] else {
            panic!("expected heuristic tier second");
        };
        assert_eq!(locators, &vec!["https://wiki/doors".to_string()]);
    }

    #[test]
    fn bad_patterns_fail_at_construction() {
        let table = SourceTable::new().with("G", SourceDescriptor::curated("https://a", r"\w+"));
        assert!(matches!(
            SourceResolver::new(table, defaults()),
            Err(HarvestError::InvalidPattern { .. })
        ));

        let mut missing = SourceDescriptor::curated("https://a", "");
        missing.pattern = None;
        let table = SourceTable::new().with("G", missing);
        assert!(matches!(
            SourceResolver::new(table, defaults()),
            Err(HarvestError::Config(_))
        ));
    }

    #[test]
    fn query_template_without_placeholder_is_suffixed() {
        assert_eq!(render_query("codes", "Evade"), "Evade codes");
        assert_eq!(render_query("{game} codes", "Evade"), "Evade codes");
    }

    #[test]
    fn resolution_stops_at_first_success() {
        let resolver = SourceResolver::new(SourceTable::new(), defaults()).unwrap();
        let mut resolution = resolver.resolve("G");
        assert_eq!(resolution.state(), ResolutionState::Pending);
        assert!(resolution.current().is_none());

        resolution.start();
        assert_eq!(resolution.current().map(TierPlan::tier), Some(Tier::FallbackSearch));

        resolution.settle(2);
        assert_eq!(resolution.state(), ResolutionState::Succeeded(Tier::FallbackSearch));
        assert!(resolution.current().is_none());
        assert_eq!(resolution.succeeded_tier(), Some(Tier::FallbackSearch));
    }

    #[test]
    fn resolution_falls_through_empty_tiers_to_exhaustion() {
        let resolver = SourceResolver::new(SourceTable::new(), defaults()).unwrap();
        let mut resolution = resolver.resolve("G");
        resolution.start();

        resolution.settle(0);
        assert_eq!(resolution.state(), ResolutionState::Trying(1));
        assert_eq!(resolution.current().map(TierPlan::tier), Some(Tier::GenericHeuristic));

        resolution.settle(0);
        assert_eq!(resolution.state(), ResolutionState::Exhausted);
        assert_eq!(resolution.succeeded_tier(), None);

        // settling after the walk is over changes nothing
        resolution.settle(5);
        assert_eq!(resolution.state(), ResolutionState::Exhausted);
    }

    #[test]
    fn empty_plan_is_exhausted_on_start() {
        let mut resolution = Resolution::new(Vec::new());
        resolution.start();
        assert_eq!(resolution.state(), ResolutionState::Exhausted);
    }
}
