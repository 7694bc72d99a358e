use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// --- Code records ---

/// One persisted reward code. Records are created once and never edited;
/// the only way one leaves the store is the expiry filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRecord {
    pub game: String,
    pub code: String,
    pub verified_at: NaiveDate,
    #[serde(default, alias = "expires", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

impl CodeRecord {
    pub fn new(game: impl Into<String>, code: impl Into<String>, verified_at: NaiveDate) -> Self {
        Self {
            game: game.into(),
            code: code.into(),
            verified_at,
            expires_at: None,
        }
    }

    /// A record expires only when it carries a date strictly before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_at.is_some_and(|d| d < today)
    }
}

/// Case-insensitive lookup key for a game identifier.
pub fn game_key(game: &str) -> String {
    game.trim().to_uppercase()
}

// --- Sources ---

/// Ranked strategy for discovering codes. Ordering follows the resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Curated,
    FallbackSearch,
    GenericHeuristic,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Curated, Tier::FallbackSearch, Tier::GenericHeuristic];

    pub fn index(self) -> usize {
        match self {
            Tier::Curated => 0,
            Tier::FallbackSearch => 1,
            Tier::GenericHeuristic => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Curated => write!(f, "curated"),
            Tier::FallbackSearch => write!(f, "fallback-search"),
            Tier::GenericHeuristic => write!(f, "generic-heuristic"),
        }
    }
}

/// Where to look and how to pull codes out of it.
///
/// - `Curated`: `locator` is a page URL, `pattern` has one capture group.
/// - `FallbackSearch`: `locator` is a query template (`{game}` is substituted),
///   `pattern` is run against every result page.
/// - `GenericHeuristic`: `locator` is a page URL, `pattern` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub locator: String,
    #[serde(default)]
    pub pattern: Option<String>,
    pub tier: Tier,
}

impl SourceDescriptor {
    pub fn curated(locator: &str, pattern: &str) -> Self {
        Self {
            locator: locator.to_string(),
            pattern: Some(pattern.to_string()),
            tier: Tier::Curated,
        }
    }

    pub fn search(query_template: &str, pattern: Option<&str>) -> Self {
        Self {
            locator: query_template.to_string(),
            pattern: pattern.map(String::from),
            tier: Tier::FallbackSearch,
        }
    }

    pub fn heuristic(locator: &str) -> Self {
        Self {
            locator: locator.to_string(),
            pattern: None,
            tier: Tier::GenericHeuristic,
        }
    }
}

/// Game → descriptors. Keys are compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    entries: HashMap<String, Vec<SourceDescriptor>>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, game: &str, descriptor: SourceDescriptor) {
        self.entries.entry(game_key(game)).or_default().push(descriptor);
    }

    pub fn with(mut self, game: &str, descriptor: SourceDescriptor) -> Self {
        self.insert(game, descriptor);
        self
    }

    /// Replace every descriptor for `game`.
    pub fn replace_game(&mut self, game: &str, descriptors: Vec<SourceDescriptor>) {
        self.entries.insert(game_key(game), descriptors);
    }

    pub fn all(&self, game: &str) -> &[SourceDescriptor] {
        self.entries
            .get(&game_key(game))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn descriptors(&self, game: &str, tier: Tier) -> Vec<&SourceDescriptor> {
        self.all(game).iter().filter(|d| d.tier == tier).collect()
    }

    pub fn has_curated(&self, game: &str) -> bool {
        self.all(game).iter().any(|d| d.tier == Tier::Curated)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceDescriptor)> {
        self.entries
            .iter()
            .flat_map(|(game, ds)| ds.iter().map(move |d| (game.as_str(), d)))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// --- Policies ---

/// What makes two records duplicates of each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// Codes are cross-game unique tokens.
    #[default]
    Code,
    /// The same code may exist once per game.
    GameAndCode,
}

impl DedupPolicy {
    pub fn key(self, game: &str, code: &str) -> String {
        match self {
            DedupPolicy::Code => code.to_string(),
            DedupPolicy::GameAndCode => format!("{}\u{1f}{code}", game_key(game)),
        }
    }
}

/// Admission rules applied after canonicalizing a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeRules {
    pub min_len: usize,
    pub max_len: usize,
    pub require_alpha_first: bool,
}

impl Default for NormalizeRules {
    fn default() -> Self {
        Self {
            min_len: 4,
            max_len: 40,
            require_alpha_first: false,
        }
    }
}
