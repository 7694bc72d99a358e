use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::{DedupPolicy, NormalizeRules, SourceDescriptor, SourceTable, Tier};

/// Application configuration loaded from environment variables.
/// Holds only secrets and environment-specific paths; pipeline tuning and
/// the source table live in the TOML [`FileConfig`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Discovery search
    pub serper_api_key: Option<String>,

    // Redemption authority (validation tier)
    pub redeem_url: Option<String>,
    pub redeem_token: Option<String>,

    // Storage
    pub data_dir: PathBuf,
    pub config_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let config = Self {
            serper_api_key: non_empty_env("SERPER_API_KEY"),
            redeem_url: non_empty_env("REDEEM_URL"),
            redeem_token: non_empty_env("REDEEM_TOKEN"),
            data_dir: PathBuf::from(
                std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            ),
            config_path: non_empty_env("CODEHARVEST_CONFIG").map(PathBuf::from),
        };

        config.log_keys();
        config
    }

    /// Where the record store lives when the file config does not say.
    pub fn default_store_path(&self) -> PathBuf {
        self.data_dir.join("coupons.json")
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => {
                    let n = v.len().min(5);
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  SERPER_API_KEY: {}", preview_opt(&self.serper_api_key));
        tracing::info!("  REDEEM_URL: {}", self.redeem_url.as_deref().unwrap_or("<not set>"));
        tracing::info!("  REDEEM_TOKEN: {}", preview_opt(&self.redeem_token));
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// FileConfig
// ---------------------------------------------------------------------------

/// TOML-backed tuning. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub pipeline: PipelineConfig,
    pub normalize: NormalizeRules,
    pub store: StoreConfig,
    pub validation: ValidationConfig,
    pub catalog: CatalogConfig,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Games processed at once.
    pub concurrency: usize,
    pub fetch_timeout_secs: u64,
    /// Result links followed per discovery query.
    pub max_search_links: usize,
    pub search_query_template: String,
    pub search_pattern: String,
    pub heuristic_pattern: String,
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fetch_timeout_secs: 30,
            max_search_links: 3,
            search_query_template: "{game} codes".to_string(),
            search_pattern: r"<code>([^<\s]{4,40})</code>".to_string(),
            heuristic_pattern: r"\b([A-Z0-9]{4,20})\b".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
    pub dedup: DedupPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Games whose codes are redeemable platform-wide and are checked
    /// against the authority before admission.
    pub global_games: Vec<String>,
    pub pacing_ms: u64,
    pub negative_markers: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            global_games: Vec::new(),
            pacing_ms: 1500,
            negative_markers: vec![
                "invalid".to_string(),
                "expired".to_string(),
                "already".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Static game list. Empty means "ask the live chart".
    pub games: Vec<String>,
    pub limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            games: Vec::new(),
            limit: 100,
        }
    }
}

/// One `[[sources]]` row.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub game: String,
    pub locator: String,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default = "default_entry_tier")]
    pub tier: Tier,
}

fn default_entry_tier() -> Tier {
    Tier::Curated
}

impl FileConfig {
    /// Overlay the configured sources on `base`. A game listed in the file
    /// has all of its built-in descriptors replaced.
    pub fn apply_sources(&self, mut base: SourceTable) -> SourceTable {
        let mut overridden: Vec<(String, Vec<SourceDescriptor>)> = Vec::new();
        for entry in &self.sources {
            let descriptor = SourceDescriptor {
                locator: entry.locator.clone(),
                pattern: entry.pattern.clone(),
                tier: entry.tier,
            };
            match overridden
                .iter_mut()
                .find(|(g, _)| crate::types::game_key(g) == crate::types::game_key(&entry.game))
            {
                Some((_, ds)) => ds.push(descriptor),
                None => overridden.push((entry.game.clone(), vec![descriptor])),
            }
        }
        for (game, descriptors) in overridden {
            base.replace_game(&game, descriptors);
        }
        base
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<FileConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.pipeline.concurrency, 4);
        assert_eq!(config.pipeline.max_search_links, 3);
        assert_eq!(config.normalize, NormalizeRules::default());
        assert_eq!(config.store.dedup, DedupPolicy::Code);
        assert_eq!(config.validation.pacing_ms, 1500);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn parses_sections_and_sources() {
        let config = parse_config(
            r#"
            [normalize]
            min_len = 5
            require_alpha_first = true

            [store]
            dedup = "game-and-code"

            [validation]
            global_games = ["Roblox"]

            [[sources]]
            game = "Doors"
            locator = "https://example.com/doors"
            pattern = '<b>(\w+)</b>'

            [[sources]]
            game = "doors"
            locator = "{game} promo codes"
            tier = "fallback-search"
            "#,
        )
        .unwrap();

        assert_eq!(config.normalize.min_len, 5);
        assert_eq!(config.normalize.max_len, 40);
        assert!(config.normalize.require_alpha_first);
        assert_eq!(config.store.dedup, DedupPolicy::GameAndCode);
        assert_eq!(config.validation.global_games, vec!["Roblox"]);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].tier, Tier::Curated);
        assert_eq!(config.sources[1].tier, Tier::FallbackSearch);
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(parse_config("[nope]\nx = 1").is_err());
    }

    #[test]
    fn configured_game_replaces_built_in_descriptors() {
        let base = SourceTable::new()
            .with("Doors", SourceDescriptor::curated("https://old", r"(\w+)"))
            .with("Evade", SourceDescriptor::curated("https://evade", r"(\w+)"));
        let config = parse_config(
            r#"
            [[sources]]
            game = "DOORS"
            locator = "https://new"
            pattern = '(\w+)'
            "#,
        )
        .unwrap();

        let table = config.apply_sources(base);
        assert_eq!(table.all("doors").len(), 1);
        assert_eq!(table.all("doors")[0].locator, "https://new");
        assert_eq!(table.all("evade").len(), 1);
    }
}
