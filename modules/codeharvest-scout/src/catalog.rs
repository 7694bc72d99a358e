//! The list of games a run harvests.
//!
//! Precedence: games named on the command line, then `catalog.games` from the
//! config file, then the live Roblox top-games chart. When the chart cannot be
//! read, [`FALLBACK_GAMES`] stands in.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use codeharvest_common::config::CatalogConfig;

const CHART_URL: &str = "https://games.roblox.com/v1/games/list";

/// Top games by monthly players, mid-2025.
pub const FALLBACK_GAMES: [&str; 20] = [
    "Blox Fruits",
    "Brookhaven",
    "Adopt Me!",
    "Pet Simulator X",
    "DOORS",
    "Murder Mystery 2",
    "Tower of Hell",
    "Shindo Life",
    "King Legacy",
    "Project Slayers",
    "Bee Swarm Simulator",
    "Blade Ball",
    "All Star Tower Defense",
    "Blue Lock Rivals",
    "Weapon Fighting Simulator",
    "Anime Fighters Simulator",
    "Anime Champions Simulator",
    "Pet Simulator 99",
    "Evade",
    "Arsenal",
];

#[derive(Deserialize)]
struct ChartResponse {
    #[serde(default)]
    games: Vec<ChartGame>,
}

#[derive(Deserialize)]
struct ChartGame {
    name: String,
}

/// Game names from a chart response body, in chart order.
pub fn parse_chart(body: &str) -> Result<Vec<String>> {
    let chart: ChartResponse = serde_json::from_str(body).context("Malformed games chart")?;
    Ok(chart
        .games
        .into_iter()
        .map(|g| g.name.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}

pub fn fallback_games(limit: usize) -> Vec<String> {
    FALLBACK_GAMES.iter().take(limit).map(|g| g.to_string()).collect()
}

pub struct ChartCatalog {
    client: reqwest::Client,
}

impl ChartCatalog {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build chart client")?;
        Ok(Self { client })
    }

    pub fn chart_url(limit: usize) -> String {
        format!("{CHART_URL}?sortType=top&startRows=0&maxRows={limit}")
    }

    /// Top `limit` game names from the live chart.
    pub async fn top_games(&self, limit: usize) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(Self::chart_url(limit))
            .send()
            .await
            .context("Games chart request failed")?
            .error_for_status()
            .context("Games chart returned an error status")?;
        let body = resp.text().await.context("Failed to read games chart")?;

        let mut games = parse_chart(&body)?;
        games.truncate(limit);
        Ok(games)
    }

    pub async fn games_or_fallback(&self, limit: usize) -> Vec<String> {
        match self.top_games(limit).await {
            Ok(games) if !games.is_empty() => {
                info!(games = games.len(), "Loaded games chart");
                games
            }
            Ok(_) => {
                warn!("Games chart was empty, using fallback list");
                fallback_games(limit)
            }
            Err(e) => {
                warn!(error = %e, "Games chart unavailable, using fallback list");
                fallback_games(limit)
            }
        }
    }
}

/// Resolve the run's games without touching the network when a static list
/// is available. `None` means the live chart must be asked.
pub fn static_games(cli_games: &[String], config: &CatalogConfig) -> Option<Vec<String>> {
    if !cli_games.is_empty() {
        return Some(cli_games.to_vec());
    }
    if !config.games.is_empty() {
        return Some(config.games.iter().take(config.limit).cloned().collect());
    }
    None
}
