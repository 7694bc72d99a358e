use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use codeharvest_archive::{Archive, ArchiveConfig};
use codeharvest_common::config::load_config;
use codeharvest_common::{AppConfig, FileConfig};
use codeharvest_scout::catalog::{self, ChartCatalog};
use codeharvest_scout::infra::run_log::{EventKind, RunLog};
use codeharvest_scout::pipeline::resolver::{SearchDefaults, SourceResolver};
use codeharvest_scout::pipeline::validator::{ValidationScope, Validator};
use codeharvest_scout::scout::{HarvestDeps, Scout};
use codeharvest_scout::sources;
use codeharvest_scout::store::JsonStore;
use redeem_client::RedeemClient;

#[derive(Parser)]
#[command(name = "codeharvest", about = "Reward code harvester for popular games")]
struct Cli {
    /// Path to TOML config file
    #[arg(long, env = "CODEHARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Record store to merge into (default: $DATA_DIR/coupons.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Harvest only these games (repeatable)
    #[arg(long = "game")]
    games: Vec<String>,

    /// Run the pipeline without writing the store
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("codeharvest=info".parse()?))
        .init();

    let cli = Cli::parse();
    info!("codeharvest starting...");

    let config = AppConfig::from_env();
    let file = match cli.config.as_ref().or(config.config_path.as_ref()) {
        Some(path) => {
            info!(path = %path.display(), "Loading config file");
            load_config(path)?
        }
        None => FileConfig::default(),
    };

    let table = file.apply_sources(sources::default_sources());
    let defaults = SearchDefaults::from_config(&file.pipeline)?;
    let resolver = SourceResolver::new(table, defaults).context("Invalid source table")?;
    info!(descriptors = resolver.table().len(), "Source table ready");

    let fetch_timeout = Duration::from_secs(file.pipeline.fetch_timeout_secs);
    let archive = Archive::new(ArchiveConfig {
        user_agent: file.pipeline.user_agent.clone(),
        timeout: fetch_timeout,
        serper_api_key: config.serper_api_key.clone(),
    })?;

    let validator = match (&config.redeem_url, &config.redeem_token) {
        (Some(url), Some(token)) => {
            let client = RedeemClient::new(url, token)?;
            info!(endpoint = client.endpoint().as_str(), "Redemption check enabled");
            Some(Validator::from_config(Arc::new(client), &file.validation))
        }
        _ => {
            if !file.validation.global_games.is_empty() {
                warn!("REDEEM_URL/REDEEM_TOKEN not set, validation disabled");
            }
            None
        }
    };

    let games = match catalog::static_games(&cli.games, &file.catalog) {
        Some(games) => games,
        None => {
            ChartCatalog::new(&file.pipeline.user_agent, fetch_timeout)?
                .games_or_fallback(file.catalog.limit)
                .await
        }
    };

    let store_path = cli
        .store
        .clone()
        .or_else(|| file.store.path.clone())
        .unwrap_or_else(|| config.default_store_path());
    let store = JsonStore::new(store_path);
    let existing = store.load();

    let scout = Scout::new(
        HarvestDeps::builder()
            .fetcher(Arc::new(archive))
            .resolver(resolver)
            .normalize(file.normalize.clone())
            .dedup(file.store.dedup)
            .concurrency(file.pipeline.concurrency)
            .fetch_timeout(fetch_timeout)
            .validator(validator)
            .scope(ValidationScope::new(&file.validation.global_games))
            .build(),
    );

    let run_id = uuid::Uuid::new_v4().to_string();
    let mut log = RunLog::new(run_id.clone());
    let today = chrono::Local::now().date_naive();
    info!(run_id = run_id.as_str(), games = games.len(), %today, "Harvest run starting");

    let outcome = scout.run(&games, existing, today, &mut log).await;

    let saved = if cli.dry_run {
        info!("Dry run, store left untouched");
        Ok(())
    } else {
        store.save(&outcome.records).map(|()| {
            log.log(EventKind::StoreSaved {
                path: store.path().display().to_string(),
                records: outcome.records.len() as u32,
            });
        })
    };

    if let Err(e) = log.save(&config.data_dir.join("harvest-runs"), &outcome.stats) {
        warn!(error = %e, "Failed to save run log");
    }

    if let Err(e) = saved {
        error!(error = %e, "Store write failed");
        return Err(e.into());
    }

    println!("{}", outcome.stats);
    Ok(())
}
