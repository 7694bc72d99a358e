//! Tier boundary tests: which tiers run, and which never get the chance.

use std::sync::Arc;

use chrono::NaiveDate;

use codeharvest_archive::SearchResult;
use codeharvest_common::config::PipelineConfig;
use codeharvest_common::{SourceDescriptor, SourceTable};

use crate::infra::run_log::{EventKind, RunLog};
use crate::pipeline::resolver::{SearchDefaults, SourceResolver};
use crate::scout::{HarvestDeps, Scout};
use crate::testing::MockFetcher;

fn today() -> NaiveDate {
    "2025-07-15".parse().unwrap()
}

fn scout(fetcher: Arc<MockFetcher>, table: SourceTable) -> Scout {
    let defaults = SearchDefaults::from_config(&PipelineConfig::default()).unwrap();
    Scout::new(
        HarvestDeps::builder()
            .fetcher(fetcher)
            .resolver(SourceResolver::new(table, defaults).unwrap())
            .build(),
    )
}

fn curated_table() -> SourceTable {
    SourceTable::new().with(
        "G",
        SourceDescriptor::curated("https://curated.example/g", r"<li>([^<]+)</li>"),
    )
}

fn search_hit(url: &str) -> Vec<SearchResult> {
    vec![SearchResult {
        url: url.into(),
        title: "codes".into(),
    }]
}

#[tokio::test]
async fn non_empty_curated_tier_skips_search() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page("https://curated.example/g", "<ul><li>CURATED1</li></ul>")
            .on_search("G codes", search_hit("https://search.example/g")),
    );
    let scout = scout(fetcher.clone(), curated_table());

    let outcome = scout
        .run(&["G".to_string()], vec![], today(), &mut RunLog::new("t".into()))
        .await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].code, "CURATED1");
    assert!(fetcher.search_calls().is_empty(), "search must not run");
    assert_eq!(outcome.stats.tier_hits, [1, 0, 0]);
}

#[tokio::test]
async fn empty_curated_tier_falls_back_to_search() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page("https://curated.example/g", "<ul><li><del>OLD1</del></li></ul>")
            .on_search("G codes", search_hit("https://search.example/g"))
            .on_page("https://search.example/g", "<p><code>SEARCH1</code></p>"),
    );
    let scout = scout(fetcher.clone(), curated_table());

    let outcome = scout
        .run(&["G".to_string()], vec![], today(), &mut RunLog::new("t".into()))
        .await;

    assert_eq!(fetcher.search_calls(), vec!["G codes"]);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].code, "SEARCH1");
    assert_eq!(outcome.stats.tier_hits, [0, 1, 0]);
}

#[tokio::test]
async fn curated_games_never_reach_heuristic() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .on_page("https://curated.example/g", "<p>nothing here</p>")
            .on_search("G codes", search_hit("https://search.example/g"))
            .on_page("https://search.example/g", "<p>Plain text HEURISTIC1 code</p>"),
    );
    let scout = scout(fetcher, curated_table());
    let mut log = RunLog::new("t".into());

    let outcome = scout.run(&["G".to_string()], vec![], today(), &mut log).await;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.tiers_attempted, 2);
    assert_eq!(outcome.stats.games_with_codes, 0);
}

#[tokio::test]
async fn unmapped_game_uses_heuristic_after_empty_search() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .on_search("H codes", search_hit("https://search.example/h"))
            .on_page("https://search.example/h", "<p>Use code <b>FREE2025</b> now</p>"),
    );
    let scout = scout(fetcher.clone(), SourceTable::new());
    let mut log = RunLog::new("t".into());

    let outcome = scout.run(&["H".to_string()], vec![], today(), &mut log).await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].code, "FREE2025");
    assert_eq!(outcome.stats.tier_hits, [0, 0, 1]);
    assert_eq!(fetcher.page_calls().len(), 1, "heuristic reuses the search page");

    let attempts: Vec<_> = log
        .events()
        .iter()
        .filter(|e| matches!(e.kind, EventKind::TierAttempt { .. }))
        .collect();
    assert_eq!(attempts.len(), 2);
}

#[tokio::test]
async fn game_with_nothing_anywhere_is_skipped() {
    let fetcher = Arc::new(MockFetcher::new());
    let scout = scout(fetcher, SourceTable::new());

    let outcome = scout
        .run(&["Ghost".to_string()], vec![], today(), &mut RunLog::new("t".into()))
        .await;

    assert!(outcome.records.is_empty());
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.stats.tier_hits, [0, 0, 0]);
}
