use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use codeharvest_common::{game_key, CodeRecord, DedupPolicy, NormalizeRules, Tier};

use crate::infra::run_log::{EventKind, RunLog};
use crate::pipeline::normalizer::Normalizer;
use crate::pipeline::resolver::SourceResolver;
use crate::pipeline::state::{RunState, SourceFailure};
use crate::pipeline::stats::HarvestStats;
use crate::pipeline::tiers::{GamePages, TierOutcome, TierRunner};
use crate::pipeline::validator::{admits, ValidationScope, Validator, Verdict};
use crate::store::MergeLedger;
use crate::traits::ContentFetcher;

/// Everything a [`Scout`] needs for a run.
#[derive(TypedBuilder)]
pub struct HarvestDeps {
    pub fetcher: Arc<dyn ContentFetcher>,
    pub resolver: SourceResolver,
    #[builder(default)]
    pub normalize: NormalizeRules,
    #[builder(default)]
    pub dedup: DedupPolicy,
    #[builder(default = 4)]
    pub concurrency: usize,
    #[builder(default = Duration::from_secs(30))]
    pub fetch_timeout: Duration,
    #[builder(default)]
    pub validator: Option<Validator>,
    /// Games whose codes go through the validator.
    #[builder(default)]
    pub scope: ValidationScope,
}

/// Result of a harvest run, ready to persist.
#[derive(Debug)]
pub struct HarvestOutcome {
    pub records: Vec<CodeRecord>,
    pub expired: Vec<CodeRecord>,
    pub stats: HarvestStats,
    pub failures: Vec<SourceFailure>,
}

/// Per-game result of the concurrent phase.
struct GameReport {
    game: String,
    attempts: Vec<TierOutcome>,
    succeeded: Option<Tier>,
    /// Codes of the winning tier, not yet admitted.
    codes: Vec<String>,
}

#[derive(Default)]
struct Admission {
    admitted: Vec<String>,
    duplicates: u32,
    /// Codes held back for the validator.
    pending: Vec<String>,
}

pub struct Scout {
    runner: TierRunner,
    resolver: SourceResolver,
    dedup: DedupPolicy,
    concurrency: usize,
    validator: Option<Validator>,
    scope: ValidationScope,
}

impl Scout {
    pub fn new(deps: HarvestDeps) -> Self {
        Self {
            runner: TierRunner::new(deps.fetcher, Normalizer::new(deps.normalize), deps.fetch_timeout),
            resolver: deps.resolver,
            dedup: deps.dedup,
            concurrency: deps.concurrency.max(1),
            validator: deps.validator,
            scope: deps.scope,
        }
    }

    /// Harvest `games` and merge what is found into `existing`.
    pub async fn run(
        &self,
        games: &[String],
        existing: Vec<CodeRecord>,
        run_date: NaiveDate,
        log: &mut RunLog,
    ) -> HarvestOutcome {
        let mut stats = HarvestStats {
            games_total: games.len() as u32,
            ..Default::default()
        };
        let state = RunState::new(MergeLedger::new(existing, self.dedup, run_date));

        if self.validator.is_none() && !self.scope.is_empty() {
            info!("Validation disabled, global game codes admitted unchecked");
            log.log(EventKind::ValidationSkipped {
                reason: "no redemption credential".to_string(),
            });
        }

        info!(games = games.len(), concurrency = self.concurrency, "Starting harvest");
        // Fetching runs concurrently; reports come back in catalog order so
        // the first game listed owns a code it shares with a later one.
        let reports: Vec<GameReport> = stream::iter(games.iter().map(|game| self.harvest_game(game, &state)))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut games_with_codes: HashSet<String> = HashSet::new();
        let mut pending: Vec<(String, String, Tier)> = Vec::new();

        for report in reports {
            for attempt in &report.attempts {
                stats.tiers_attempted += 1;
                stats.candidates_extracted += attempt.candidates;
                stats.candidates_rejected += attempt.rejected;
                log.log(EventKind::TierAttempt {
                    game: report.game.clone(),
                    tier: attempt.tier,
                    codes: attempt.codes.len() as u32,
                    failures: attempt.failures.len() as u32,
                });
                for failure in &attempt.failures {
                    log.log(EventKind::SourceFailed {
                        game: failure.game.clone(),
                        tier: failure.tier,
                        locator: failure.locator.clone(),
                        error: failure.error.clone(),
                    });
                }
            }

            let Some(tier) = report.succeeded else {
                debug!(game = report.game.as_str(), "No codes in any tier");
                continue;
            };
            stats.record_tier_hit(tier);
            let admission = self.admit_game(&report, &state);
            stats.codes_duplicate += admission.duplicates;

            if !admission.admitted.is_empty() {
                games_with_codes.insert(game_key(&report.game));
            }
            for code in admission.admitted {
                stats.codes_admitted += 1;
                log.log(EventKind::CodeAdmitted {
                    game: report.game.clone(),
                    code,
                    tier,
                });
            }
            pending.extend(admission.pending.into_iter().map(|c| (report.game.clone(), c, tier)));
        }

        if let Some(validator) = &self.validator {
            self.validate(validator, pending, &state, &mut stats, &mut games_with_codes, log)
                .await;
        }

        let (merged, failures) = state.finish();
        stats.sources_failed = failures.len() as u32;
        stats.games_with_codes = games_with_codes.len() as u32;

        for record in &merged.expired {
            log.log(EventKind::RecordExpired {
                game: record.game.clone(),
                code: record.code.clone(),
                expires_at: record.expires_at,
            });
        }
        stats.records_expired = merged.expired.len() as u32;
        stats.records_total = merged.records.len() as u32;
        stats.games_in_store = merged
            .records
            .iter()
            .map(|r| game_key(&r.game))
            .collect::<HashSet<_>>()
            .len() as u32;

        info!(
            admitted = stats.codes_admitted,
            expired = stats.records_expired,
            failed_sources = stats.sources_failed,
            "Harvest finished"
        );

        HarvestOutcome {
            records: merged.records,
            expired: merged.expired,
            stats,
            failures,
        }
    }

    /// Walk one game's tier plan until a tier yields codes. Admission is
    /// left to the caller.
    async fn harvest_game(&self, game: &str, state: &RunState) -> GameReport {
        let mut resolution = self.resolver.resolve(game);
        let mut pages = GamePages::new();
        let mut attempts = Vec::new();

        resolution.start();
        while let Some(plan) = resolution.current() {
            let outcome = self.runner.run(game, plan, &mut pages).await;
            state.record_failures(outcome.failures.iter().cloned());
            debug!(
                game,
                tier = %outcome.tier,
                codes = outcome.codes.len(),
                failures = outcome.failures.len(),
                "Tier attempted"
            );
            resolution.settle(outcome.codes.len());
            attempts.push(outcome);
        }

        let succeeded = resolution.succeeded_tier();
        let codes = match (succeeded, attempts.last()) {
            (Some(_), Some(winning)) => winning.codes.clone(),
            _ => Vec::new(),
        };
        GameReport {
            game: game.to_string(),
            attempts,
            succeeded,
            codes,
        }
    }

    /// Admit one game's codes, or hold them back when the game is validated.
    fn admit_game(&self, report: &GameReport, state: &RunState) -> Admission {
        let validate = self.validator.is_some() && self.scope.applies_to(&report.game);
        let mut admission = Admission::default();
        for code in &report.codes {
            if validate {
                // known codes are never submitted
                if state.is_seen(&report.game, code) {
                    admission.duplicates += 1;
                } else {
                    admission.pending.push(code.clone());
                }
            } else if state.admit(&report.game, code) {
                admission.admitted.push(code.clone());
            } else {
                admission.duplicates += 1;
            }
        }
        if !admission.admitted.is_empty() {
            info!(
                game = report.game.as_str(),
                tier = ?report.succeeded,
                admitted = admission.admitted.len(),
                "Codes admitted"
            );
        }
        admission
    }

    /// Serial validation of held-back codes, after the concurrent phase.
    async fn validate(
        &self,
        validator: &Validator,
        pending: Vec<(String, String, Tier)>,
        state: &RunState,
        stats: &mut HarvestStats,
        games_with_codes: &mut HashSet<String>,
        log: &mut RunLog,
    ) {
        let mut keys = HashSet::new();
        let mut queue = Vec::new();
        for (game, code, tier) in pending {
            if state.is_seen(&game, &code) || !keys.insert(self.dedup.key(&game, &code)) {
                stats.codes_duplicate += 1;
                continue;
            }
            queue.push((game, code, tier));
        }
        if queue.is_empty() {
            return;
        }

        info!(codes = queue.len(), pacing = ?validator.pacing(), "Validating codes");
        let codes: Vec<String> = queue.iter().map(|(_, c, _)| c.clone()).collect();
        let verdicts = validator.check_all(&codes).await;

        for ((game, code, tier), (_, verdict)) in queue.into_iter().zip(verdicts) {
            if verdict == Verdict::Unknown {
                stats.validation_unknown += 1;
            }
            if !admits(verdict) {
                warn!(game = game.as_str(), code = code.as_str(), "Code refused by authority");
                stats.codes_invalidated += 1;
                log.log(EventKind::CodeInvalidated { game, code });
                continue;
            }
            if state.admit(&game, &code) {
                stats.codes_admitted += 1;
                games_with_codes.insert(game_key(&game));
                log.log(EventKind::CodeAdmitted { game, code, tier });
            } else {
                stats.codes_duplicate += 1;
            }
        }
    }
}
