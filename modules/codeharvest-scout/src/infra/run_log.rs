//! Harvest run log: persisted timeline of every action taken during a run.
//!
//! Each run produces one JSON file, `{dir}/{run_id}.json`, holding the stats
//! and the ordered event list.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use codeharvest_common::Tier;

use crate::pipeline::stats::HarvestStats;

// ---------------------------------------------------------------------------
// RunLog
// ---------------------------------------------------------------------------

pub struct RunLog {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
    seq: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u32,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    TierAttempt {
        game: String,
        tier: Tier,
        codes: u32,
        failures: u32,
    },
    SourceFailed {
        game: String,
        tier: Tier,
        locator: String,
        error: String,
    },
    CodeAdmitted {
        game: String,
        code: String,
        tier: Tier,
    },
    CodeInvalidated {
        game: String,
        code: String,
    },
    ValidationSkipped {
        reason: String,
    },
    RecordExpired {
        game: String,
        code: String,
        expires_at: Option<NaiveDate>,
    },
    StoreSaved {
        path: String,
        records: u32,
    },
}

#[derive(Serialize)]
struct SerializedRun<'a> {
    run_id: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stats: &'a HarvestStats,
    events: &'a [RunEvent],
}

impl RunLog {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            events: Vec::new(),
            seq: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        self.events.push(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    pub fn events(&self) -> &[RunEvent] {
        &self.events
    }

    /// Serialize the run log and write it under `dir`.
    pub fn save(&self, dir: &Path, stats: &HarvestStats) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create run log dir: {}", dir.display()))?;

        let path = dir.join(format!("{}.json", self.run_id));
        let json = serde_json::to_string_pretty(&SerializedRun {
            run_id: &self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats,
            events: &self.events,
        })?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write run log: {}", path.display()))?;

        info!(run_id = %self.run_id, events = self.events.len(), path = %path.display(), "Harvest run log saved");
        Ok(path)
    }
}
