//! Run-scoped state shared by concurrent game workers.
//!
//! The merge ledger (the `seen` set plus the output list) and the per-source
//! error log each sit behind one lock. Workers submit codes; the ledger
//! decides admission, so concurrent workers can never admit the same key twice.

use std::sync::{Mutex, MutexGuard, PoisonError};

use codeharvest_common::Tier;

use crate::store::{MergeLedger, MergeResult};

/// One descriptor that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub game: String,
    pub tier: Tier,
    pub locator: String,
    pub error: String,
}

pub struct RunState {
    ledger: Mutex<MergeLedger>,
    failures: Mutex<Vec<SourceFailure>>,
}

impl RunState {
    pub fn new(ledger: MergeLedger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            failures: Mutex::new(Vec::new()),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, MergeLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_seen(&self, game: &str, code: &str) -> bool {
        self.ledger().contains(game, code)
    }

    /// Check-and-insert under the ledger lock.
    pub fn admit(&self, game: &str, code: &str) -> bool {
        self.ledger().admit(game, code)
    }

    pub fn record_failures(&self, failures: impl IntoIterator<Item = SourceFailure>) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(failures);
    }

    /// Consume the run state: merged store plus the error log.
    pub fn finish(self) -> (MergeResult, Vec<SourceFailure>) {
        let ledger = self.ledger.into_inner().unwrap_or_else(PoisonError::into_inner);
        let failures = self
            .failures
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (ledger.finish(), failures)
    }
}
