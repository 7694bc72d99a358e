//! Merging freshly found codes into the persisted record set.
//!
//! The ledger is seeded with every persisted record, admits a new code only
//! when its dedup key is unseen, and applies the expiry filter once at the end.

use std::collections::HashSet;

use chrono::NaiveDate;

use codeharvest_common::{game_key, CodeRecord, DedupPolicy};

pub struct MergeLedger {
    records: Vec<CodeRecord>,
    seen: HashSet<String>,
    policy: DedupPolicy,
    run_date: NaiveDate,
    added: usize,
}

/// What [`MergeLedger::finish`] hands to persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Sorted by game (case-insensitively), then code; expired records removed.
    pub records: Vec<CodeRecord>,
    pub expired: Vec<CodeRecord>,
    pub added: usize,
}

impl MergeLedger {
    pub fn new(existing: Vec<CodeRecord>, policy: DedupPolicy, run_date: NaiveDate) -> Self {
        let seen = existing
            .iter()
            .map(|r| policy.key(&r.game, &r.code))
            .collect();
        Self {
            records: existing,
            seen,
            policy,
            run_date,
            added: 0,
        }
    }

    pub fn contains(&self, game: &str, code: &str) -> bool {
        self.seen.contains(&self.policy.key(game, code))
    }

    /// Check-and-insert. Returns `true` when a new record was appended.
    pub fn admit(&mut self, game: &str, code: &str) -> bool {
        if !self.seen.insert(self.policy.key(game, code)) {
            return false;
        }
        self.records
            .push(CodeRecord::new(game, code, self.run_date));
        self.added += 1;
        true
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop records whose expiry date is strictly before the run date and
    /// sort the rest.
    pub fn finish(self) -> MergeResult {
        let run_date = self.run_date;
        let (expired, mut records): (Vec<_>, Vec<_>) = self
            .records
            .into_iter()
            .partition(|r| r.is_expired(run_date));

        records.sort_by_cached_key(|r| (game_key(&r.game), r.game.clone(), r.code.clone(), r.verified_at));

        MergeResult {
            records,
            expired,
            added: self.added,
        }
    }
}

/// One-shot merge of `(game, code)` pairs into `existing`.
pub fn merge<I, G, C>(
    existing: Vec<CodeRecord>,
    fresh: I,
    policy: DedupPolicy,
    run_date: NaiveDate,
) -> MergeResult
where
    I: IntoIterator<Item = (G, C)>,
    G: AsRef<str>,
    C: AsRef<str>,
{
    let mut ledger = MergeLedger::new(existing, policy, run_date);
    for (game, code) in fresh {
        ledger.admit(game.as_ref(), code.as_ref());
    }
    ledger.finish()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn today() -> NaiveDate {
        date("2025-07-15")
    }

    fn record(game: &str, code: &str) -> CodeRecord {
        CodeRecord::new(game, code, date("2025-07-01"))
    }

    #[test]
    fn appends_new_codes_with_run_date() {
        let result = merge(vec![], [("G", "NEWCODE123")], DedupPolicy::Code, today());
        assert_eq!(result.records, vec![CodeRecord::new("G", "NEWCODE123", today())]);
        assert_eq!(result.added, 1);
    }

    #[test]
    fn existing_code_is_not_duplicated() {
        let existing = vec![record("G", "ABCD")];
        let result = merge(existing.clone(), [("G", "ABCD")], DedupPolicy::Code, today());
        assert_eq!(result.records, existing);
        assert_eq!(result.added, 0);
    }

    #[test]
    fn code_policy_is_cross_game() {
        let existing = vec![record("A", "SHARED1")];
        let code = merge(existing.clone(), [("B", "SHARED1")], DedupPolicy::Code, today());
        assert_eq!(code.records.len(), 1);

        let per_game = merge(existing, [("B", "SHARED1")], DedupPolicy::GameAndCode, today());
        assert_eq!(per_game.records.len(), 2);
    }

    #[test]
    fn duplicate_fresh_codes_collapse() {
        let result = merge(
            vec![],
            [("G", "DUPE1"), ("G", "DUPE1"), ("H", "DUPE1")],
            DedupPolicy::Code,
            today(),
        );
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].game, "G");
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let existing = vec![record("G", "ABCD"), record("B", "ZZZZ")];
        let fresh = [("G", "ABCD"), ("G", "EFGH"), ("A", "QRST")];

        let once = merge(existing, fresh, DedupPolicy::Code, today());
        let twice = merge(once.records.clone(), fresh, DedupPolicy::Code, today());

        assert_eq!(once.records, twice.records);
        assert_eq!(twice.added, 0);

        let codes: HashSet<&str> = twice.records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes.len(), twice.records.len(), "codes must be unique");
    }

    #[test]
    fn expiry_filter_drops_only_past_dates() {
        let mut yesterday = record("G", "OLD1");
        yesterday.expires_at = Some(date("2025-07-14"));
        let mut tomorrow = record("G", "SOON1");
        tomorrow.expires_at = Some(date("2025-07-16"));
        let mut on_the_day = record("G", "EDGE1");
        on_the_day.expires_at = Some(today());
        let open = record("G", "OPEN1");

        let result = merge(
            vec![yesterday.clone(), tomorrow.clone(), on_the_day.clone(), open.clone()],
            Vec::<(&str, &str)>::new(),
            DedupPolicy::Code,
            today(),
        );

        assert_eq!(result.expired, vec![yesterday]);
        assert_eq!(result.records, vec![on_the_day, open, tomorrow]);
    }

    #[test]
    fn expired_code_is_not_reintroduced() {
        let mut dead = record("G", "GONE1");
        dead.expires_at = Some(date("2025-07-01"));
        let result = merge(vec![dead], [("G", "GONE1")], DedupPolicy::Code, today());
        assert!(result.records.is_empty());
        assert_eq!(result.added, 0);
    }

    #[test]
    fn output_is_sorted_by_game_then_code() {
        let result = merge(
            vec![record("b", "ZZZZ")],
            [("a", "YYYY"), ("b", "AAAA"), ("a", "BBBB")],
            DedupPolicy::Code,
            today(),
        );
        let keys: Vec<(&str, &str)> = result
            .records
            .iter()
            .map(|r| (r.game.as_str(), r.code.as_str()))
            .collect();
        assert_eq!(keys, vec![("a", "BBBB"), ("a", "YYYY"), ("b", "AAAA"), ("b", "ZZZZ")]);
    }

    #[test]
    fn game_order_ignores_case() {
        let result = merge(
            vec![record("adopt me!", "ZZZZ"), record("Brookhaven", "BBBB")],
            [("Adopt Me!", "AAAA"), ("arsenal", "CCCC")],
            DedupPolicy::Code,
            today(),
        );
        let keys: Vec<(&str, &str)> = result
            .records
            .iter()
            .map(|r| (r.game.as_str(), r.code.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Adopt Me!", "AAAA"),
                ("adopt me!", "ZZZZ"),
                ("arsenal", "CCCC"),
                ("Brookhaven", "BBBB"),
            ]
        );
    }

    #[test]
    fn ledger_contains_tracks_admissions() {
        let mut ledger = MergeLedger::new(vec![record("G", "ABCD")], DedupPolicy::Code, today());
        assert!(ledger.contains("other", "ABCD"));
        assert!(!ledger.contains("G", "WXYZ"));
        assert!(ledger.admit("G", "WXYZ"));
        assert!(ledger.contains("G", "WXYZ"));
        assert!(!ledger.admit("G", "WXYZ"));
        assert_eq!(ledger.len(), 2);
    }
}
