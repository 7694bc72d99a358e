//! Candidate extraction: one pattern, one capture group, every
//! non-overlapping match in order.

use regex::{CaptureMatches, Regex, RegexBuilder};

use codeharvest_common::HarvestError;

/// A compiled extraction pattern with exactly one capturing group.
#[derive(Debug, Clone)]
pub struct CandidatePattern {
    regex: Regex,
}

impl CandidatePattern {
    /// Patterns from source descriptors match regardless of case.
    pub fn case_insensitive(pattern: &str) -> Result<Self, HarvestError> {
        Self::build(pattern, true)
    }

    /// Shape patterns (e.g. "uppercase alphanumerics") where case matters.
    pub fn case_sensitive(pattern: &str) -> Result<Self, HarvestError> {
        Self::build(pattern, false)
    }

    fn build(pattern: &str, case_insensitive: bool) -> Result<Self, HarvestError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| HarvestError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        // captures_len counts the implicit whole-match group
        let groups = regex.captures_len() - 1;
        if groups != 1 {
            return Err(HarvestError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: format!("expected exactly one capturing group, found {groups}"),
            });
        }

        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Lazily yield the captured group of every match. Calling again with
    /// the same text yields the same sequence.
    pub fn candidates<'r, 'h>(&'r self, text: &'h str) -> Candidates<'r, 'h> {
        Candidates {
            inner: self.regex.captures_iter(text),
        }
    }
}

pub struct Candidates<'r, 'h> {
    inner: CaptureMatches<'r, 'h>,
}

impl<'r, 'h> Iterator for Candidates<'r, 'h> {
    type Item = &'h str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let caps = self.inner.next()?;
            // An optional group that did not participate yields nothing.
            if let Some(m) = caps.get(1) {
                return Some(m.as_str());
            }
        }
    }
}
