use serde::Serialize;

use codeharvest_common::Tier;

/// Stats from a harvest run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct HarvestStats {
    pub games_total: u32,
    pub games_with_codes: u32,
    pub tier_hits: [u32; 3], // Curated, FallbackSearch, GenericHeuristic
    pub tiers_attempted: u32,
    pub sources_failed: u32,
    pub candidates_extracted: u32,
    pub candidates_rejected: u32,
    pub codes_admitted: u32,
    pub codes_duplicate: u32,
    pub codes_invalidated: u32,
    pub validation_unknown: u32,
    pub records_expired: u32,
    pub records_total: u32,
    pub games_in_store: u32,
}

impl HarvestStats {
    pub fn record_tier_hit(&mut self, tier: Tier) {
        self.tier_hits[tier.index()] += 1;
    }
}

impl std::fmt::Display for HarvestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Harvest Run Complete ===")?;
        writeln!(f, "Games:              {}", self.games_total)?;
        writeln!(f, "Games with codes:   {}", self.games_with_codes)?;
        writeln!(f, "Tiers attempted:    {}", self.tiers_attempted)?;
        writeln!(f, "Sources failed:     {}", self.sources_failed)?;
        writeln!(f, "\nResolved by tier:")?;
        writeln!(f, "  Curated:           {}", self.tier_hits[0])?;
        writeln!(f, "  Fallback search:   {}", self.tier_hits[1])?;
        writeln!(f, "  Generic heuristic: {}", self.tier_hits[2])?;
        writeln!(f, "\nCandidates:")?;
        writeln!(f, "  Extracted: {}", self.candidates_extracted)?;
        writeln!(f, "  Rejected:  {}", self.candidates_rejected)?;
        writeln!(f, "\nCodes:")?;
        writeln!(f, "  Admitted:    {}", self.codes_admitted)?;
        writeln!(f, "  Duplicate:   {}", self.codes_duplicate)?;
        if self.codes_invalidated > 0 || self.validation_unknown > 0 {
            writeln!(f, "  Invalidated: {}", self.codes_invalidated)?;
            writeln!(f, "  Unverified:  {}", self.validation_unknown)?;
        }
        writeln!(f, "\nStore:")?;
        writeln!(f, "  Expired dropped: {}", self.records_expired)?;
        write!(
            f,
            "  Saved {} codes for {} games",
            self.records_total, self.games_in_store
        )
    }
}
