//! Built-in curated sources. The config file's `[[sources]]` rows replace a
//! game's entries here wholesale.

use codeharvest_common::{SourceDescriptor, SourceTable};

/// Bulleted "* CODE - reward" lists.
const BULLET_DASH: &str = r"\*\s+([A-Za-z0-9_!]{4,40})\s+-";
/// Bulleted lists where the reward follows a colon or a space.
const BULLET_LOOSE: &str = r"\*\s+([A-Za-z0-9_!]{4,40})[\s:\-]";
const CODE_TAG: &str = r"<code>([^<\s]{4,40})</code>";
const STRONG_TAG: &str = r"<strong>([^<\s]{4,40})</strong>";

pub fn curated_sources() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("Blox Fruits", "https://www.pcgamesn.com/blox-fruits/codes", BULLET_DASH),
        ("Blox Fruits", "https://gamerant.com/blox-fruits-codes/", CODE_TAG),
        ("Shindo Life", "https://www.pockettactics.com/shindo-life/codes", BULLET_DASH),
        ("Shindo Life", "https://beebom.com/roblox-shindo-life-codes/", CODE_TAG),
        (
            "Bee Swarm Simulator",
            "https://beebom.com/roblox-bee-swarm-simulator-codes/",
            BULLET_LOOSE,
        ),
        (
            "Anime Champions Simulator",
            "https://beebom.com/roblox-anime-champions-simulator-codes/",
            STRONG_TAG,
        ),
        ("Blue Lock Rivals", "https://beebom.com/blue-lock-rivals-codes/", CODE_TAG),
        ("King Legacy", "https://www.pockettactics.com/king-legacy/codes", BULLET_DASH),
        ("Project Slayers", "https://www.pockettactics.com/project-slayers/codes", BULLET_DASH),
        (
            "All Star Tower Defense",
            "https://www.pockettactics.com/all-star-tower-defense/codes",
            BULLET_DASH,
        ),
        ("Blade Ball", "https://beebom.com/roblox-blade-ball-codes/", STRONG_TAG),
        ("Pet Simulator 99", "https://beebom.com/roblox-pet-simulator-99-codes/", STRONG_TAG),
        (
            "Weapon Fighting Simulator",
            "https://www.pockettactics.com/weapon-fighting-simulator/codes",
            BULLET_DASH,
        ),
        (
            "Anime Fighters Simulator",
            "https://www.pockettactics.com/anime-fighters-simulator/codes",
            BULLET_DASH,
        ),
    ]
}

pub fn default_sources() -> SourceTable {
    let mut table = SourceTable::new();
    for (game, url, pattern) in curated_sources() {
        table.insert(game, SourceDescriptor::curated(url, pattern));
    }
    table
}

#[cfg(test)]
mod tests {
    use codeharvest_common::config::PipelineConfig;
    use codeharvest_common::Tier;

    use super::*;
    use crate::pipeline::resolver::{SearchDefaults, SourceResolver, TierPlan};

    #[test]
    fn every_builtin_pattern_compiles() {
        let defaults = SearchDefaults::from_config(&PipelineConfig::default()).unwrap();
        assert!(SourceResolver::new(default_sources(), defaults).is_ok());
    }

    #[test]
    fn builtin_games_start_with_curated_tier() {
        let defaults = SearchDefaults::from_config(&PipelineConfig::default()).unwrap();
        let resolver = SourceResolver::new(default_sources(), defaults).unwrap();

        let plan = resolver.plan("BLOX FRUITS");
        assert_eq!(plan[0].tier(), Tier::Curated);
        let TierPlan::Curated { sources } = &plan[0] else {
            panic!("expected curated tier");
        };
        assert_eq!(sources.len(), 2);

        assert_eq!(resolver.plan("Brookhaven")[0].tier(), Tier::FallbackSearch);
    }

    #[test]
    fn bullet_pattern_reads_reward_lists() {
        let re = regex::Regex::new(BULLET_DASH).unwrap();
        let caps: Vec<&str> = re
            .captures_iter("* SUB2GAMERROBOT_RESET1 - stat reset\n* Enyu_is_Pro - 20 min 2x")
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(caps, vec!["SUB2GAMERROBOT_RESET1", "Enyu_is_Pro"]);
    }
}
