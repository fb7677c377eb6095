//! Relic catalog and the modifiers relics apply to a round

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::evaluator::has_single_adjacent_pair;
use crate::symbols::Reels;

/// Relic identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RelicId {
    BatWing = 0,
    CursedHeart = 1,
    SilverStake = 2,
    BloodChalice = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Unholy,
}

/// Catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relic {
    pub id: RelicId,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub cost: i64,
}

pub const RELICS: [Relic; 4] = [
    Relic {
        id: RelicId::BatWing,
        name: "Bat Wing",
        description: "Near misses grant nudges more often, and twice as many.",
        rarity: Rarity::Common,
        cost: 150,
    },
    Relic {
        id: RelicId::CursedHeart,
        name: "Cursed Heart",
        description: "Cascade multipliers beat half again as hard.",
        rarity: Rarity::Rare,
        cost: 400,
    },
    Relic {
        id: RelicId::SilverStake,
        name: "Silver Stake",
        description: "The hunter in the crypt pays out instead of ending the raid.",
        rarity: Rarity::Unholy,
        cost: 800,
    },
    Relic {
        id: RelicId::BloodChalice,
        name: "Blood Chalice",
        description: "Refunds a sip of every losing bet.",
        rarity: Rarity::Common,
        cost: 200,
    },
];

impl RelicId {
    pub const ALL: [RelicId; 4] = [
        Self::BatWing,
        Self::CursedHeart,
        Self::SilverStake,
        Self::BloodChalice,
    ];

    pub fn def(&self) -> &'static Relic {
        &RELICS[*self as usize]
    }

    pub fn cost(&self) -> i64 {
        self.def().cost
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BatWing => "bat_wing",
            Self::CursedHeart => "cursed_heart",
            Self::SilverStake => "silver_stake",
            Self::BloodChalice => "blood_chalice",
        }
    }
}

impl fmt::Display for RelicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelicId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown relic '{s}'"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MODIFIERS
// ═══════════════════════════════════════════════════════════════════════════

/// Stateless view of what the owned relics do
#[derive(Debug, Clone, Copy)]
pub struct RelicModifiers<'a> {
    relics: &'a [RelicId],
    rules: &'a RuleConfig,
}

impl<'a> RelicModifiers<'a> {
    pub fn new(relics: &'a [RelicId], rules: &'a RuleConfig) -> Self {
        Self { relics, rules }
    }

    pub fn owns(&self, relic: RelicId) -> bool {
        self.relics.contains(&relic)
    }

    pub fn count(&self, relic: RelicId) -> usize {
        self.relics.iter().filter(|r| **r == relic).count()
    }

    /// Cascade multiplier after relic boosts. Cursed heart counts once.
    pub fn effective_multiplier(&self, base: u32) -> f64 {
        if self.owns(RelicId::CursedHeart) {
            base as f64 * self.rules.cursed_heart_boost
        } else {
            base as f64
        }
    }

    pub fn nudge_chance(&self) -> f64 {
        if self.owns(RelicId::BatWing) {
            self.rules.bat_wing_nudge_chance
        } else {
            self.rules.nudge_chance
        }
    }

    pub fn nudge_count(&self) -> u32 {
        if self.owns(RelicId::BatWing) {
            self.rules.bat_wing_nudge_count
        } else {
            self.rules.nudge_count
        }
    }

    /// Roll for nudges on a result with no win. Only a single adjacent pair
    /// qualifies. Consumes one random draw only when the reels qualify.
    pub fn roll_nudge<R: Rng + ?Sized>(&self, reels: &Reels, rng: &mut R) -> Option<u32> {
        if !has_single_adjacent_pair(reels) {
            return None;
        }
        if rng.random::<f64>() < self.nudge_chance() {
            Some(self.nudge_count())
        } else {
            None
        }
    }

    /// Refund on a loss, stacking per blood chalice
    pub fn loss_rebate(&self, bet: i64) -> i64 {
        let per_chalice = bet * self.rules.rebate_percent as i64 / 100;
        per_chalice * self.count(RelicId::BloodChalice) as i64
    }

    /// Silver stake turns the Crypt Raid hunter into coins
    pub fn mitigates_hunter(&self) -> bool {
        self.owns(RelicId::SilverStake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolId::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_catalog() {
        assert_eq!(RelicId::SilverStake.cost(), 800);
        assert_eq!(RelicId::CursedHeart.def().rarity, Rarity::Rare);
        assert_eq!("blood_chalice".parse::<RelicId>().unwrap(), RelicId::BloodChalice);
        for (i, relic) in RELICS.iter().enumerate() {
            assert_eq!(relic.id as usize, i);
        }
    }

    #[test]
    fn test_cursed_heart_counts_once() {
        let rules = RuleConfig::default();
        let none = RelicModifiers::new(&[], &rules);
        assert_eq!(none.effective_multiplier(2), 2.0);

        let owned = [RelicId::CursedHeart, RelicId::CursedHeart];
        let hearts = RelicModifiers::new(&owned, &rules);
        assert_eq!(hearts.effective_multiplier(2), 3.0);
    }

    #[test]
    fn test_bat_wing_nudges() {
        let rules = RuleConfig::default();
        let plain = RelicModifiers::new(&[], &rules);
        assert_eq!(plain.nudge_chance(), 0.4);
        assert_eq!(plain.nudge_count(), 1);

        let owned = [RelicId::BatWing];
        let winged = RelicModifiers::new(&owned, &rules);
        assert_eq!(winged.nudge_chance(), 0.6);
        assert_eq!(winged.nudge_count(), 2);
    }

    #[test]
    fn test_nudge_needs_single_pair() {
        let rules = RuleConfig {
            nudge_chance: 1.0,
            ..Default::default()
        };
        let mods = RelicModifiers::new(&[], &rules);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(mods.roll_nudge(&[Rose, Rose, Bat], &mut rng), Some(1));
        assert_eq!(mods.roll_nudge(&[Rose, Bat, Castle], &mut rng), None);
        assert_eq!(mods.roll_nudge(&[Rose, Rose, Rose], &mut rng), None);
    }

    #[test]
    fn test_rebate_stacks() {
        let rules = RuleConfig::default();
        let owned = [RelicId::BloodChalice, RelicId::BatWing, RelicId::BloodChalice];
        let mods = RelicModifiers::new(&owned, &rules);
        assert_eq!(mods.loss_rebate(100), 10);
        // floor(10 * 0.05) = 0
        assert_eq!(mods.loss_rebate(10), 0);
        assert!(!mods.mitigates_hunter());
    }
}
