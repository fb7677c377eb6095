//! Debug overrides
//!
//! Forced landings for QA and demos. A forced symbol wins over both the
//! drawn target and a landing reported by the presentation layer.

use serde::{Deserialize, Serialize};

use crate::symbols::{BONUS_SYMBOL, JACKPOT_SYMBOL, REEL_COUNT, Reels, SymbolId};

/// Canned override sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugPreset {
    /// Three castles
    TriggerBonus,
    /// Three vampires
    ForceJackpot,
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugOverrides {
    forced: [Option<SymbolId>; REEL_COUNT],
}

impl DebugOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force one reel. Out of range indices are ignored.
    pub fn force(&mut self, reel_index: u8, symbol: Option<SymbolId>) {
        if let Some(slot) = self.forced.get_mut(reel_index as usize) {
            *slot = symbol;
        }
    }

    pub fn force_all(&mut self, reels: Reels) {
        self.forced = reels.map(Some);
    }

    pub fn apply_preset(&mut self, preset: DebugPreset) {
        match preset {
            DebugPreset::TriggerBonus => self.force_all([BONUS_SYMBOL; REEL_COUNT]),
            DebugPreset::ForceJackpot => self.force_all([JACKPOT_SYMBOL; REEL_COUNT]),
            DebugPreset::Clear => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.forced = [None; REEL_COUNT];
    }

    pub fn forced(&self, reel_index: u8) -> Option<SymbolId> {
        self.forced.get(reel_index as usize).copied().flatten()
    }

    pub fn is_active(&self) -> bool {
        self.forced.iter().any(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let mut debug = DebugOverrides::new();
        assert!(!debug.is_active());

        debug.apply_preset(DebugPreset::TriggerBonus);
        assert_eq!(debug.forced(2), Some(SymbolId::Castle));

        debug.apply_preset(DebugPreset::ForceJackpot);
        assert_eq!(debug.forced(0), Some(SymbolId::Vampire));

        debug.apply_preset(DebugPreset::Clear);
        assert!(!debug.is_active());
    }

    #[test]
    fn test_single_reel() {
        let mut debug = DebugOverrides::new();
        debug.force(1, Some(SymbolId::Blood));
        debug.force(7, Some(SymbolId::Bat));
        assert_eq!(debug.forced(0), None);
        assert_eq!(debug.forced(1), Some(SymbolId::Blood));
        assert_eq!(debug.forced(7), None);
    }
}
