//! Symbol catalog

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of reels on the machine
pub const REEL_COUNT: usize = 3;

/// Landed symbols, one per reel
pub type Reels = [SymbolId; REEL_COUNT];

/// Symbol identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SymbolId {
    Vampire = 0,
    Bat = 1,
    Coffin = 2,
    Blood = 3,
    Chalice = 4,
    Castle = 5,
    Candle = 6,
    Rose = 7,
}

/// Pays the progressive pool when it lands three-up on the first cascade step
pub const JACKPOT_SYMBOL: SymbolId = SymbolId::Vampire;

/// Three-up enters Crypt Raid instead of paying
pub const BONUS_SYMBOL: SymbolId = SymbolId::Castle;

/// A symbol definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub id: SymbolId,
    /// Display name
    pub name: &'static str,
    /// Bet multiplier for a triple
    pub multiplier: u32,
    /// Relative selection weight
    pub weight: u32,
}

/// The full catalog, highest paying first. Draw order follows this order.
pub const SYMBOLS: [Symbol; 8] = [
    Symbol { id: SymbolId::Vampire, name: "The Count", multiplier: 200, weight: 1 },
    Symbol { id: SymbolId::Bat, name: "Night Stalker", multiplier: 100, weight: 3 },
    Symbol { id: SymbolId::Coffin, name: "Eternal Rest", multiplier: 50, weight: 6 },
    Symbol { id: SymbolId::Blood, name: "Fresh Blood", multiplier: 30, weight: 10 },
    Symbol { id: SymbolId::Chalice, name: "Cursed Wine", multiplier: 20, weight: 15 },
    Symbol { id: SymbolId::Castle, name: "Dark Keep", multiplier: 10, weight: 20 },
    Symbol { id: SymbolId::Candle, name: "Soul Fire", multiplier: 5, weight: 25 },
    Symbol { id: SymbolId::Rose, name: "Withered Rose", multiplier: 2, weight: 35 },
];

/// Sum of all catalog weights
pub fn total_weight() -> u32 {
    SYMBOLS.iter().map(|s| s.weight).sum()
}

impl SymbolId {
    pub const ALL: [SymbolId; 8] = [
        Self::Vampire,
        Self::Bat,
        Self::Coffin,
        Self::Blood,
        Self::Chalice,
        Self::Castle,
        Self::Candle,
        Self::Rose,
    ];

    /// Catalog entry
    pub fn def(&self) -> &'static Symbol {
        &SYMBOLS[*self as usize]
    }

    pub fn multiplier(&self) -> u32 {
        self.def().multiplier
    }

    pub fn weight(&self) -> u32 {
        self.def().weight
    }

    pub fn name(&self) -> &'static str {
        self.def().name
    }

    /// Stable id used in stages and config
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vampire => "vampire",
            Self::Bat => "bat",
            Self::Coffin => "coffin",
            Self::Blood => "blood",
            Self::Chalice => "chalice",
            Self::Castle => "castle",
            Self::Candle => "candle",
            Self::Rose => "rose",
        }
    }

    pub fn is_jackpot(&self) -> bool {
        *self == JACKPOT_SYMBOL
    }

    pub fn is_bonus_trigger(&self) -> bool {
        *self == BONUS_SYMBOL
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown symbol '{s}'"))
    }
}

/// Stable ids of a reel set, for stages and oracle requests
pub fn reel_ids(reels: &Reels) -> Vec<String> {
    reels.iter().map(|s| s.as_str().to_string()).collect()
}

/// Display names of a reel set
pub fn reel_names(reels: &Reels) -> Vec<String> {
    reels.iter().map(|s| s.name().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_ids() {
        for (i, symbol) in SYMBOLS.iter().enumerate() {
            assert_eq!(symbol.id as usize, i);
            assert_eq!(SymbolId::ALL[i], symbol.id);
        }
        assert_eq!(total_weight(), 115);
    }

    #[test]
    fn test_special_symbols() {
        assert!(SymbolId::Vampire.is_jackpot());
        assert!(SymbolId::Castle.is_bonus_trigger());
        assert!(!SymbolId::Rose.is_jackpot());
        assert_eq!(SymbolId::Vampire.multiplier(), 200);
        assert_eq!(SymbolId::Rose.weight(), 35);
    }

    #[test]
    fn test_parse_and_serialize() {
        assert_eq!("coffin".parse::<SymbolId>().unwrap(), SymbolId::Coffin);
        assert!("garlic".parse::<SymbolId>().is_err());
        assert_eq!(serde_json::to_string(&SymbolId::Bat).unwrap(), "\"bat\"");
        assert_eq!(
            reel_ids(&[SymbolId::Rose, SymbolId::Bat, SymbolId::Castle]),
            vec!["rose", "bat", "castle"]
        );
    }
}
