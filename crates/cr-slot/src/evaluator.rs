//! Win evaluation over three reels
//!
//! Rules are checked in order and the first match wins:
//! 1. All three equal: indices `[0,1,2]`, full multiplier.
//! 2. Reel 0 equals reel 1: indices `[0,1]`, one fifth of the multiplier (floored).
//! 3. Reel 1 equals reel 2: indices `[1,2]`, one fifth of the multiplier (floored).
//! 4. Anything else pays nothing.

use serde::{Deserialize, Serialize};

use crate::symbols::{Reels, SymbolId};

/// Pair pays this percentage of the symbol multiplier
pub const PAIR_PAYOUT_PERCENT: u32 = 20;

/// Which rule fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinRule {
    Triple,
    LeftPair,
    RightPair,
    NoWin,
}

/// Result of evaluating one set of reels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEvaluation {
    pub rule: WinRule,
    /// Matched symbol, if any rule but `NoWin` fired
    pub symbol: Option<SymbolId>,
    pub winning_indices: Vec<u8>,
    /// Bet multiplier before cascade boosts
    pub payout_multiplier: u32,
    /// Jackpot symbol triple
    pub is_jackpot_shape: bool,
}

impl WinEvaluation {
    fn no_win() -> Self {
        Self {
            rule: WinRule::NoWin,
            symbol: None,
            winning_indices: Vec::new(),
            payout_multiplier: 0,
            is_jackpot_shape: false,
        }
    }

    fn pair(rule: WinRule, symbol: SymbolId, indices: [u8; 2]) -> Self {
        Self {
            rule,
            symbol: Some(symbol),
            winning_indices: indices.to_vec(),
            payout_multiplier: symbol.multiplier() * PAIR_PAYOUT_PERCENT / 100,
            is_jackpot_shape: false,
        }
    }

    /// Any rule but `NoWin` fired. A rose pair is a win that pays nothing.
    pub fn is_win(&self) -> bool {
        !self.winning_indices.is_empty()
    }

    pub fn is_pair(&self) -> bool {
        matches!(self.rule, WinRule::LeftPair | WinRule::RightPair)
    }
}

/// Evaluate landed reels
pub fn evaluate(reels: &Reels) -> WinEvaluation {
    let [a, b, c] = *reels;

    if a == b && b == c {
        return WinEvaluation {
            rule: WinRule::Triple,
            symbol: Some(a),
            winning_indices: vec![0, 1, 2],
            payout_multiplier: a.multiplier(),
            is_jackpot_shape: a.is_jackpot(),
        };
    }
    if a == b {
        return WinEvaluation::pair(WinRule::LeftPair, a, [0, 1]);
    }
    if b == c {
        return WinEvaluation::pair(WinRule::RightPair, b, [1, 2]);
    }
    WinEvaluation::no_win()
}

/// Exactly one adjacent pair (not a triple)
pub fn has_single_adjacent_pair(reels: &Reels) -> bool {
    (reels[0] == reels[1]) != (reels[1] == reels[2])
}

/// Three bonus symbols
pub fn is_bonus_trigger(reels: &Reels) -> bool {
    reels.iter().all(|s| s.is_bonus_trigger())
}

#[cfg(test)]
mod tests {
    use super::*;
    use SymbolId::*;

    #[test]
    fn test_reference_examples() {
        let triple = evaluate(&[Rose, Rose, Rose]);
        assert_eq!(triple.winning_indices, vec![0, 1, 2]);
        assert_eq!(triple.payout_multiplier, 2);

        let left = evaluate(&[Bat, Bat, Castle]);
        assert_eq!(left.winning_indices, vec![0, 1]);
        assert_eq!(left.payout_multiplier, 20);

        let right = evaluate(&[Rose, Bat, Bat]);
        assert_eq!(right.winning_indices, vec![1, 2]);
        assert_eq!(right.payout_multiplier, 20);

        let none = evaluate(&[Rose, Bat, Castle]);
        assert!(none.winning_indices.is_empty());
        assert_eq!(none.payout_multiplier, 0);
        assert_eq!(none.rule, WinRule::NoWin);
    }

    #[test]
    fn test_exhaustive_512() {
        let mut fired = std::collections::HashMap::new();
        for &a in &SymbolId::ALL {
            for &b in &SymbolId::ALL {
                for &c in &SymbolId::ALL {
                    let eval = evaluate(&[a, b, c]);
                    *fired.entry(eval.rule).or_insert(0u32) += 1;

                    let (indices, payout): (Vec<u8>, u32) = if a == b && b == c {
                        (vec![0, 1, 2], a.multiplier())
                    } else if a == b {
                        (vec![0, 1], a.multiplier() / 5)
                    } else if b == c {
                        (vec![1, 2], b.multiplier() / 5)
                    } else {
                        (vec![], 0)
                    };
                    assert_eq!(eval.winning_indices, indices, "{a} {b} {c}");
                    assert_eq!(eval.payout_multiplier, payout, "{a} {b} {c}");
                    assert_eq!(eval.is_jackpot_shape, a == Vampire && b == a && c == a);
                    assert_eq!(
                        has_single_adjacent_pair(&[a, b, c]),
                        eval.is_pair(),
                        "{a} {b} {c}"
                    );
                }
            }
        }
        assert_eq!(fired[&WinRule::Triple], 8);
        assert_eq!(fired[&WinRule::LeftPair], 56);
        assert_eq!(fired[&WinRule::RightPair], 56);
        assert_eq!(fired[&WinRule::NoWin], 392);
    }

    #[test]
    fn test_rose_pair_wins_zero() {
        let left = evaluate(&[Rose, Rose, Candle]);
        assert!(left.is_win());
        assert_eq!(left.winning_indices, vec![0, 1]);
        assert_eq!(left.payout_multiplier, 0);

        let right = evaluate(&[Candle, Rose, Rose]);
        assert!(right.is_win());
        assert_eq!(right.winning_indices, vec![1, 2]);
        assert!(!evaluate(&[Rose, Candle, Rose]).is_win());
    }

    #[test]
    fn test_bonus_trigger() {
        assert!(is_bonus_trigger(&[Castle, Castle, Castle]));
        assert!(!is_bonus_trigger(&[Castle, Castle, Rose]));
    }
}
