//! Game state and its reducer
//!
//! [`GameState`] is the single authoritative ledger: balance, jackpot,
//! progression and every round-facing field. It only changes through
//! [`GameState::reduce`], a pure function of `(state, action, economy)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EconomyConfig;
use crate::relics::RelicId;
use crate::symbols::{REEL_COUNT, Reels, SymbolId};

/// Machine status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Idle,
    Spinning,
    Win,
    Loss,
    Bonus,
    Bargain,
    Nudging,
    Altar,
    /// Reserved. Nothing transitions here.
    Encounter,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Spinning => "spinning",
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Bonus => "bonus",
            Self::Bargain => "bargain",
            Self::Nudging => "nudging",
            Self::Altar => "altar",
            Self::Encounter => "encounter",
        }
    }

    /// A new spin may be requested from here
    pub fn accepts_spin(&self) -> bool {
        matches!(self, Self::Idle | Self::Loss | Self::Nudging)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every transition the ledger knows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    StartSpin,
    StopReel { index: u8 },
    ResolveSpin,
    SetReels { reels: Reels },
    SetWin { amount: i64, indices: Vec<u8>, is_jackpot: bool },
    SetStatus { status: GameStatus },
    UpdateBalance { amount: i64 },
    SetOracle { fortune: String, loading: bool },
    AdjustBet { amount: i64 },
    TriggerNudge { count: u32 },
    ConsumeNudge { index: u8, symbol: SymbolId },
    CollectWin,
    SetDissolve { indices: Vec<u8> },
    AddRelic { relic: RelicId, cost: i64 },
    GainXp { amount: u32 },
    OpenAltar,
    CloseAltar,
    ResetJackpot,
    SetMultiplier { multiplier: u32 },
}

/// Session ledger plus round-facing fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub balance: i64,
    pub bet: i64,
    pub jackpot: f64,
    pub status: GameStatus,
    pub reels: Reels,
    pub winning_indices: Vec<u8>,
    /// Accumulated win of the current (or last) round
    pub last_win: i64,
    pub is_jackpot_win: bool,
    pub multiplier: u32,
    pub dissolving: Vec<u8>,
    pub stopped_reels: [bool; REEL_COUNT],
    pub nudge_available: u32,
    pub oracle_fortune: String,
    pub loading_oracle: bool,
    /// Purchase order
    pub relics: Vec<RelicId>,
    pub xp: u32,
    pub level: u32,
    pub spins_since_last_altar: u32,
}

impl GameState {
    pub fn new(economy: &EconomyConfig) -> Self {
        Self {
            balance: economy.initial_balance,
            bet: economy.min_bet,
            jackpot: economy.initial_jackpot,
            status: GameStatus::Idle,
            reels: [SymbolId::Rose; REEL_COUNT],
            winning_indices: Vec::new(),
            last_win: 0,
            is_jackpot_win: false,
            multiplier: 1,
            dissolving: Vec::new(),
            stopped_reels: [false; REEL_COUNT],
            nudge_available: 0,
            oracle_fortune: String::new(),
            loading_oracle: false,
            relics: Vec::new(),
            xp: 0,
            level: 1,
            spins_since_last_altar: 0,
        }
    }

    /// Apply `action` to a copy of this state
    pub fn reduce(&self, action: &Action, economy: &EconomyConfig) -> GameState {
        let mut next = self.clone();
        match action {
            Action::StartSpin => {
                next.status = GameStatus::Spinning;
                next.balance -= self.bet;
                next.jackpot += self.bet as f64 * economy.jackpot_contribution;
                next.stopped_reels = [false; REEL_COUNT];
                next.winning_indices.clear();
                next.multiplier = 1;
                next.last_win = 0;
                next.is_jackpot_win = false;
                next.oracle_fortune.clear();
                next.loading_oracle = true;
                next.dissolving.clear();
                next.nudge_available = 0;
                next.spins_since_last_altar += 1;
            }
            Action::StopReel { index } => {
                if let Some(stopped) = next.stopped_reels.get_mut(*index as usize) {
                    *stopped = true;
                }
            }
            Action::ResolveSpin => {
                next.stopped_reels = [true; REEL_COUNT];
            }
            Action::SetReels { reels } => {
                next.reels = *reels;
            }
            Action::SetWin {
                amount,
                indices,
                is_jackpot,
            } => {
                next.last_win = *amount;
                next.winning_indices = indices.clone();
                next.is_jackpot_win = next.is_jackpot_win || *is_jackpot;
                next.status = GameStatus::Win;
            }
            Action::SetStatus { status } => {
                next.status = *status;
            }
            Action::UpdateBalance { amount } => {
                next.balance += amount;
            }
            Action::SetOracle { fortune, loading } => {
                next.oracle_fortune = fortune.clone();
                next.loading_oracle = *loading;
            }
            Action::AdjustBet { amount } => {
                next.bet = (self.bet + amount).max(economy.min_bet);
            }
            Action::TriggerNudge { count } => {
                next.status = GameStatus::Nudging;
                next.nudge_available = *count;
                next.loading_oracle = false;
            }
            Action::ConsumeNudge { index, symbol } => {
                if let Some(reel) = next.reels.get_mut(*index as usize) {
                    *reel = *symbol;
                }
                next.nudge_available = self.nudge_available.saturating_sub(1);
                if next.nudge_available == 0 {
                    next.status = GameStatus::Idle;
                }
            }
            Action::CollectWin => {
                next.status = GameStatus::Idle;
            }
            Action::SetDissolve { indices } => {
                next.dissolving = indices.clone();
            }
            Action::AddRelic { relic, cost } => {
                if self.relics.len() < economy.relic_cap {
                    next.relics.push(*relic);
                    next.balance -= cost;
                }
            }
            Action::GainXp { amount } => {
                next.xp = self.xp.saturating_add(*amount);
                if next.xp >= economy.xp_per_level {
                    next.xp -= economy.xp_per_level;
                    next.level += 1;
                }
            }
            Action::OpenAltar => {
                next.status = GameStatus::Altar;
                next.spins_since_last_altar = 0;
                next.nudge_available = 0;
            }
            Action::CloseAltar => {
                next.status = GameStatus::Idle;
            }
            Action::ResetJackpot => {
                next.jackpot = economy.initial_jackpot;
            }
            Action::SetMultiplier { multiplier } => {
                next.multiplier = *multiplier;
            }
        }
        next
    }

    pub fn can_afford_spin(&self) -> bool {
        self.balance >= self.bet
    }

    pub fn altar_due(&self, economy: &EconomyConfig) -> bool {
        self.spins_since_last_altar >= economy.altar_frequency
    }

    pub fn all_reels_stopped(&self) -> bool {
        self.stopped_reels.iter().all(|s| *s)
    }

    pub fn relics_full(&self, economy: &EconomyConfig) -> bool {
        self.relics.len() >= economy.relic_cap
    }

    pub fn relic_count(&self, relic: RelicId) -> usize {
        self.relics.iter().filter(|r| **r == relic).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (GameState, EconomyConfig) {
        let economy = EconomyConfig::default();
        (GameState::new(&economy), economy)
    }

    #[test]
    fn test_initial_ledger() {
        let (state, _) = fresh();
        assert_eq!(state.balance, 1000);
        assert_eq!(state.bet, 10);
        assert_eq!(state.jackpot, 5000.0);
        assert_eq!(state.level, 1);
        assert_eq!(state.status, GameStatus::Idle);
    }

    #[test]
    fn test_start_spin_charges_bet() {
        let (state, economy) = fresh();
        let state = state.reduce(&Action::AdjustBet { amount: 40 }, &economy);
        let next = state.reduce(&Action::StartSpin, &economy);

        assert_eq!(next.balance, state.balance - 50);
        assert!((next.jackpot - 5001.0).abs() < 1e-9);
        assert_eq!(next.spins_since_last_altar, 1);
        assert_eq!(next.status, GameStatus::Spinning);
        assert_eq!(next.multiplier, 1);
        assert!(next.loading_oracle);
    }

    #[test]
    fn test_xp_single_level_per_grant() {
        let (state, economy) = fresh();
        for (gain, level, xp) in [(100, 2, 0), (150, 2, 50), (250, 2, 150), (99, 1, 99)] {
            let next = state.reduce(&Action::GainXp { amount: gain }, &economy);
            assert_eq!((next.level, next.xp), (level, xp), "gain {gain}");
        }
    }

    #[test]
    fn test_relic_cap() {
        let (mut state, economy) = fresh();
        for _ in 0..5 {
            state = state.reduce(
                &Action::AddRelic {
                    relic: RelicId::BatWing,
                    cost: 150,
                },
                &economy,
            );
        }
        assert_eq!(state.balance, 250);
        assert!(state.relics_full(&economy));

        let next = state.reduce(
            &Action::AddRelic {
                relic: RelicId::CursedHeart,
                cost: 400,
            },
            &economy,
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_bet_clamped_to_minimum() {
        let (state, economy) = fresh();
        let next = state.reduce(&Action::AdjustBet { amount: -10 }, &economy);
        assert_eq!(next.bet, 10);
    }

    #[test]
    fn test_last_nudge_returns_to_idle() {
        let (state, economy) = fresh();
        let state = state.reduce(&Action::TriggerNudge { count: 2 }, &economy);
        let state = state.reduce(
            &Action::ConsumeNudge {
                index: 0,
                symbol: SymbolId::Bat,
            },
            &economy,
        );
        assert_eq!(state.status, GameStatus::Nudging);
        assert_eq!(state.reels[0], SymbolId::Bat);

        let state = state.reduce(
            &Action::ConsumeNudge {
                index: 2,
                symbol: SymbolId::Coffin,
            },
            &economy,
        );
        assert_eq!(state.status, GameStatus::Idle);
        assert_eq!(state.nudge_available, 0);
        assert_eq!(state.reels[2], SymbolId::Coffin);
    }

    #[test]
    fn test_altar_open_resets_counter() {
        let (mut state, economy) = fresh();
        state.spins_since_last_altar = 10;
        assert!(state.altar_due(&economy));

        let opened = state.reduce(&Action::OpenAltar, &economy);
        assert_eq!(opened.spins_since_last_altar, 0);
        assert_eq!(opened.status, GameStatus::Altar);

        let closed = opened.reduce(&Action::CloseAltar, &economy);
        assert_eq!(closed.spins_since_last_altar, 0);
        assert_eq!(closed.status, GameStatus::Idle);
    }

    #[test]
    fn test_jackpot_reset() {
        let (mut state, economy) = fresh();
        state.jackpot = 7321.4;
        let next = state.reduce(&Action::ResetJackpot, &economy);
        assert_eq!(next.jackpot, 5000.0);
    }
}
