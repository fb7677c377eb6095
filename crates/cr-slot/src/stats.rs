//! Session statistics

use serde::{Deserialize, Serialize};

use crate::round::{Round, RoundOutcome};

/// Running totals for one machine session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub total_bet: i64,
    /// Cascade wins, bonus settlements and net bargain gains
    pub total_win: i64,
    pub wins: u64,
    pub losses: u64,
    pub cascade_steps: u64,
    pub longest_cascade: u32,
    pub jackpots_won: u64,
    pub bonus_rounds: u64,
    pub bonus_win: i64,
    pub bargains_won: u64,
    pub bargains_lost: u64,
    pub nudges_granted: u64,
    pub relics_bought: u64,
    pub total_rebate: i64,
}

impl SessionStats {
    /// Return to player in percent
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0 {
            (self.total_win as f64 / self.total_bet as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Paying spins in percent
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn record_spin(&mut self, bet: i64) {
        self.total_spins += 1;
        self.total_bet += bet;
    }

    pub fn record_round(&mut self, round: &Round) {
        let depth = round.steps.len() as u32;
        self.cascade_steps += depth as u64;
        self.longest_cascade = self.longest_cascade.max(depth);
        if round.jackpot_paid {
            self.jackpots_won += 1;
        }
        match round.outcome {
            RoundOutcome::Win { total_win } => {
                self.wins += 1;
                self.total_win += total_win;
            }
            RoundOutcome::Loss { rebate } => {
                self.losses += 1;
                self.total_rebate += rebate;
                self.total_win += rebate;
            }
            RoundOutcome::Nudge { count } => {
                self.losses += 1;
                self.nudges_granted += count as u64;
            }
            RoundOutcome::Bonus => self.bonus_rounds += 1,
        }
    }

    pub fn record_bonus(&mut self, amount: i64) {
        self.bonus_win += amount;
        self.total_win += amount;
    }

    pub fn record_bargain(&mut self, won: bool, stake: i64) {
        if won {
            self.bargains_won += 1;
            self.total_win += stake;
        } else {
            self.bargains_lost += 1;
            self.total_win -= stake;
        }
    }

    pub fn record_relic(&mut self) {
        self.relics_bought += 1;
    }
}
