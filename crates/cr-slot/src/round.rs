//! Round records
//!
//! A [`Round`] is the ephemeral result of one spin: the landed reels, every
//! settled cascade step and how the round ended.

use serde::{Deserialize, Serialize};

use crate::state::GameStatus;
use crate::symbols::Reels;

/// One winning cascade iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// 0 for the landed reels, then one per redraw
    pub index: u32,
    /// Reels as evaluated
    pub reels: Reels,
    pub winning_indices: Vec<u8>,
    pub payout_multiplier: u32,
    /// Base cascade multiplier
    pub multiplier: u32,
    /// Multiplier after relic boosts
    pub effective_multiplier: f64,
    pub step_win: i64,
    /// Paid from the jackpot pool
    pub jackpot: bool,
}

/// How a round settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Positive total, or the cascade bound was reached
    Win { total_win: i64 },
    /// Nothing won; rebate may be zero
    Loss { rebate: i64 },
    /// Near miss rewarded with nudges
    Nudge { count: u32 },
    /// Three castles
    Bonus,
}

impl RoundOutcome {
    /// Status the machine rests in after this outcome
    pub fn status(&self) -> GameStatus {
        match self {
            Self::Win { .. } => GameStatus::Win,
            Self::Loss { .. } => GameStatus::Loss,
            Self::Nudge { .. } => GameStatus::Nudging,
            Self::Bonus => GameStatus::Bonus,
        }
    }
}

/// Complete record of a resolved spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub bet: i64,
    /// Symbols the reels landed on
    pub landed: Reels,
    /// Reels after the last redraw
    pub final_reels: Reels,
    pub steps: Vec<CascadeStep>,
    pub total_win: i64,
    pub jackpot_paid: bool,
    /// The cascade bound cut the chain short
    pub hit_cascade_limit: bool,
    pub outcome: RoundOutcome,
}

impl Round {
    pub fn is_win(&self) -> bool {
        matches!(self.outcome, RoundOutcome::Win { .. })
    }

    pub fn cascade_depth(&self) -> usize {
        self.steps.len()
    }
}

/// Why a spin request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinRejection {
    AlreadySpinning,
    InsufficientFunds,
    /// Another flow owns the machine (win, bonus, bargain, altar)
    Busy(GameStatus),
}

impl SpinRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AlreadySpinning => "already_spinning",
            Self::InsufficientFunds => "insufficient_funds",
            Self::Busy(_) => "busy",
        }
    }
}

/// Answer to a spin request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpinRequest {
    /// Bet charged, reels spinning
    Started { bet: i64 },
    /// Altar due; nothing charged
    AltarOpened,
    Rejected { reason: SpinRejection },
}

/// Result of a full spin (request plus resolution)
#[derive(Debug, Clone, PartialEq)]
pub enum SpinOutcome {
    Resolved(Round),
    AltarOpened,
    Rejected(SpinRejection),
}

impl SpinOutcome {
    pub fn round(&self) -> Option<&Round> {
        match self {
            Self::Resolved(round) => Some(round),
            _ => None,
        }
    }
}
