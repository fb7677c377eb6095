//! Engine errors
//!
//! Rejected player commands. None of these leave the ledger changed, and a
//! UI is free to ignore them (the matching control is simply disabled).

use crate::features::crypt_raid::RaidError;
use crate::state::GameStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("Not allowed while {0}")]
    WrongState(GameStatus),

    #[error("Reel index {0} out of range")]
    InvalidReel(u8),

    #[error("Reel {0} already stopped")]
    ReelAlreadyStopped(u8),

    #[error("Relic cap of {0} reached")]
    RelicCapReached(usize),

    #[error("Insufficient funds: need {needed}, have {balance}")]
    InsufficientFunds { needed: i64, balance: i64 },

    #[error("No nudges left")]
    NoNudges,

    #[error("No win to bargain with")]
    NothingToBargain,

    #[error("Crypt raid: {0}")]
    Raid(#[from] RaidError),
}
