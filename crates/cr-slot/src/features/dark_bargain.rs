//! Dark Bargain: double-or-nothing on the last win

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which chalice the player reached for. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BargainChoice {
    Left,
    Right,
}

/// Settled bargain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BargainResult {
    pub choice: BargainChoice,
    pub won: bool,
    /// Amount at stake (the round's last win)
    pub stake: i64,
    /// Signed balance change
    pub delta: i64,
    pub oracle_line: String,
}

/// Fair coin flip, independent of the choice
pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.random_bool(0.5)
}

/// Balance change for a resolved stake
pub fn settle(stake: i64, won: bool) -> i64 {
    if won { stake } else { -stake }
}
