//! Blood Altar shop view

use serde::Serialize;

use crate::config::EconomyConfig;
use crate::relics::{Relic, RelicId};
use crate::state::GameState;

/// One shelf of the altar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AltarOffer {
    pub relic: &'static Relic,
    pub cost: i64,
    pub affordable: bool,
    /// Copies already owned
    pub owned: usize,
    pub blocked_by_cap: bool,
}

impl AltarOffer {
    pub fn id(&self) -> RelicId {
        self.relic.id
    }

    /// Purchase would succeed right now
    pub fn purchasable(&self) -> bool {
        self.affordable && !self.blocked_by_cap
    }
}

/// The whole catalog as the player sees it
pub fn offers(state: &GameState, economy: &EconomyConfig) -> Vec<AltarOffer> {
    let full = state.relics_full(economy);
    RelicId::ALL
        .iter()
        .map(|id| {
            let relic = id.def();
            AltarOffer {
                relic,
                cost: relic.cost,
                affordable: state.balance >= relic.cost,
                owned: state.relic_count(*id),
                blocked_by_cap: full,
            }
        })
        .collect()
}
