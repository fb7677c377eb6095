//! Crypt Raid bonus
//!
//! Pick-a-coffin bonus entered on three castles:
//! - Five concealed cards: two coins, two bat swarms, one hunter
//! - Coins add to the haul, bat swarms add +1 to the multiplier
//! - The hunter ends the raid, unless a silver stake turns it into coins
//!
//! Settlement is `total_coins × multiplier`.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::CryptRaidConfig;

/// What a coffin holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Coin,
    /// Bat swarm, +1 multiplier
    Multiplier,
    Hunter,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coin => "coin",
            Self::Multiplier => "multiplier",
            Self::Hunter => "hunter",
        }
    }
}

/// A single coffin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub kind: CardKind,
    /// Coin value; a mitigated hunter carries its doubled coin value here
    pub value: i64,
    pub revealed: bool,
}

/// Outcome of one pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardReveal {
    pub index: u8,
    pub kind: CardKind,
    /// Coins credited to the haul by this pick
    pub value: i64,
    /// Hunter revealed without a silver stake
    pub ended_by_hunter: bool,
    /// No further picks are possible
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RaidError {
    #[error("coffin {0} does not exist")]
    OutOfRange(u8),

    #[error("coffin {0} already opened")]
    AlreadyRevealed(u8),

    #[error("the raid is over")]
    RaidOver,
}

/// Live bonus round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptRaid {
    cards: Vec<Card>,
    total_coins: i64,
    multiplier: i64,
    mitigated: bool,
    finished: bool,
    hunter_found: bool,
}

impl CryptRaid {
    /// Deal a shuffled deck. Coin values are drawn first, then the deck is
    /// shuffled uniformly.
    pub fn deal<R: Rng + ?Sized>(
        bet: i64,
        mitigated: bool,
        config: &CryptRaidConfig,
        rng: &mut R,
    ) -> Self {
        let mut cards = Vec::with_capacity(config.deck_size());
        for _ in 0..config.coin_cards {
            let value = rng.random_range(config.coin_min..config.coin_max) * bet;
            cards.push(Card {
                kind: CardKind::Coin,
                value,
                revealed: false,
            });
        }
        for _ in 0..config.multiplier_cards {
            cards.push(Card {
                kind: CardKind::Multiplier,
                value: 0,
                revealed: false,
            });
        }
        for _ in 0..config.hunter_cards {
            let value = if mitigated {
                config.hunter_coin_factor * rng.random_range(config.coin_min..config.coin_max) * bet
            } else {
                0
            };
            cards.push(Card {
                kind: CardKind::Hunter,
                value,
                revealed: false,
            });
        }
        cards.shuffle(rng);

        log::debug!(
            "[CryptRaid] dealt {} coffins (silver stake: {})",
            cards.len(),
            mitigated
        );

        Self {
            cards,
            total_coins: 0,
            multiplier: 1,
            mitigated,
            finished: false,
            hunter_found: false,
        }
    }

    /// Open a coffin
    pub fn pick(&mut self, index: u8) -> Result<CardReveal, RaidError> {
        if self.finished {
            return Err(RaidError::RaidOver);
        }
        let card = self
            .cards
            .get_mut(index as usize)
            .ok_or(RaidError::OutOfRange(index))?;
        if card.revealed {
            return Err(RaidError::AlreadyRevealed(index));
        }
        card.revealed = true;
        let kind = card.kind;
        let card_value = card.value;

        let mut credited = 0;
        let mut ended_by_hunter = false;
        match kind {
            CardKind::Coin => credited = card_value,
            CardKind::Multiplier => self.multiplier += 1,
            CardKind::Hunter if self.mitigated => credited = card_value,
            CardKind::Hunter => {
                self.hunter_found = true;
                self.finished = true;
                ended_by_hunter = true;
            }
        }
        self.total_coins += credited;

        if self.cards.iter().all(|c| c.revealed) {
            self.finished = true;
        }

        Ok(CardReveal {
            index,
            kind,
            value: credited,
            ended_by_hunter,
            finished: self.finished,
        })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn total_coins(&self) -> i64 {
        self.total_coins
    }

    pub fn multiplier(&self) -> i64 {
        self.multiplier
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn hunter_found(&self) -> bool {
        self.hunter_found
    }

    pub fn is_mitigated(&self) -> bool {
        self.mitigated
    }

    /// Coins times multiplier
    pub fn settlement(&self) -> i64 {
        self.total_coins * self.multiplier
    }

    /// Indices still face down
    pub fn concealed(&self) -> Vec<u8> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.revealed)
            .map(|(i, _)| i as u8)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn deal(seed: u64, mitigated: bool) -> CryptRaid {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        CryptRaid::deal(10, mitigated, &CryptRaidConfig::default(), &mut rng)
    }

    fn index_of(raid: &CryptRaid, kind: CardKind) -> u8 {
        raid.cards().iter().position(|c| c.kind == kind).unwrap() as u8
    }

    #[test]
    fn test_deck_composition() {
        let raid = deal(1, false);
        let count = |k| raid.cards().iter().filter(|c| c.kind == k).count();
        assert_eq!(raid.cards().len(), 5);
        assert_eq!(count(CardKind::Coin), 2);
        assert_eq!(count(CardKind::Multiplier), 2);
        assert_eq!(count(CardKind::Hunter), 1);
        for card in raid.cards().iter().filter(|c| c.kind == CardKind::Coin) {
            assert!((50..200).contains(&card.value), "{}", card.value);
            assert_eq!(card.value % 10, 0);
        }
    }

    #[test]
    fn test_hunter_ends_raid() {
        let mut raid = deal(2, false);
        let coin = index_of(&raid, CardKind::Coin);
        let bats = index_of(&raid, CardKind::Multiplier);
        let hunter = index_of(&raid, CardKind::Hunter);

        let coin_value = raid.pick(coin).unwrap().value;
        raid.pick(bats).unwrap();
        let reveal = raid.pick(hunter).unwrap();

        assert!(reveal.ended_by_hunter);
        assert!(reveal.finished);
        assert_eq!(raid.settlement(), coin_value * 2);
        assert_eq!(raid.pick(0), Err(RaidError::RaidOver));
    }

    #[test]
    fn test_silver_stake_hunter_pays_double_coin() {
        let mut raid = deal(3, true);
        let hunter = index_of(&raid, CardKind::Hunter);
        let reveal = raid.pick(hunter).unwrap();

        assert!(!reveal.ended_by_hunter);
        assert!(!reveal.finished);
        assert!((100..400).contains(&reveal.value));
        assert_eq!(reveal.value % 20, 0);

        for index in raid.concealed() {
            raid.pick(index).unwrap();
        }
        assert!(raid.is_finished());
        assert!(!raid.hunter_found());
        let coins: i64 = raid
            .cards()
            .iter()
            .filter(|c| c.kind != CardKind::Multiplier)
            .map(|c| c.value)
            .sum();
        assert_eq!(raid.settlement(), coins * 3);
    }

    #[test]
    fn test_invalid_picks() {
        let mut raid = deal(4, false);
        assert_eq!(raid.pick(5), Err(RaidError::OutOfRange(5)));
        let bats = index_of(&raid, CardKind::Multiplier);
        raid.pick(bats).unwrap();
        assert_eq!(raid.pick(bats), Err(RaidError::AlreadyRevealed(bats)));
        assert_eq!(raid.multiplier(), 2);
    }

    #[test]
    fn test_shuffle_is_uniform_enough() {
        let mut hunter_positions = [0u32; 5];
        for seed in 0..2000 {
            let raid = deal(seed, false);
            hunter_positions[index_of(&raid, CardKind::Hunter) as usize] += 1;
        }
        for count in hunter_positions {
            assert!((300..500).contains(&count), "{hunter_positions:?}");
        }
    }
}
