//! Weighted symbol draw

use rand::Rng;

use crate::symbols::{REEL_COUNT, Reels, SYMBOLS, SymbolId, total_weight};

/// Draw one symbol with probability `weight / total_weight`.
///
/// Walks the catalog in order, subtracting weights until the roll lands.
pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> SymbolId {
    let mut roll = rng.random_range(0..total_weight());
    for symbol in &SYMBOLS {
        if roll < symbol.weight {
            return symbol.id;
        }
        roll -= symbol.weight;
    }
    SYMBOLS[SYMBOLS.len() - 1].id
}

/// Draw a full set of reels, left to right
pub fn draw_reels<R: Rng + ?Sized>(rng: &mut R) -> Reels {
    let mut reels = [SymbolId::Rose; REEL_COUNT];
    for reel in reels.iter_mut() {
        *reel = draw(rng);
    }
    reels
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_draw_frequencies_converge() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let draws = 230_000;
        let mut counts = [0u32; 8];
        for _ in 0..draws {
            counts[draw(&mut rng) as usize] += 1;
        }

        for symbol in &SYMBOLS {
            let expected = symbol.weight as f64 / 115.0;
            let observed = counts[symbol.id as usize] as f64 / draws as f64;
            assert!(
                (observed - expected).abs() < 0.005,
                "{}: observed {observed:.4}, expected {expected:.4}",
                symbol.id
            );
        }
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let mut a = ChaCha8Rng::seed_from_u64(9);
        let mut b = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(draw_reels(&mut a), draw_reels(&mut b));
        }
    }
}
