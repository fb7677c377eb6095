//! # cr-slot: Crimson Reels engine
//!
//! A three-reel cascading slot with roguelike progression. Wins dissolve and
//! redraw with a climbing multiplier, relics bend the rules, and three mini
//! games hang off the main loop.
//!
//! ## Architecture
//!
//! ```text
//! SlotMachine
//!     │
//!     ├── GameState::reduce (the only ledger mutation)
//!     ├── selector / evaluator / RelicModifiers
//!     ├── features: CryptRaid, DarkBargain, BloodAltar
//!     └── Oracle (cr-oracle), CueDispatcher + StageTrace (cr-stage)
//!           │
//!           v
//!     Round + Vec<StageEvent>
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut machine = SlotMachine::with_seed(SlotConfig::studio(), 7);
//! if let SpinOutcome::Resolved(round) = machine.spin().await {
//!     if round.is_win() {
//!         machine.collect_win()?;
//!     }
//! }
//! ```

pub mod config;
pub mod debug;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod machine;
pub mod relics;
pub mod round;
pub mod selector;
pub mod state;
pub mod stats;
pub mod symbols;
pub mod timing;

pub use config::*;
pub use debug::*;
pub use error::*;
pub use evaluator::*;
pub use features::{
    AltarOffer, BargainChoice, BargainResult, Card, CardKind, CardReveal, CryptRaid, RaidError,
};
pub use machine::*;
pub use relics::*;
pub use round::*;
pub use selector::{draw, draw_reels};
pub use state::*;
pub use stats::*;
pub use symbols::*;
pub use timing::*;
