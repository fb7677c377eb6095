//! Mini-games
//!
//! ```text
//! SPINNING ──castles──> CryptRaid ──settle──> IDLE
//! WIN ──bargain──> DarkBargain ──50/50──> IDLE
//! request_spin ──every 10th──> BloodAltar ──close──> IDLE
//! ```

pub mod blood_altar;
pub mod crypt_raid;
pub mod dark_bargain;

pub use blood_altar::*;
pub use crypt_raid::*;
pub use dark_bargain::*;
