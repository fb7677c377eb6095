//! Stage: The core enum defining every observable round moment
//!
//! A Stage is NOT an animation and NOT a reducer action.
//! A Stage is the SEMANTIC MEANING of a moment in the round flow.

use serde::{Deserialize, Serialize};

use crate::cue::AudioCue;

/// Canonical round stage
///
/// Symbol, status and relic names are carried as strings so this crate stays
/// a leaf: the engine owns those types and stamps their stable ids in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    // ═══════════════════════════════════════════════════════════════════════
    // SPIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Spin accepted, bet reserved
    SpinStart {
        /// Bet charged for this spin
        bet: i64,
    },

    /// Spin request refused (insufficient funds, busy, already spinning)
    SpinRejected {
        /// Rejection reason id
        reason: String,
    },

    /// Reel has stopped on its landed symbol
    ReelStop {
        /// Which reel (0-indexed)
        reel_index: u8,
        /// Landed symbol id
        symbol: String,
        /// Stopped by the player rather than the automatic timeout
        #[serde(default)]
        manual: bool,
    },

    /// All reels stopped, landed symbols being evaluated
    EvaluateWins,

    /// Round settled
    SpinEnd {
        /// Accumulated win of the round (0 on loss)
        total_win: i64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // STATUS & CONTROLS
    // ═══════════════════════════════════════════════════════════════════════
    /// Machine status changed
    StatusChange {
        /// Previous status id
        from: String,
        /// New status id
        to: String,
    },

    /// Bet adjusted by the player
    BetChange {
        /// New bet
        bet: i64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // WIN & CASCADE
    // ═══════════════════════════════════════════════════════════════════════
    /// A winning cascade step was settled
    CascadeStep {
        /// Step index within the round (0 = landed reels)
        step_index: u32,
        /// Base cascade multiplier for this step
        multiplier: u32,
        /// Payout credited by this step
        step_win: i64,
        /// Reels that formed the win
        winning_reels: Vec<u8>,
    },

    /// Winning reels dissolving before redraw
    Dissolve {
        /// Reels being dissolved
        reels: Vec<u8>,
    },

    /// Dissolved reels refilled with fresh draws
    Redraw {
        /// Reels that were redrawn
        reels: Vec<u8>,
        /// New symbol ids, one per redrawn reel
        symbols: Vec<String>,
    },

    /// Jackpot pool paid out
    JackpotWin {
        /// Amount paid from the pool
        amount: i64,
    },

    /// Round ended on a win
    WinPresent {
        /// Total round win
        win_amount: i64,
    },

    /// Player collected the win
    WinCollect {
        /// Collected amount
        amount: i64,
    },

    /// Round ended without a win
    Loss,

    /// Blood chalice refund on a loss
    LossRebate {
        /// Refunded amount
        amount: i64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // PROGRESSION
    // ═══════════════════════════════════════════════════════════════════════
    /// Player levelled up
    LevelUp {
        /// New level
        level: u32,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // NUDGE
    // ═══════════════════════════════════════════════════════════════════════
    /// Near miss rewarded with nudges
    NudgeGranted {
        /// Number of nudges available
        count: u32,
    },

    /// A nudge redrew one reel
    NudgeApplied {
        /// Reel that was redrawn
        reel_index: u8,
        /// New symbol id
        symbol: String,
        /// Nudges left after this one
        remaining: u32,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // BONUS (CRYPT RAID)
    // ═══════════════════════════════════════════════════════════════════════
    /// Bonus round entered
    BonusEnter,

    /// A concealed card was revealed
    CardReveal {
        /// Card position
        card_index: u8,
        /// Card kind id ("coin", "multiplier", "hunter")
        card: String,
        /// Coin value credited by this card (0 for non-coins)
        #[serde(default)]
        value: i64,
    },

    /// Hunter card drawn
    HunterFound {
        /// Silver stake turned the hunter into coins
        mitigated: bool,
    },

    /// Bonus round settled
    BonusExit {
        /// Settlement credited to balance
        win: i64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // GAMBLE (DARK BARGAIN)
    // ═══════════════════════════════════════════════════════════════════════
    /// Player risked the last win
    BargainStart {
        /// Amount at stake
        stake: i64,
    },

    /// Bargain resolved
    BargainResult {
        /// Player won the draw
        won: bool,
        /// Balance delta magnitude
        amount: i64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // ALTAR
    // ═══════════════════════════════════════════════════════════════════════
    /// Relic shop opened instead of a spin
    AltarOpen,

    /// Relic bought or granted
    RelicAcquired {
        /// Relic id
        relic: String,
        /// Coins paid (0 for debug grants)
        cost: i64,
    },

    /// Relic shop closed
    AltarClose,

    // ═══════════════════════════════════════════════════════════════════════
    // ORACLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Oracle commentary resolved
    OracleLine {
        /// Fortune category id
        category: String,
        /// Text shown to the player
        text: String,
    },
}

impl Stage {
    /// Get the stage category for grouping
    pub fn category(&self) -> StageCategory {
        match self {
            Stage::SpinStart { .. }
            | Stage::SpinRejected { .. }
            | Stage::ReelStop { .. }
            | Stage::EvaluateWins
            | Stage::SpinEnd { .. } => StageCategory::SpinLifecycle,

            Stage::StatusChange { .. } | Stage::BetChange { .. } => StageCategory::Control,

            Stage::CascadeStep { .. } | Stage::Dissolve { .. } | Stage::Redraw { .. } => {
                StageCategory::Cascade
            }

            Stage::JackpotWin { .. }
            | Stage::WinPresent { .. }
            | Stage::WinCollect { .. }
            | Stage::Loss
            | Stage::LossRebate { .. } => StageCategory::Settlement,

            Stage::LevelUp { .. } => StageCategory::Progression,

            Stage::NudgeGranted { .. } | Stage::NudgeApplied { .. } => StageCategory::Nudge,

            Stage::BonusEnter
            | Stage::CardReveal { .. }
            | Stage::HunterFound { .. }
            | Stage::BonusExit { .. } => StageCategory::Bonus,

            Stage::BargainStart { .. } | Stage::BargainResult { .. } => StageCategory::Gamble,

            Stage::AltarOpen | Stage::RelicAcquired { .. } | Stage::AltarClose => {
                StageCategory::Altar
            }

            Stage::OracleLine { .. } => StageCategory::Oracle,
        }
    }

    /// Get a simple string name for this stage type
    pub fn type_name(&self) -> &'static str {
        match self {
            Stage::SpinStart { .. } => "spin_start",
            Stage::SpinRejected { .. } => "spin_rejected",
            Stage::ReelStop { .. } => "reel_stop",
            Stage::EvaluateWins => "evaluate_wins",
            Stage::SpinEnd { .. } => "spin_end",
            Stage::StatusChange { .. } => "status_change",
            Stage::BetChange { .. } => "bet_change",
            Stage::CascadeStep { .. } => "cascade_step",
            Stage::Dissolve { .. } => "dissolve",
            Stage::Redraw { .. } => "redraw",
            Stage::JackpotWin { .. } => "jackpot_win",
            Stage::WinPresent { .. } => "win_present",
            Stage::WinCollect { .. } => "win_collect",
            Stage::Loss => "loss",
            Stage::LossRebate { .. } => "loss_rebate",
            Stage::LevelUp { .. } => "level_up",
            Stage::NudgeGranted { .. } => "nudge_granted",
            Stage::NudgeApplied { .. } => "nudge_applied",
            Stage::BonusEnter => "bonus_enter",
            Stage::CardReveal { .. } => "card_reveal",
            Stage::HunterFound { .. } => "hunter_found",
            Stage::BonusExit { .. } => "bonus_exit",
            Stage::BargainStart { .. } => "bargain_start",
            Stage::BargainResult { .. } => "bargain_result",
            Stage::AltarOpen => "altar_open",
            Stage::RelicAcquired { .. } => "relic_acquired",
            Stage::AltarClose => "altar_close",
            Stage::OracleLine { .. } => "oracle_line",
        }
    }

    /// All known stage type names
    pub fn all_type_names() -> &'static [&'static str] {
        &[
            "spin_start",
            "spin_rejected",
            "reel_stop",
            "evaluate_wins",
            "spin_end",
            "status_change",
            "bet_change",
            "cascade_step",
            "dissolve",
            "redraw",
            "jackpot_win",
            "win_present",
            "win_collect",
            "loss",
            "loss_rebate",
            "level_up",
            "nudge_granted",
            "nudge_applied",
            "bonus_enter",
            "card_reveal",
            "hunter_found",
            "bonus_exit",
            "bargain_start",
            "bargain_result",
            "altar_open",
            "relic_acquired",
            "altar_close",
            "oracle_line",
        ]
    }

    /// Check if a type name is known
    pub fn is_valid_type_name(name: &str) -> bool {
        Self::all_type_names().contains(&name)
    }

    /// Audio cues this stage fires, in play order
    pub fn cues(&self) -> Vec<AudioCue> {
        match self {
            Stage::SpinStart { .. } => vec![AudioCue::SpinStart],
            Stage::ReelStop { manual: true, .. } => vec![AudioCue::Click],
            Stage::EvaluateWins => vec![AudioCue::SpinStop],
            Stage::BetChange { .. } => vec![AudioCue::BetAdjust],
            Stage::CascadeStep { .. } => vec![AudioCue::Win],
            Stage::Loss => vec![AudioCue::Loss],
            Stage::BonusEnter => vec![AudioCue::BonusStart],
            Stage::CardReveal { card, .. } if card == "multiplier" => {
                vec![AudioCue::CardReveal, AudioCue::Swarm]
            }
            Stage::CardReveal { .. } => vec![AudioCue::CardReveal],
            Stage::HunterFound { mitigated: false } => vec![AudioCue::HunterSting],
            Stage::BargainStart { .. } => vec![AudioCue::CardReveal],
            Stage::AltarClose | Stage::RelicAcquired { .. } => vec![AudioCue::Click],
            _ => Vec::new(),
        }
    }

    /// Stages that end a round (the machine is ready for the next command)
    pub fn is_round_terminal(&self) -> bool {
        matches!(
            self,
            Stage::SpinEnd { .. } | Stage::NudgeGranted { .. } | Stage::BonusEnter
        )
    }
}

/// Stage category for grouping and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    SpinLifecycle,
    Control,
    Cascade,
    Settlement,
    Progression,
    Nudge,
    Bonus,
    Gamble,
    Altar,
    Oracle,
}

impl StageCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SpinLifecycle => "Spin Lifecycle",
            Self::Control => "Status/Controls",
            Self::Cascade => "Cascade",
            Self::Settlement => "Settlement",
            Self::Progression => "Progression",
            Self::Nudge => "Nudge",
            Self::Bonus => "Crypt Raid",
            Self::Gamble => "Dark Bargain",
            Self::Altar => "Blood Altar",
            Self::Oracle => "Oracle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        let stage = Stage::ReelStop {
            reel_index: 2,
            symbol: "bat".into(),
            manual: true,
        };
        let json = serde_json::to_string(&stage).unwrap();
        assert!(json.contains("reel_stop"));
        assert!(json.contains("reel_index"));

        let deserialized: Stage = serde_json::from_str(&json).unwrap();
        assert_eq!(stage, deserialized);
    }

    #[test]
    fn test_stage_category() {
        assert_eq!(Stage::EvaluateWins.category(), StageCategory::SpinLifecycle);
        assert_eq!(
            Stage::Dissolve { reels: vec![0, 1] }.category(),
            StageCategory::Cascade
        );
        assert_eq!(Stage::AltarOpen.category(), StageCategory::Altar);
    }

    #[test]
    fn test_type_names_are_registered() {
        let samples = [
            Stage::SpinStart { bet: 10 },
            Stage::Loss,
            Stage::BonusEnter,
            Stage::OracleLine {
                category: "win".into(),
                text: "x".into(),
            },
        ];
        for stage in samples {
            assert!(Stage::is_valid_type_name(stage.type_name()));
        }
        assert!(!Stage::is_valid_type_name("free_spins"));
    }

    #[test]
    fn test_cues() {
        assert_eq!(Stage::SpinStart { bet: 10 }.cues(), vec![AudioCue::SpinStart]);
        assert!(Stage::ReelStop {
            reel_index: 0,
            symbol: "rose".into(),
            manual: false
        }
        .cues()
        .is_empty());
        assert_eq!(
            Stage::CardReveal {
                card_index: 1,
                card: "multiplier".into(),
                value: 0
            }
            .cues(),
            vec![AudioCue::CardReveal, AudioCue::Swarm]
        );
        assert!(Stage::HunterFound { mitigated: true }.cues().is_empty());
    }
}
