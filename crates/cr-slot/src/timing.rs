//! Presentation timing
//!
//! Delays the machine awaits between round phases, and the virtual timeline
//! that stamps stage events. Studio timing zeroes every delay so headless runs
//! and tests never sleep.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Instant (simulation and tests)
    Studio,
    /// Scaled from another profile
    Custom,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::Normal
    }
}

/// Detailed timing configuration (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub profile: TimingProfile,

    /// Reels spin this long unless every reel was stopped early
    pub reel_spin_duration_ms: f64,

    /// Gap between automatic reel stops on the timeline
    pub reel_stop_interval_ms: f64,

    /// Pause after the reels freeze, before evaluation
    pub settle_delay_ms: f64,

    /// How long a cascade win is shown before dissolving
    pub win_reveal_delay_ms: f64,

    /// Dissolve animation before the redraw
    pub dissolve_duration_ms: f64,

    /// Dark Bargain chalice reveal
    pub bargain_reveal_ms: f64,

    /// Crypt Raid linger after the hunter is revealed
    pub hunter_linger_ms: f64,

    /// Crypt Raid exit before settlement
    pub bonus_exit_ms: f64,
}

impl TimingConfig {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            reel_spin_duration_ms: 2500.0,
            reel_stop_interval_ms: 300.0,
            settle_delay_ms: 400.0,
            win_reveal_delay_ms: 1200.0,
            dissolve_duration_ms: 600.0,
            bargain_reveal_ms: 800.0,
            hunter_linger_ms: 2000.0,
            bonus_exit_ms: 1000.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            ..Self::normal().scaled(0.4)
        }
    }

    /// Studio mode: no waiting at all
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            ..Self::normal().scaled(0.0)
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        Self {
            profile: TimingProfile::Custom,
            reel_spin_duration_ms: self.reel_spin_duration_ms * factor,
            reel_stop_interval_ms: self.reel_stop_interval_ms * factor,
            settle_delay_ms: self.settle_delay_ms * factor,
            win_reveal_delay_ms: self.win_reveal_delay_ms * factor,
            dissolve_duration_ms: self.dissolve_duration_ms * factor,
            bargain_reveal_ms: self.bargain_reveal_ms * factor,
            hunter_linger_ms: self.hunter_linger_ms * factor,
            bonus_exit_ms: self.bonus_exit_ms * factor,
        }
    }

    /// Timeline length of one cascade step
    pub fn cascade_step_duration(&self) -> f64 {
        self.win_reveal_delay_ms + self.dissolve_duration_ms
    }

    pub fn is_instant(&self) -> bool {
        self.reel_spin_duration_ms <= 0.0
            && self.settle_delay_ms <= 0.0
            && self.cascade_step_duration() <= 0.0
            && self.bargain_reveal_ms <= 0.0
            && self.hunter_linger_ms <= 0.0
            && self.bonus_exit_ms <= 0.0
    }

    pub(crate) fn any_negative(&self) -> bool {
        [
            self.reel_spin_duration_ms,
            self.reel_stop_interval_ms,
            self.settle_delay_ms,
            self.win_reveal_delay_ms,
            self.dissolve_duration_ms,
            self.bargain_reveal_ms,
            self.hunter_linger_ms,
            self.bonus_exit_ms,
        ]
        .iter()
        .any(|ms| !ms.is_finite() || *ms < 0.0)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

/// Sleep for `ms` on the runtime clock. Zero returns immediately.
pub async fn pause(ms: f64) {
    if ms > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(ms / 1000.0)).await;
    }
}

/// Timestamp generator for sequential events
#[derive(Debug, Clone)]
pub struct TimestampGenerator {
    current_ms: f64,
    config: TimingConfig,
}

impl TimestampGenerator {
    pub fn new(config: TimingConfig) -> Self {
        Self {
            current_ms: 0.0,
            config,
        }
    }

    pub fn reset(&mut self) {
        self.current_ms = 0.0;
    }

    /// Get current timestamp
    pub fn current(&self) -> f64 {
        self.current_ms
    }

    /// Advance by duration and return new timestamp
    pub fn advance(&mut self, duration_ms: f64) -> f64 {
        self.current_ms += duration_ms.max(0.0);
        self.current_ms
    }

    /// Automatic stop of a reel that the player did not stop
    pub fn reel_stop(&mut self, reel_index: u8) -> f64 {
        if reel_index == 0 {
            self.advance(self.config.reel_spin_duration_ms)
        } else {
            self.advance(self.config.reel_stop_interval_ms)
        }
    }

    pub fn settle(&mut self) -> f64 {
        self.advance(self.config.settle_delay_ms)
    }

    pub fn win_reveal(&mut self) -> f64 {
        self.advance(self.config.win_reveal_delay_ms)
    }

    pub fn dissolve(&mut self) -> f64 {
        self.advance(self.config.dissolve_duration_ms)
    }

    pub fn bargain_reveal(&mut self) -> f64 {
        self.advance(self.config.bargain_reveal_ms)
    }

    pub fn hunter_linger(&mut self) -> f64 {
        self.advance(self.config.hunter_linger_ms)
    }

    pub fn bonus_exit(&mut self) -> f64 {
        self.advance(self.config.bonus_exit_ms)
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }
}
