//! Machine configuration
//!
//! Every section falls back to its defaults field by field, so a config file
//! only needs to name what it changes:
//!
//! ```yaml
//! economy:
//!   initial_balance: 5000
//! timing:
//!   reel_spin_duration_ms: 1000.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::timing::TimingConfig;

// ═══════════════════════════════════════════════════════════════════════════
// ECONOMY
// ═══════════════════════════════════════════════════════════════════════════

/// Balance, bet, jackpot and progression constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub initial_balance: i64,
    pub min_bet: i64,
    pub bet_increment: i64,
    /// Jackpot pool at session start and after every jackpot payout
    pub initial_jackpot: f64,
    /// Share of each bet fed into the jackpot pool
    pub jackpot_contribution: f64,
    pub xp_per_level: u32,
    /// XP for a winning step is `step / xp_win_divisor + xp_win_base`
    pub xp_win_divisor: i64,
    pub xp_win_base: u32,
    pub relic_cap: usize,
    /// Spins between altar visits
    pub altar_frequency: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1000,
            min_bet: 10,
            bet_increment: 10,
            initial_jackpot: 5000.0,
            jackpot_contribution: 0.02,
            xp_per_level: 100,
            xp_win_divisor: 10,
            xp_win_base: 5,
            relic_cap: 5,
            altar_frequency: 10,
        }
    }
}

impl EconomyConfig {
    /// XP granted for one winning cascade step
    pub fn xp_for_win(&self, step_win: i64) -> u32 {
        let scaled = step_win.max(0) / self.xp_win_divisor.max(1);
        u32::try_from(scaled)
            .unwrap_or(u32::MAX)
            .saturating_add(self.xp_win_base)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RULES
// ═══════════════════════════════════════════════════════════════════════════

/// Which reel a nudge redraws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeTargeting {
    /// Always reel 0, whatever the player picked
    FirstReel,
    /// The reel the player picked
    SelectedReel,
}

impl Default for NudgeTargeting {
    fn default() -> Self {
        Self::FirstReel
    }
}

/// Round rules and relic strengths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub nudge_chance: f64,
    pub bat_wing_nudge_chance: f64,
    pub nudge_count: u32,
    pub bat_wing_nudge_count: u32,
    pub nudge_targeting: NudgeTargeting,
    /// Cascade multiplier factor with a cursed heart
    pub cursed_heart_boost: f64,
    /// Percent of the bet refunded per blood chalice on a loss
    pub rebate_percent: u32,
    /// Hard bound on cascade iterations per round
    pub max_cascade_steps: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            nudge_chance: 0.4,
            bat_wing_nudge_chance: 0.6,
            nudge_count: 1,
            bat_wing_nudge_count: 2,
            nudge_targeting: NudgeTargeting::FirstReel,
            cursed_heart_boost: 1.5,
            rebate_percent: 5,
            max_cascade_steps: 100,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CRYPT RAID
// ═══════════════════════════════════════════════════════════════════════════

/// Deck composition and coin values for the bonus round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptRaidConfig {
    pub coin_cards: u8,
    pub multiplier_cards: u8,
    pub hunter_cards: u8,
    /// Coin value is `random_int[coin_min, coin_max) × bet`
    pub coin_min: i64,
    pub coin_max: i64,
    /// A mitigated hunter pays this many coin draws
    pub hunter_coin_factor: i64,
}

impl Default for CryptRaidConfig {
    fn default() -> Self {
        Self {
            coin_cards: 2,
            multiplier_cards: 2,
            hunter_cards: 1,
            coin_min: 5,
            coin_max: 20,
            hunter_coin_factor: 2,
        }
    }
}

impl CryptRaidConfig {
    pub fn deck_size(&self) -> usize {
        self.coin_cards as usize + self.multiplier_cards as usize + self.hunter_cards as usize
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SLOT CONFIG
// ═══════════════════════════════════════════════════════════════════════════

/// Complete machine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub economy: EconomyConfig,
    pub rules: RuleConfig,
    pub crypt_raid: CryptRaidConfig,
    pub timing: TimingConfig,
}

impl SlotConfig {
    /// Default rules with no presentation delays
    pub fn studio() -> Self {
        Self {
            timing: TimingConfig::studio(),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load by extension: `.json` is JSON, anything else is YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        log::info!("[Config] loaded {}", path.display());
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the machine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.economy;
        if e.min_bet <= 0 {
            return Err(ConfigError::Invalid("economy.min_bet must be positive".into()));
        }
        if e.bet_increment <= 0 {
            return Err(ConfigError::Invalid(
                "economy.bet_increment must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&e.jackpot_contribution) {
            return Err(ConfigError::Invalid(
                "economy.jackpot_contribution must be within [0, 1]".into(),
            ));
        }
        if e.initial_jackpot < 0.0 {
            return Err(ConfigError::Invalid(
                "economy.initial_jackpot must not be negative".into(),
            ));
        }
        if e.xp_per_level == 0 || e.xp_win_divisor <= 0 {
            return Err(ConfigError::Invalid(
                "economy xp settings must be positive".into(),
            ));
        }
        if e.relic_cap == 0 {
            return Err(ConfigError::Invalid("economy.relic_cap must be at least 1".into()));
        }

        let r = &self.rules;
        for (name, p) in [
            ("rules.nudge_chance", r.nudge_chance),
            ("rules.bat_wing_nudge_chance", r.bat_wing_nudge_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1]")));
            }
        }
        if r.cursed_heart_boost <= 0.0 {
            return Err(ConfigError::Invalid(
                "rules.cursed_heart_boost must be positive".into(),
            ));
        }
        if r.max_cascade_steps == 0 {
            return Err(ConfigError::Invalid(
                "rules.max_cascade_steps must be at least 1".into(),
            ));
        }

        let c = &self.crypt_raid;
        if c.coin_min < 0 || c.coin_min >= c.coin_max {
            return Err(ConfigError::Invalid(
                "crypt_raid coin range must be non-empty".into(),
            ));
        }
        if c.deck_size() == 0 || c.deck_size() > u8::MAX as usize {
            return Err(ConfigError::Invalid("crypt_raid deck size out of range".into()));
        }

        if self.timing.any_negative() {
            return Err(ConfigError::Invalid("timing delays must be non-negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingProfile;

    #[test]
    fn test_defaults_validate() {
        let config = SlotConfig::default();
        config.validate().unwrap();
        assert_eq!(config.economy.initial_balance, 1000);
        assert_eq!(config.rules.max_cascade_steps, 100);
        assert_eq!(config.crypt_raid.deck_size(), 5);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "economy:\n  initial_balance: 5000\nrules:\n  nudge_targeting: selected_reel\n";
        let config = SlotConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.economy.initial_balance, 5000);
        assert_eq!(config.economy.min_bet, 10);
        assert_eq!(config.rules.nudge_targeting, NudgeTargeting::SelectedReel);
        assert_eq!(config.timing.profile, TimingProfile::Normal);
    }

    #[test]
    fn test_yaml_and_json_roundtrip() {
        let mut config = SlotConfig::studio();
        config.economy.altar_frequency = 3;

        let yaml = config.to_yaml().unwrap();
        assert_eq!(SlotConfig::from_yaml_str(&yaml).unwrap(), config);

        let json = config.to_json().unwrap();
        assert_eq!(SlotConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let bad = [
            "economy:\n  min_bet: 0\n",
            "rules:\n  nudge_chance: 1.5\n",
            "economy:\n  relic_cap: 0\n",
            "crypt_raid:\n  coin_min: 20\n  coin_max: 20\n",
            "rules:\n  max_cascade_steps: 0\n",
            "timing:\n  settle_delay_ms: -1.0\n",
        ];
        for yaml in bad {
            assert!(
                matches!(SlotConfig::from_yaml_str(yaml), Err(ConfigError::Invalid(_))),
                "{yaml}"
            );
        }
        assert!(matches!(
            SlotConfig::from_json_str("{ nope"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("machine.json");
        fs::write(&json_path, r#"{ "economy": { "initial_balance": 42 } }"#).unwrap();
        assert_eq!(SlotConfig::load(&json_path).unwrap().economy.initial_balance, 42);

        let yaml_path = dir.path().join("machine.yaml");
        fs::write(&yaml_path, "economy:\n  initial_balance: 77\n").unwrap();
        assert_eq!(SlotConfig::load(&yaml_path).unwrap().economy.initial_balance, 77);

        assert!(matches!(
            SlotConfig::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_xp_for_win() {
        let economy = EconomyConfig::default();
        assert_eq!(economy.xp_for_win(0), 5);
        assert_eq!(economy.xp_for_win(29), 7);
        assert_eq!(economy.xp_for_win(5000), 505);
    }
}
