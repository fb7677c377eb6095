//! # cr-sim: Headless Crimson Reels autoplay
//!
//! Plays many independent seeded sessions in parallel (one rayon task per
//! session, each on its own current-thread tokio runtime) with studio timing,
//! and folds their [`SessionStats`] into a [`SimReport`].

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use cr_slot::{
    BargainChoice, GameStatus, NudgeDirection, SessionStats, SlotConfig, SlotError, SlotMachine,
    SpinOutcome, SpinRejection, TimingConfig,
};

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Session {seed} failed: {source}")]
    Session { seed: u64, source: SlotError },
}

/// What autoplay does with a win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Bank every win
    Collect,
    /// Stake every win on the Dark Bargain
    Bargain,
}

/// Batch settings
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub sessions: usize,
    /// Resolved spins per session (altar visits do not count)
    pub spins: u32,
    /// Session `i` is seeded with `seed + i`
    pub seed: u64,
    pub strategy: Strategy,
    /// Spend at the altar instead of closing it straight away
    pub buy_relics: bool,
    /// Timing is forced to studio
    pub slot: SlotConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sessions: 100,
            spins: 500,
            seed: 1,
            strategy: Strategy::Collect,
            buy_relics: false,
            slot: SlotConfig::default(),
        }
    }
}

/// Outcome of one autoplay session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub seed: u64,
    pub final_balance: i64,
    pub final_level: u32,
    pub relics: usize,
    /// Stopped early on insufficient funds
    pub busted: bool,
    pub stats: SessionStats,
}

/// Aggregate over every session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    pub sessions: usize,
    pub total_spins: u64,
    pub total_bet: i64,
    pub total_win: i64,
    pub rtp: f64,
    pub hit_rate: f64,
    /// Mean cascade steps per spin, zero-paying rose steps included
    pub avg_cascade: f64,
    pub longest_cascade: u32,
    pub jackpots: u64,
    pub bonus_rounds: u64,
    /// Paid out by Crypt Raid settlements
    pub bonus_win: i64,
    /// Refunded by blood chalices
    pub total_rebate: i64,
    pub bargains_won: u64,
    pub bargains_lost: u64,
    pub nudges_granted: u64,
    pub relics_bought: u64,
    pub busted_sessions: usize,
    pub avg_final_balance: f64,
}

impl SimReport {
    pub fn from_sessions(reports: &[SessionReport]) -> Self {
        let mut total = SessionStats::default();
        for report in reports {
            let s = &report.stats;
            total.total_spins += s.total_spins;
            total.total_bet += s.total_bet;
            total.total_win += s.total_win;
            total.wins += s.wins;
            total.losses += s.losses;
            total.cascade_steps += s.cascade_steps;
            total.longest_cascade = total.longest_cascade.max(s.longest_cascade);
            total.jackpots_won += s.jackpots_won;
            total.bonus_rounds += s.bonus_rounds;
            total.bonus_win += s.bonus_win;
            total.total_rebate += s.total_rebate;
            total.bargains_won += s.bargains_won;
            total.bargains_lost += s.bargains_lost;
            total.nudges_granted += s.nudges_granted;
            total.relics_bought += s.relics_bought;
        }

        let avg_cascade = if total.total_spins > 0 {
            total.cascade_steps as f64 / total.total_spins as f64
        } else {
            0.0
        };
        let avg_final_balance = if reports.is_empty() {
            0.0
        } else {
            reports.iter().map(|r| r.final_balance as f64).sum::<f64>() / reports.len() as f64
        };

        Self {
            sessions: reports.len(),
            total_spins: total.total_spins,
            total_bet: total.total_bet,
            total_win: total.total_win,
            rtp: total.rtp(),
            hit_rate: total.hit_rate(),
            avg_cascade,
            longest_cascade: total.longest_cascade,
            jackpots: total.jackpots_won,
            bonus_rounds: total.bonus_rounds,
            bonus_win: total.bonus_win,
            total_rebate: total.total_rebate,
            bargains_won: total.bargains_won,
            bargains_lost: total.bargains_lost,
            nudges_granted: total.nudges_granted,
            relics_bought: total.relics_bought,
            busted_sessions: reports.iter().filter(|r| r.busted).count(),
            avg_final_balance,
        }
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Crimson Reels simulation")?;
        writeln!(f, "  sessions          {:>12}", self.sessions)?;
        writeln!(f, "  spins             {:>12}", self.total_spins)?;
        writeln!(f, "  wagered           {:>12}", self.total_bet)?;
        writeln!(f, "  returned          {:>12}", self.total_win)?;
        writeln!(f, "  RTP               {:>11.2}%", self.rtp)?;
        writeln!(f, "  hit rate          {:>11.2}%", self.hit_rate)?;
        writeln!(f, "  avg cascade       {:>12.3}", self.avg_cascade)?;
        writeln!(f, "  longest cascade   {:>12}", self.longest_cascade)?;
        writeln!(f, "  jackpots          {:>12}", self.jackpots)?;
        writeln!(f, "  crypt raids       {:>12}", self.bonus_rounds)?;
        writeln!(f, "  raid payouts      {:>12}", self.bonus_win)?;
        writeln!(f, "  chalice rebates   {:>12}", self.total_rebate)?;
        writeln!(
            f,
            "  bargains won/lost {:>12}",
            format!("{}/{}", self.bargains_won, self.bargains_lost)
        )?;
        writeln!(f, "  nudges granted    {:>12}", self.nudges_granted)?;
        writeln!(f, "  relics bought     {:>12}", self.relics_bought)?;
        writeln!(f, "  busted sessions   {:>12}", self.busted_sessions)?;
        writeln!(f, "  avg final balance {:>12.1}", self.avg_final_balance)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SESSIONS
// ═══════════════════════════════════════════════════════════════════════════

/// Run every session in parallel
pub fn run(config: &SimConfig) -> Result<SimReport, SimError> {
    log::info!(
        "[Sim] {} sessions x {} spins, strategy {:?}",
        config.sessions,
        config.spins,
        config.strategy
    );
    let reports = (0..config.sessions)
        .into_par_iter()
        .map(|i| run_session(config, config.seed.wrapping_add(i as u64)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SimReport::from_sessions(&reports))
}

/// Play one seeded session to completion
pub fn run_session(config: &SimConfig, seed: u64) -> Result<SessionReport, SimError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime
        .block_on(play(config, seed))
        .map_err(|source| SimError::Session { seed, source })
}

async fn play(config: &SimConfig, seed: u64) -> Result<SessionReport, SlotError> {
    let slot = SlotConfig {
        timing: TimingConfig::studio(),
        ..config.slot.clone()
    };
    let mut machine = SlotMachine::with_seed(slot, seed);
    let mut spins = 0;
    let mut busted = false;

    while spins < config.spins {
        if !machine.status().accepts_spin() {
            advance(&mut machine, config).await?;
            continue;
        }
        match machine.spin().await {
            SpinOutcome::Resolved(_) => spins += 1,
            SpinOutcome::AltarOpened => {}
            SpinOutcome::Rejected(SpinRejection::InsufficientFunds) => {
                busted = true;
                break;
            }
            SpinOutcome::Rejected(reason) => {
                log::warn!("[Sim] session {} stuck: {}", seed, reason.reason());
                break;
            }
        }
    }
    // leave the ledger settled
    while !machine.status().accepts_spin() {
        advance(&mut machine, config).await?;
    }

    log::debug!(
        "[Sim] session {} done: balance {}",
        seed,
        machine.state().balance
    );
    Ok(SessionReport {
        seed,
        final_balance: machine.state().balance,
        final_level: machine.state().level,
        relics: machine.state().relics.len(),
        busted,
        stats: machine.stats().clone(),
    })
}

/// Take the autoplay decision for a state that does not accept spins
async fn advance(machine: &mut SlotMachine, config: &SimConfig) -> Result<(), SlotError> {
    match machine.status() {
        GameStatus::Win => match config.strategy {
            // a cascade cut off at the bound can settle WIN with nothing to stake
            Strategy::Bargain if machine.state().last_win > 0 => {
                machine.enter_bargain().await?;
            }
            Strategy::Collect | Strategy::Bargain => {
                machine.collect_win()?;
            }
        },
        GameStatus::Bargain => {
            machine.resolve_bargain(BargainChoice::Left).await?;
        }
        GameStatus::Bonus => {
            let next = machine
                .raid()
                .and_then(|raid| raid.concealed().first().copied())
                .ok_or(SlotError::WrongState(GameStatus::Bonus))?;
            machine.pick_coffin(next).await?;
        }
        GameStatus::Altar => {
            if config.buy_relics {
                shop(machine)?;
            }
            machine.close_altar()?;
        }
        GameStatus::Nudging => {
            machine.nudge(0, NudgeDirection::Up)?;
        }
        status => return Err(SlotError::WrongState(status)),
    }
    Ok(())
}

/// Buy what the balance can spare, keeping half of it in reserve
fn shop(machine: &mut SlotMachine) -> Result<(), SlotError> {
    loop {
        let reserve = machine.state().balance / 2;
        let choice = machine
            .altar_view()
            .into_iter()
            .find(|offer| offer.purchasable() && offer.cost <= reserve)
            .map(|offer| offer.id());
        match choice {
            Some(relic) => machine.buy_relic(relic)?,
            None => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(strategy: Strategy, buy_relics: bool) -> SimConfig {
        SimConfig {
            sessions: 4,
            spins: 60,
            seed: 9,
            strategy,
            buy_relics,
            slot: SlotConfig::default(),
        }
    }

    #[test]
    fn test_run_is_reproducible() {
        let config = small(Strategy::Collect, false);
        let first = run(&config).unwrap();
        let second = run(&config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sessions, 4);
        assert!(first.total_spins > 0);
        assert_eq!(first.bargains_won + first.bargains_lost, 0);
    }

    #[test]
    fn test_session_ledger_matches_stats() {
        let config = small(Strategy::Collect, false);
        let report = run_session(&config, 3).unwrap();
        let stats = &report.stats;
        assert_eq!(stats.total_bet, stats.total_spins as i64 * 10);
        assert_eq!(report.final_balance, 1000 - stats.total_bet + stats.total_win);
        assert_eq!(report.relics, 0);
    }

    #[test]
    fn test_bargain_and_relic_strategies_run() {
        let report = run(&small(Strategy::Bargain, true)).unwrap();
        assert!(report.total_spins > 0);
        assert!(report.bargains_won + report.bargains_lost > 0);
    }

    #[test]
    fn test_report_folds_bonus_and_rebates() {
        let session = |seed: u64, bonus_win: i64, total_rebate: i64| SessionReport {
            seed,
            final_balance: 1000,
            final_level: 1,
            relics: 0,
            busted: false,
            stats: SessionStats {
                total_spins: 4,
                total_bet: 40,
                cascade_steps: 2,
                bonus_win,
                total_rebate,
                ..Default::default()
            },
        };
        let report = SimReport::from_sessions(&[session(1, 300, 5), session(2, 120, 0)]);
        assert_eq!(report.bonus_win, 420);
        assert_eq!(report.total_rebate, 5);
        assert_eq!(report.avg_cascade, 0.5);
        assert!(report.to_string().contains("raid payouts"));
    }

    #[test]
    fn test_report_from_nothing() {
        let report = SimReport::from_sessions(&[]);
        assert_eq!(report.rtp, 0.0);
        assert_eq!(report.avg_final_balance, 0.0);
    }
}
