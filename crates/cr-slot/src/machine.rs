//! Crimson Reels machine
//!
//! [`SlotMachine`] owns the ledger, the session PRNG and the stage trace, and
//! drives every round transition through [`GameState::reduce`]. Methods that
//! wait on presentation delays or the oracle are `async`; they all take
//! `&mut self`, so nothing can interleave with a running cascade.

use std::path::PathBuf;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use cr_oracle::{NarrativeRequest, Oracle, Preferences};
use cr_stage::{CueDispatcher, CueSink, Stage, StageEvent, StagePayload, StageTrace};

use crate::config::{NudgeTargeting, SlotConfig};
use crate::debug::{DebugOverrides, DebugPreset};
use crate::error::SlotError;
use crate::evaluator::{WinEvaluation, evaluate, is_bonus_trigger};
use crate::features::blood_altar::{self, AltarOffer};
use crate::features::crypt_raid::{CardKind, CardReveal, CryptRaid};
use crate::features::dark_bargain::{self, BargainChoice, BargainResult};
use crate::relics::{RelicId, RelicModifiers};
use crate::round::{CascadeStep, Round, RoundOutcome, SpinOutcome, SpinRejection, SpinRequest};
use crate::selector::{draw, draw_reels};
use crate::state::{Action, GameState, GameStatus};
use crate::stats::SessionStats;
use crate::symbols::{REEL_COUNT, Reels, SymbolId, reel_ids, reel_names};
use crate::timing::{TimestampGenerator, pause};

/// Cosmetic nudge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeDirection {
    Up,
    Down,
}

/// Reels of the spin in flight
#[derive(Debug, Clone)]
struct PendingSpin {
    bet: i64,
    /// Drawn at spin start
    targets: Reels,
    /// Landings reported by the presentation layer
    reported: [Option<SymbolId>; REEL_COUNT],
    /// Locked in by a player stop
    landed: [Option<SymbolId>; REEL_COUNT],
}

/// Payout of one winning evaluation.
///
/// Returns `(step_win, paid_from_pool)`. The jackpot pool only pays on the
/// landed reels (multiplier 1); later jackpot triples pay like any triple.
pub fn step_payout(
    evaluation: &WinEvaluation,
    bet: i64,
    multiplier: u32,
    effective_multiplier: f64,
    jackpot_pool: f64,
) -> (i64, bool) {
    if evaluation.is_jackpot_shape && multiplier == 1 {
        return (jackpot_pool.floor() as i64, true);
    }
    let win = bet as f64 * evaluation.payout_multiplier as f64 * effective_multiplier;
    (win.floor() as i64, false)
}

/// The game
pub struct SlotMachine {
    config: SlotConfig,
    state: GameState,
    rng: ChaCha8Rng,
    seed: Option<u64>,
    oracle: Arc<Oracle>,
    cues: CueDispatcher,
    trace: StageTrace,
    clock: TimestampGenerator,
    stats: SessionStats,
    debug: DebugOverrides,
    pending: Option<PendingSpin>,
    raid: Option<CryptRaid>,
    spin_index: u64,
    prefs_path: Option<PathBuf>,
}

impl SlotMachine {
    /// Fresh session seeded from the OS
    pub fn new(config: SlotConfig) -> Self {
        Self::build(config, ChaCha8Rng::from_os_rng(), None)
    }

    /// Reproducible session: same seed and inputs, same stage sequence
    pub fn with_seed(config: SlotConfig, seed: u64) -> Self {
        Self::build(config, ChaCha8Rng::seed_from_u64(seed), Some(seed))
    }

    fn build(config: SlotConfig, rng: ChaCha8Rng, seed: Option<u64>) -> Self {
        let oracle = match seed {
            Some(seed) => Oracle::offline().with_seed(seed),
            None => Oracle::offline(),
        };
        let trace_id = match seed {
            Some(seed) => format!("session-{seed:016x}"),
            None => "session".to_string(),
        };
        let mut trace = StageTrace::new(trace_id, "crimson-reels");
        if let Some(seed) = seed {
            trace = trace.with_seed(seed);
        }

        log::info!(
            "[Machine] new session (balance {}, seed {:?})",
            config.economy.initial_balance,
            seed
        );

        Self {
            state: GameState::new(&config.economy),
            clock: TimestampGenerator::new(config.timing.clone()),
            config,
            rng,
            seed,
            oracle: Arc::new(oracle),
            cues: CueDispatcher::silent(),
            trace,
            stats: SessionStats::default(),
            debug: DebugOverrides::new(),
            pending: None,
            raid: None,
            spin_index: 0,
            prefs_path: None,
        }
    }

    /// Replace the narrative oracle
    pub fn with_oracle(mut self, oracle: Arc<Oracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Route audio cues to `sink`. Keeps the current mute flag.
    pub fn with_cue_sink(mut self, sink: Arc<dyn CueSink>) -> Self {
        let muted = self.cues.is_muted();
        self.cues = CueDispatcher::new(sink);
        self.cues.set_muted(muted);
        self
    }

    /// Restore the mute flag from `path` and persist changes back to it
    pub fn with_preferences(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = Preferences::load_or_default(&path);
        self.cues.set_muted(prefs.muted);
        self.prefs_path = Some(path);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn trace(&self) -> &StageTrace {
        &self.trace
    }

    /// Remove and return everything recorded since the last call
    pub fn take_events(&mut self) -> Vec<StageEvent> {
        self.trace.drain()
    }

    pub fn oracle(&self) -> &Arc<Oracle> {
        &self.oracle
    }

    /// Live Crypt Raid, while in `Bonus`
    pub fn raid(&self) -> Option<&CryptRaid> {
        self.raid.as_ref()
    }

    pub fn debug(&self) -> &DebugOverrides {
        &self.debug
    }

    pub fn is_muted(&self) -> bool {
        self.cues.is_muted()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LEDGER & STREAM
    // ═══════════════════════════════════════════════════════════════════════

    fn dispatch(&mut self, action: Action) {
        let from = self.state.status;
        self.state = self.state.reduce(&action, &self.config.economy);
        let to = self.state.status;
        if from != to {
            log::trace!("[Machine] {} -> {}", from, to);
            self.emit(Stage::StatusChange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }

    fn emit(&mut self, stage: Stage) {
        let payload = StagePayload::ledger(self.state.balance, self.state.jackpot)
            .multiplier(self.state.multiplier)
            .spin_index(self.spin_index);
        self.cues.dispatch(&stage);
        self.trace
            .push(StageEvent::with_payload(stage, self.clock.current(), payload));
    }

    fn require(&self, status: GameStatus) -> Result<(), SlotError> {
        if self.state.status == status {
            Ok(())
        } else {
            Err(SlotError::WrongState(self.state.status))
        }
    }

    fn gain_xp(&mut self, amount: u32) {
        let before = self.state.level;
        self.dispatch(Action::GainXp { amount });
        if self.state.level > before {
            log::info!("[Machine] level up: {}", self.state.level);
            self.emit(Stage::LevelUp {
                level: self.state.level,
            });
        }
    }

    async fn consult(&mut self, request: NarrativeRequest) -> String {
        let oracle = Arc::clone(&self.oracle);
        let reply = oracle.consult(&request).await;
        self.dispatch(Action::SetOracle {
            fortune: reply.text.clone(),
            loading: false,
        });
        self.emit(Stage::OracleLine {
            category: reply.category.as_str().to_string(),
            text: reply.text.clone(),
        });
        self.speak(&reply.text);
        reply.text
    }

    /// Voice the line in the background. Nothing waits on it.
    fn speak(&self, text: &str) {
        if self.is_muted() || !self.oracle.is_enabled() || !self.oracle.has_voice() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::debug!("[Machine] no runtime, oracle line not voiced");
            return;
        };
        let oracle = Arc::clone(&self.oracle);
        let sink = self.cues.sink();
        let text = text.to_string();
        runtime.spawn(async move {
            if let Some(clip) = oracle.speak(&text).await {
                sink.play_voice(&clip);
            }
        });
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SPIN
    // ═══════════════════════════════════════════════════════════════════════

    /// Ask for a spin. Charges the bet and draws the targets when accepted.
    pub fn request_spin(&mut self) -> SpinRequest {
        let status = self.state.status;
        let rejection = if status == GameStatus::Spinning {
            Some(SpinRejection::AlreadySpinning)
        } else if !status.accepts_spin() {
            Some(SpinRejection::Busy(status))
        } else if !self.state.can_afford_spin() {
            Some(SpinRejection::InsufficientFunds)
        } else {
            None
        };
        if let Some(reason) = rejection {
            log::debug!("[Machine] spin rejected: {}", reason.reason());
            self.emit(Stage::SpinRejected {
                reason: reason.reason().to_string(),
            });
            return SpinRequest::Rejected { reason };
        }

        if self.state.altar_due(&self.config.economy) {
            log::info!("[Machine] the blood altar opens");
            self.dispatch(Action::OpenAltar);
            self.emit(Stage::AltarOpen);
            return SpinRequest::AltarOpened;
        }

        let bet = self.state.bet;
        self.spin_index += 1;
        self.dispatch(Action::StartSpin);
        let targets = draw_reels(&mut self.rng);
        self.pending = Some(PendingSpin {
            bet,
            targets,
            reported: [None; REEL_COUNT],
            landed: [None; REEL_COUNT],
        });
        self.stats.record_spin(bet);
        self.emit(Stage::SpinStart { bet });
        SpinRequest::Started { bet }
    }

    fn landing(&self, pending: &PendingSpin, reel: usize) -> SymbolId {
        pending.landed[reel]
            .or_else(|| self.debug.forced(reel as u8))
            .or(pending.reported[reel])
            .unwrap_or(pending.targets[reel])
    }

    fn check_reel(&self, reel_index: u8) -> Result<(), SlotError> {
        self.require(GameStatus::Spinning)?;
        if reel_index as usize >= REEL_COUNT {
            return Err(SlotError::InvalidReel(reel_index));
        }
        if self.state.stopped_reels[reel_index as usize] {
            return Err(SlotError::ReelAlreadyStopped(reel_index));
        }
        Ok(())
    }

    /// Player stop on one reel. Returns the symbol it landed on.
    pub fn stop_reel(&mut self, reel_index: u8) -> Result<SymbolId, SlotError> {
        self.check_reel(reel_index)?;
        let Some(pending) = self.pending.as_ref() else {
            return Err(SlotError::WrongState(self.state.status));
        };
        let symbol = self.landing(pending, reel_index as usize);
        if let Some(pending) = self.pending.as_mut() {
            pending.landed[reel_index as usize] = Some(symbol);
        }

        self.dispatch(Action::StopReel { index: reel_index });
        self.clock.advance(self.config.timing.reel_stop_interval_ms);
        self.emit(Stage::ReelStop {
            reel_index,
            symbol: symbol.as_str().to_string(),
            manual: true,
        });
        Ok(symbol)
    }

    /// Presentation reports where a reel visually landed
    pub fn land_symbol(&mut self, reel_index: u8, symbol: SymbolId) -> Result<(), SlotError> {
        self.check_reel(reel_index)?;
        if let Some(pending) = self.pending.as_mut() {
            pending.reported[reel_index as usize] = Some(symbol);
        }
        Ok(())
    }

    /// Freeze the reels and settle the round
    pub async fn resolve_spin(&mut self) -> Result<Round, SlotError> {
        self.require(GameStatus::Spinning)?;
        let Some(pending) = self.pending.take() else {
            return Err(SlotError::WrongState(self.state.status));
        };
        Ok(self.settle_spin(pending).await)
    }

    /// Request and resolve in one go, stopping reels automatically
    pub async fn spin(&mut self) -> SpinOutcome {
        match self.request_spin() {
            SpinRequest::Started { .. } => match self.resolve_spin().await {
                Ok(round) => SpinOutcome::Resolved(round),
                Err(_) => SpinOutcome::Rejected(SpinRejection::Busy(self.state.status)),
            },
            SpinRequest::AltarOpened => SpinOutcome::AltarOpened,
            SpinRequest::Rejected { reason } => SpinOutcome::Rejected(reason),
        }
    }

    async fn settle_spin(&mut self, pending: PendingSpin) -> Round {
        let mut landed = pending.targets;
        for (reel, symbol) in landed.iter_mut().enumerate() {
            *symbol = self.landing(&pending, reel);
        }

        if !self.state.all_reels_stopped() {
            pause(self.config.timing.reel_spin_duration_ms).await;
            for reel in 0..REEL_COUNT {
                if self.state.stopped_reels[reel] {
                    continue;
                }
                self.clock.reel_stop(reel as u8);
                self.emit(Stage::ReelStop {
                    reel_index: reel as u8,
                    symbol: landed[reel].as_str().to_string(),
                    manual: false,
                });
            }
        }

        self.dispatch(Action::ResolveSpin);
        self.dispatch(Action::SetReels { reels: landed });
        pause(self.config.timing.settle_delay_ms).await;
        self.clock.settle();
        self.emit(Stage::EvaluateWins);

        let round = if is_bonus_trigger(&landed) {
            self.enter_bonus(pending.bet, landed)
        } else {
            self.run_cascade(pending.bet, landed).await
        };

        log::debug!(
            "[Machine] spin {} settled: {:?} ({} steps, won {})",
            self.spin_index,
            round.outcome,
            round.steps.len(),
            round.total_win
        );
        self.stats.record_round(&round);
        round
    }

    fn enter_bonus(&mut self, bet: i64, landed: Reels) -> Round {
        let mitigated =
            RelicModifiers::new(&self.state.relics, &self.config.rules).mitigates_hunter();
        self.dispatch(Action::SetStatus {
            status: GameStatus::Bonus,
        });
        self.raid = Some(CryptRaid::deal(
            bet,
            mitigated,
            &self.config.crypt_raid,
            &mut self.rng,
        ));
        log::info!("[Machine] three castles, entering the crypt");
        self.emit(Stage::BonusEnter);

        Round {
            bet,
            landed,
            final_reels: landed,
            steps: Vec::new(),
            total_win: 0,
            jackpot_paid: false,
            hit_cascade_limit: false,
            outcome: RoundOutcome::Bonus,
        }
    }

    /// Evaluate, pay, dissolve and redraw until no rule fires
    async fn run_cascade(&mut self, bet: i64, landed: Reels) -> Round {
        let mut reels = landed;
        let mut steps: Vec<CascadeStep> = Vec::new();
        let mut total_win = 0i64;
        let mut jackpot_paid = false;
        let mut hit_cascade_limit = false;
        let max_steps = self.config.rules.max_cascade_steps as usize;

        let outcome = loop {
            if steps.len() >= max_steps {
                log::warn!("[Machine] cascade bound of {} steps reached", max_steps);
                hit_cascade_limit = true;
                self.emit(Stage::WinPresent {
                    win_amount: total_win,
                });
                self.emit(Stage::SpinEnd { total_win });
                break RoundOutcome::Win { total_win };
            }

            let evaluation = evaluate(&reels);
            if !evaluation.is_win() {
                break self.settle_no_win(bet, &reels, total_win).await;
            }

            let multiplier = self.state.multiplier;
            let effective = RelicModifiers::new(&self.state.relics, &self.config.rules)
                .effective_multiplier(multiplier);
            let (step_win, from_pool) =
                step_payout(&evaluation, bet, multiplier, effective, self.state.jackpot);
            total_win += step_win;

            self.dispatch(Action::SetWin {
                amount: total_win,
                indices: evaluation.winning_indices.clone(),
                is_jackpot: from_pool,
            });
            self.dispatch(Action::UpdateBalance { amount: step_win });
            if from_pool {
                jackpot_paid = true;
                log::info!("[Machine] JACKPOT {}", step_win);
                self.dispatch(Action::ResetJackpot);
                self.emit(Stage::JackpotWin { amount: step_win });
            }
            self.emit(Stage::CascadeStep {
                step_index: steps.len() as u32,
                multiplier,
                step_win,
                winning_reels: evaluation.winning_indices.clone(),
            });
            self.gain_xp(self.config.economy.xp_for_win(step_win));

            steps.push(CascadeStep {
                index: steps.len() as u32,
                reels,
                winning_indices: evaluation.winning_indices.clone(),
                payout_multiplier: evaluation.payout_multiplier,
                multiplier,
                effective_multiplier: effective,
                step_win,
                jackpot: from_pool,
            });

            self.consult(NarrativeRequest::Fortune {
                win_amount: step_win,
                symbols: reel_names(&reels),
            })
            .await;

            pause(self.config.timing.win_reveal_delay_ms).await;
            self.clock.win_reveal();
            self.dispatch(Action::SetDissolve {
                indices: evaluation.winning_indices.clone(),
            });
            self.emit(Stage::Dissolve {
                reels: evaluation.winning_indices.clone(),
            });
            pause(self.config.timing.dissolve_duration_ms).await;
            self.clock.dissolve();

            let mut redrawn = Vec::with_capacity(evaluation.winning_indices.len());
            for index in &evaluation.winning_indices {
                let symbol = draw(&mut self.rng);
                reels[*index as usize] = symbol;
                redrawn.push(symbol.as_str().to_string());
            }
            self.dispatch(Action::SetReels { reels });
            self.dispatch(Action::SetDissolve {
                indices: Vec::new(),
            });
            self.emit(Stage::Redraw {
                reels: evaluation.winning_indices,
                symbols: redrawn,
            });
            self.dispatch(Action::SetMultiplier {
                multiplier: multiplier + 1,
            });
        };

        Round {
            bet,
            landed,
            final_reels: reels,
            steps,
            total_win,
            jackpot_paid,
            hit_cascade_limit,
            outcome,
        }
    }

    /// First evaluation with no win: settle the total, nudge or lose.
    /// The cascade only stops on reels without a pair, so the nudge roll
    /// never qualifies here in normal play.
    async fn settle_no_win(&mut self, bet: i64, reels: &Reels, total_win: i64) -> RoundOutcome {
        if total_win > 0 {
            self.emit(Stage::WinPresent {
                win_amount: total_win,
            });
            self.emit(Stage::SpinEnd { total_win });
            return RoundOutcome::Win { total_win };
        }

        let nudges =
            RelicModifiers::new(&self.state.relics, &self.config.rules).roll_nudge(reels, &mut self.rng);
        if let Some(count) = nudges {
            log::debug!("[Machine] near miss, {} nudge(s)", count);
            self.dispatch(Action::TriggerNudge { count });
            self.emit(Stage::NudgeGranted { count });
            return RoundOutcome::Nudge { count };
        }

        let rebate = RelicModifiers::new(&self.state.relics, &self.config.rules).loss_rebate(bet);
        if rebate > 0 {
            self.dispatch(Action::UpdateBalance { amount: rebate });
            self.emit(Stage::LossRebate { amount: rebate });
        }
        self.dispatch(Action::SetStatus {
            status: GameStatus::Loss,
        });
        self.emit(Stage::Loss);
        self.consult(NarrativeRequest::Fortune {
            win_amount: 0,
            symbols: reel_names(reels),
        })
        .await;
        self.emit(Stage::SpinEnd { total_win: 0 });
        RoundOutcome::Loss { rebate }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // WIN, BARGAIN, NUDGE
    // ═══════════════════════════════════════════════════════════════════════

    /// Bank the win and return to idle
    pub fn collect_win(&mut self) -> Result<i64, SlotError> {
        self.require(GameStatus::Win)?;
        let amount = self.state.last_win;
        self.dispatch(Action::CollectWin);
        self.emit(Stage::WinCollect { amount });
        Ok(amount)
    }

    /// Stake the last win on the Dark Bargain. Returns the oracle's offer.
    pub async fn enter_bargain(&mut self) -> Result<String, SlotError> {
        self.require(GameStatus::Win)?;
        let stake = self.state.last_win;
        if stake <= 0 {
            return Err(SlotError::NothingToBargain);
        }
        self.dispatch(Action::SetStatus {
            status: GameStatus::Bargain,
        });
        self.emit(Stage::BargainStart { stake });
        Ok(self.consult(NarrativeRequest::BargainOffer { stake }).await)
    }

    /// Reveal the chalice. The choice does not affect the odds.
    pub async fn resolve_bargain(&mut self, choice: BargainChoice) -> Result<BargainResult, SlotError> {
        self.require(GameStatus::Bargain)?;
        let stake = self.state.last_win;

        pause(self.config.timing.bargain_reveal_ms).await;
        self.clock.bargain_reveal();
        let won = dark_bargain::draw(&mut self.rng);
        let delta = dark_bargain::settle(stake, won);

        self.dispatch(Action::UpdateBalance { amount: delta });
        self.stats.record_bargain(won, stake);
        self.dispatch(Action::SetStatus {
            status: GameStatus::Idle,
        });
        self.emit(Stage::BargainResult { won, amount: stake });
        log::info!(
            "[Machine] bargain {} ({:+})",
            if won { "won" } else { "lost" },
            delta
        );

        let oracle_line = self
            .consult(NarrativeRequest::BargainOutcome { won, amount: stake })
            .await;
        Ok(BargainResult {
            choice,
            won,
            stake,
            delta,
            oracle_line,
        })
    }

    /// Redraw one reel. The reel hit depends on the nudge targeting rule.
    /// The reels are not re-scored.
    pub fn nudge(&mut self, reel_index: u8, direction: NudgeDirection) -> Result<SymbolId, SlotError> {
        self.require(GameStatus::Nudging)?;
        if self.state.nudge_available == 0 {
            return Err(SlotError::NoNudges);
        }
        if reel_index as usize >= REEL_COUNT {
            return Err(SlotError::InvalidReel(reel_index));
        }
        let target = match self.config.rules.nudge_targeting {
            NudgeTargeting::FirstReel => 0,
            NudgeTargeting::SelectedReel => reel_index,
        };
        let symbol = draw(&mut self.rng);
        self.dispatch(Action::ConsumeNudge {
            index: target,
            symbol,
        });
        log::trace!("[Machine] nudge {:?} on reel {} -> {}", direction, target, symbol);
        self.emit(Stage::NudgeApplied {
            reel_index: target,
            symbol: symbol.as_str().to_string(),
            remaining: self.state.nudge_available,
        });
        Ok(symbol)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // CRYPT RAID
    // ═══════════════════════════════════════════════════════════════════════

    /// Open a coffin. Settles the bonus when the raid ends.
    pub async fn pick_coffin(&mut self, index: u8) -> Result<CardReveal, SlotError> {
        self.require(GameStatus::Bonus)?;
        let Some(raid) = self.raid.as_mut() else {
            return Err(SlotError::WrongState(self.state.status));
        };
        let reveal = raid.pick(index)?;
        let settlement = raid.settlement();

        self.emit(Stage::CardReveal {
            card_index: index,
            card: reveal.kind.as_str().to_string(),
            value: reveal.value,
        });
        if reveal.kind == CardKind::Hunter {
            self.emit(Stage::HunterFound {
                mitigated: !reveal.ended_by_hunter,
            });
        }
        if reveal.ended_by_hunter {
            pause(self.config.timing.hunter_linger_ms).await;
            self.clock.hunter_linger();
        }
        if reveal.finished {
            pause(self.config.timing.bonus_exit_ms).await;
            self.clock.bonus_exit();
            self.complete_bonus(settlement)?;
        }
        Ok(reveal)
    }

    /// Credit a bonus amount and leave `Bonus`. Also used when the raid is
    /// played out by an external front end.
    pub fn complete_bonus(&mut self, amount: i64) -> Result<(), SlotError> {
        self.require(GameStatus::Bonus)?;
        self.raid = None;
        self.dispatch(Action::UpdateBalance { amount });
        self.stats.record_bonus(amount);
        self.dispatch(Action::SetStatus {
            status: GameStatus::Idle,
        });
        log::info!("[Machine] crypt raid paid {}", amount);
        self.emit(Stage::BonusExit { win: amount });
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // BLOOD ALTAR
    // ═══════════════════════════════════════════════════════════════════════

    /// Current shop shelf
    pub fn altar_view(&self) -> Vec<AltarOffer> {
        blood_altar::offers(&self.state, &self.config.economy)
    }

    pub fn buy_relic(&mut self, relic: RelicId) -> Result<(), SlotError> {
        self.require(GameStatus::Altar)?;
        if self.state.relics_full(&self.config.economy) {
            return Err(SlotError::RelicCapReached(self.config.economy.relic_cap));
        }
        let cost = relic.cost();
        if self.state.balance < cost {
            return Err(SlotError::InsufficientFunds {
                needed: cost,
                balance: self.state.balance,
            });
        }
        self.dispatch(Action::AddRelic { relic, cost });
        self.stats.record_relic();
        log::info!("[Machine] bought {} for {}", relic, cost);
        self.emit(Stage::RelicAcquired {
            relic: relic.as_str().to_string(),
            cost,
        });
        Ok(())
    }

    pub fn close_altar(&mut self) -> Result<(), SlotError> {
        self.require(GameStatus::Altar)?;
        self.dispatch(Action::CloseAltar);
        self.emit(Stage::AltarClose);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // CONTROLS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn increase_bet(&mut self) -> Result<i64, SlotError> {
        self.adjust_bet(self.config.economy.bet_increment)
    }

    pub fn decrease_bet(&mut self) -> Result<i64, SlotError> {
        self.adjust_bet(-self.config.economy.bet_increment)
    }

    fn adjust_bet(&mut self, amount: i64) -> Result<i64, SlotError> {
        if self.state.status == GameStatus::Spinning {
            return Err(SlotError::WrongState(GameStatus::Spinning));
        }
        self.dispatch(Action::AdjustBet { amount });
        let bet = self.state.bet;
        self.emit(Stage::BetChange { bet });
        Ok(bet)
    }

    /// Flip the mute flag and persist it. Returns the new value.
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.cues.toggle_mute();
        if let Some(path) = &self.prefs_path {
            if let Err(e) = (Preferences { muted }).save(path) {
                log::debug!("[Machine] could not save preferences: {}", e);
            }
        }
        muted
    }

    pub fn set_oracle_enabled(&self, enabled: bool) {
        self.oracle.set_enabled(enabled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DEBUG
    // ═══════════════════════════════════════════════════════════════════════

    /// Force (or release with `None`) the landing of one reel
    pub fn debug_force_symbol(&mut self, reel_index: u8, symbol: Option<SymbolId>) {
        self.debug.force(reel_index, symbol);
    }

    pub fn debug_preset(&mut self, preset: DebugPreset) {
        log::debug!("[Debug] preset {:?}", preset);
        self.debug.apply_preset(preset);
    }

    pub fn debug_grant_balance(&mut self, amount: i64) {
        self.dispatch(Action::UpdateBalance { amount });
    }

    pub fn debug_grant_xp(&mut self, amount: u32) {
        self.gain_xp(amount);
    }

    /// Open a nudge window from a settled state
    pub fn debug_grant_nudges(&mut self, count: u32) -> Result<(), SlotError> {
        if !self.state.status.accepts_spin() || count == 0 {
            return Err(SlotError::WrongState(self.state.status));
        }
        self.dispatch(Action::TriggerNudge { count });
        self.emit(Stage::NudgeGranted { count });
        Ok(())
    }

    /// Free relic. Still bound by the cap.
    pub fn debug_grant_relic(&mut self, relic: RelicId) -> Result<(), SlotError> {
        if self.state.relics_full(&self.config.economy) {
            return Err(SlotError::RelicCapReached(self.config.economy.relic_cap));
        }
        self.dispatch(Action::AddRelic { relic, cost: 0 });
        self.emit(Stage::RelicAcquired {
            relic: relic.as_str().to_string(),
            cost: 0,
        });
        Ok(())
    }

    /// Landed symbol ids of the reels as they stand
    pub fn reel_ids(&self) -> Vec<String> {
        reel_ids(&self.state.reels)
    }
}

impl std::fmt::Debug for SlotMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotMachine")
            .field("status", &self.state.status)
            .field("balance", &self.state.balance)
            .field("seed", &self.seed)
            .field("spin_index", &self.spin_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SymbolId::*;

    #[test]
    fn test_jackpot_only_at_base_multiplier() {
        let triple = evaluate(&[Vampire, Vampire, Vampire]);
        assert_eq!(step_payout(&triple, 10, 1, 1.0, 5123.9), (5123, true));
        assert_eq!(step_payout(&triple, 10, 2, 2.0, 5123.9), (4000, false));
        // cursed heart: effective 3.0 at multiplier 2
        assert_eq!(step_payout(&triple, 10, 2, 3.0, 5123.9), (6000, false));
    }

    #[test]
    fn test_pair_payout_floors() {
        let pair = evaluate(&[Candle, Candle, Rose]);
        assert_eq!(pair.payout_multiplier, 1);
        assert_eq!(step_payout(&pair, 10, 1, 1.5, 0.0), (15, false));
        assert_eq!(step_payout(&pair, 15, 1, 1.5, 0.0), (22, false));
    }

    #[test]
    fn test_landing_priority() {
        let mut machine = SlotMachine::with_seed(SlotConfig::studio(), 1);
        let pending = PendingSpin {
            bet: 10,
            targets: [Rose, Rose, Rose],
            reported: [Some(Bat), Some(Bat), None],
            landed: [None; REEL_COUNT],
        };
        machine.debug_force_symbol(0, Some(Coffin));
        assert_eq!(machine.landing(&pending, 0), Coffin);
        assert_eq!(machine.landing(&pending, 1), Bat);
        assert_eq!(machine.landing(&pending, 2), Rose);
    }
}
