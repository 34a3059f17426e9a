//! The gated feature: a timed, randomized profit/loss simulation.
//!
//! Four-phase machine: `Idle -> Running -> { TargetReached, ManuallyStopped }`,
//! with both terminal phases re-entering `Running` on an explicit restart.
//! Restart always resets cumulative profit, the day counter, and the log;
//! a mere stop never does.
//!
//! The pure tick transition ([`SimulationEngine::apply_tick`]) is separated
//! from timer scheduling ([`SimulationEngine::poll`]) so tests can drive the
//! state machine with injected draws and timestamps.

pub mod log;
pub mod tick;

pub use log::{LogKind, TradeLog, TradeLogEntry, TRADE_LOG_CAP};
pub use tick::{TickDraw, TradeSide};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, GateError, PlatformResult, ValidationError};
use crate::gate::AccessGate;

/// Phase of the simulation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// Never started, or torn down by logout.
    Idle,
    /// Ticks are being scheduled.
    Running,
    /// Terminal: the cumulative profit target was hit.
    TargetReached,
    /// Terminal: the user stopped the run.
    ManuallyStopped,
}

/// Engine tuning. Validated at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Display starting balance.
    pub starting_balance: f64,
    /// Cumulative profit at which the run terminates.
    pub target_profit: f64,
    /// Bernoulli success probability per tick, in `[0, 1]`.
    pub success_rate: f64,
    /// Fixed tick period.
    pub tick_period: Duration,
    /// Coarse simulated-day counter advances after this many log entries.
    pub entries_per_day: u64,
    /// Cap on the simulated-day counter.
    pub day_cap: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1_250.0,
            target_profit: 2_000.0,
            success_rate: 0.65,
            tick_period: Duration::seconds(5),
            entries_per_day: 8,
            day_cap: 14,
        }
    }
}

impl EngineConfig {
    /// Checks field ranges.
    ///
    /// # Errors
    ///
    /// `ValidationError::ConfigOutOfRange` naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(ValidationError::ConfigOutOfRange {
                field: "success_rate",
                value: self.success_rate,
            });
        }
        if self.starting_balance < 0.0 {
            return Err(ValidationError::ConfigOutOfRange {
                field: "starting_balance",
                value: self.starting_balance,
            });
        }
        if self.target_profit <= 0.0 {
            return Err(ValidationError::ConfigOutOfRange {
                field: "target_profit",
                value: self.target_profit,
            });
        }
        if self.tick_period <= Duration::zero() {
            return Err(ValidationError::ConfigOutOfRange {
                field: "tick_period",
                value: self.tick_period.num_milliseconds() as f64,
            });
        }
        Ok(())
    }
}

/// Serializable snapshot of the engine for display layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Whether ticks are being scheduled.
    pub running: bool,
    /// Current phase.
    pub phase: EnginePhase,
    /// Display starting balance.
    pub balance: f64,
    /// Profit accumulated this run.
    pub cumulative_profit: f64,
    /// Configured target.
    pub target_profit: f64,
    /// Configured per-tick success probability.
    pub success_rate: f64,
    /// Coarse simulated-day counter.
    pub day_count: u32,
    /// Retained log entries, oldest first.
    pub log: Vec<TradeLogEntry>,
}

/// The simulation engine. Reads the access gate, never mutates it.
pub struct SimulationEngine {
    config: EngineConfig,
    phase: EnginePhase,
    cumulative_profit: f64,
    day_count: u32,
    log: TradeLog,
    next_tick_at: Option<DateTime<Utc>>,
}

impl SimulationEngine {
    /// Creates an idle engine.
    ///
    /// # Errors
    ///
    /// `ValidationError` when the config is out of range.
    pub fn new(config: EngineConfig) -> PlatformResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            phase: EnginePhase::Idle,
            cumulative_profit: 0.0,
            day_count: 0,
            log: TradeLog::new(),
            next_tick_at: None,
        })
    }

    /// Whether the gate currently permits this feature.
    ///
    /// Consults the gate on every call; nothing is cached here.
    #[must_use]
    pub fn is_enabled(&self, gate: &AccessGate) -> bool {
        gate.is_feature_unlocked()
    }

    /// (Re)starts the simulation.
    ///
    /// A no-op while already `Running`. From any other phase the run state
    /// is reset: cumulative profit and day count to zero, log cleared and
    /// re-seeded with the two boot entries, first tick scheduled one period
    /// out.
    ///
    /// # Errors
    ///
    /// `GateError::FeatureLocked` (with no state change) when the gate
    /// reports locked.
    pub fn start(&mut self, gate: &AccessGate, now: DateTime<Utc>) -> PlatformResult<()> {
        if !self.is_enabled(gate) {
            return Err(GateError::FeatureLocked.into());
        }
        if self.phase == EnginePhase::Running {
            return Ok(());
        }

        self.cumulative_profit = 0.0;
        self.day_count = 0;
        self.log.clear();
        self.log
            .append(LogKind::Info, "AI bot initialized. Starting simulation.", now);
        self.log.append(
            LogKind::Info,
            format!(
                "Day 1: Starting with ${:.2}. Target: ${:.2} profit.",
                self.config.starting_balance, self.config.target_profit
            ),
            now,
        );
        self.phase = EnginePhase::Running;
        self.next_tick_at = Some(now + self.config.tick_period);
        Ok(())
    }

    /// Executes one tick if the timer is due, sampling draws from `rng`.
    ///
    /// Returns whether a tick was executed. Does nothing unless `Running`.
    pub fn poll<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> bool {
        if self.phase != EnginePhase::Running {
            return false;
        }
        let Some(due) = self.next_tick_at else {
            return false;
        };
        if now < due {
            return false;
        }
        let draw = TickDraw::sample(rng);
        self.apply_tick(draw, now);
        if self.phase == EnginePhase::Running {
            self.next_tick_at = Some(now + self.config.tick_period);
        }
        true
    }

    /// The pure tick transition. Only acts while `Running`.
    ///
    /// Success is decided by `draw.roll < success_rate`; profit and loss
    /// are `size x rate` with cumulative profit floored at zero; the day
    /// counter advances every `entries_per_day` appended log entries
    /// (capped); reaching the target appends the terminal entry, halts the
    /// tick timer, and transitions to `TargetReached`.
    pub fn apply_tick(&mut self, draw: TickDraw, now: DateTime<Utc>) {
        if self.phase != EnginePhase::Running {
            return;
        }

        let side = draw.side.label();
        if draw.roll < self.config.success_rate {
            let profit = draw.size * draw.profit_rate;
            self.cumulative_profit += profit;
            self.log.append(
                LogKind::Profit,
                format!("{side} SOL: ${profit:.2} profit on ${:.2}", draw.size),
                now,
            );
        } else {
            let loss = draw.size * draw.loss_rate;
            self.cumulative_profit -= loss;
            if self.cumulative_profit < 0.0 {
                self.cumulative_profit = 0.0;
            }
            self.log.append(
                LogKind::Loss,
                format!("{side} SOL: ${loss:.2} loss on ${:.2}", draw.size),
                now,
            );
        }

        if self.log.total_appended() % self.config.entries_per_day == 0
            && self.day_count < self.config.day_cap
        {
            self.day_count += 1;
        }

        if self.cumulative_profit >= self.config.target_profit {
            self.log.append(
                LogKind::Success,
                format!("TARGET REACHED! ${:.2} profit.", self.cumulative_profit),
                now,
            );
            self.phase = EnginePhase::TargetReached;
            self.next_tick_at = None;
        }
    }

    /// Stops a running simulation.
    ///
    /// Cancels the pending tick atomically with the phase transition: no
    /// tick can execute after this returns. Profit, day count, and log
    /// survive the stop.
    ///
    /// # Errors
    ///
    /// `EngineError::NotRunning` from any phase other than `Running`.
    pub fn stop(&mut self, now: DateTime<Utc>) -> PlatformResult<()> {
        if self.phase != EnginePhase::Running {
            return Err(EngineError::NotRunning.into());
        }
        self.next_tick_at = None;
        self.phase = EnginePhase::ManuallyStopped;
        self.log.append(LogKind::Info, "Auto-trading stopped.", now);
        Ok(())
    }

    /// Unconditional teardown used by logout: cancel any pending tick and
    /// return the engine to a fresh idle state. Never fails.
    pub fn halt(&mut self) {
        self.phase = EnginePhase::Idle;
        self.next_tick_at = None;
        self.cumulative_profit = 0.0;
        self.day_count = 0;
        self.log.clear();
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// True while ticks are being scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == EnginePhase::Running
    }

    /// Profit accumulated this run. Never negative.
    #[must_use]
    pub const fn cumulative_profit(&self) -> f64 {
        self.cumulative_profit
    }

    /// Coarse simulated-day counter.
    #[must_use]
    pub const fn day_count(&self) -> u32 {
        self.day_count
    }

    /// The bounded activity log.
    #[must_use]
    pub const fn log(&self) -> &TradeLog {
        &self.log
    }

    /// When the next tick is due, while running.
    #[must_use]
    pub const fn next_tick_at(&self) -> Option<DateTime<Utc>> {
        self.next_tick_at
    }

    /// Progress toward the target, clamped to `[0, 100]`.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        (self.cumulative_profit / self.config.target_profit * 100.0).min(100.0)
    }

    /// Profit still needed to reach the target.
    #[must_use]
    pub fn remaining_to_target(&self) -> f64 {
        (self.config.target_profit - self.cumulative_profit).max(0.0)
    }

    /// Display snapshot.
    #[must_use]
    pub fn state(&self) -> SimulationState {
        SimulationState {
            running: self.is_running(),
            phase: self.phase,
            balance: self.config.starting_balance,
            cumulative_profit: self.cumulative_profit,
            target_profit: self.config.target_profit,
            success_rate: self.config.success_rate,
            day_count: self.day_count,
            log: self.log.entries().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{AccessGate, AssetKind, PurchaseRecord};
    use crate::storage::MemoryLedger;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn unlocked_gate() -> AccessGate {
        let mut gate = AccessGate::new(Arc::new(MemoryLedger::new()));
        gate.mark_identity_linked().unwrap();
        gate.mark_value_verified(PurchaseRecord {
            amount: 100.0,
            asset: AssetKind::Sol,
            verified_at: Utc::now(),
            reference_id: "SOLTEST0001".to_string(),
        })
        .unwrap();
        gate
    }

    fn engine(config: EngineConfig) -> SimulationEngine {
        SimulationEngine::new(config).unwrap()
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());

        config.success_rate = 1.5;
        assert!(config.validate().is_err());

        config = EngineConfig {
            target_profit: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_start_rejected_while_locked() {
        let gate = AccessGate::new(Arc::new(MemoryLedger::new()));
        let mut eng = engine(EngineConfig::default());
        let err = eng.start(&gate, Utc::now()).unwrap_err();
        assert!(err.is_locked());
        // No state change.
        assert_eq!(eng.phase(), EnginePhase::Idle);
        assert!(eng.log().is_empty());
    }

    #[test]
    fn test_start_seeds_log_and_schedules() {
        let gate = unlocked_gate();
        let mut eng = engine(EngineConfig::default());
        let now = Utc::now();
        eng.start(&gate, now).unwrap();

        assert_eq!(eng.phase(), EnginePhase::Running);
        assert_eq!(eng.log().len(), 2);
        assert_eq!(eng.next_tick_at(), Some(now + Duration::seconds(5)));

        // Starting again while running is a no-op: log untouched.
        eng.start(&gate, now + Duration::seconds(1)).unwrap();
        assert_eq!(eng.log().len(), 2);
        assert_eq!(eng.next_tick_at(), Some(now + Duration::seconds(5)));
    }

    #[test]
    fn test_profit_tick() {
        let gate = unlocked_gate();
        let mut eng = engine(EngineConfig::default());
        let now = Utc::now();
        eng.start(&gate, now).unwrap();

        eng.apply_tick(TickDraw::winning(50.0, 0.04), now);
        assert!((eng.cumulative_profit() - 2.0).abs() < 1e-9);
        assert_eq!(eng.log().last().unwrap().kind, LogKind::Profit);
    }

    #[test]
    fn test_loss_floors_at_zero() {
        let gate = unlocked_gate();
        let mut eng = engine(EngineConfig::default());
        let now = Utc::now();
        eng.start(&gate, now).unwrap();

        eng.apply_tick(TickDraw::losing(99.0, 0.07), now);
        assert_eq!(eng.cumulative_profit(), 0.0);
        assert_eq!(eng.log().last().unwrap().kind, LogKind::Loss);

        // Profit never observed negative over a long mixed sequence.
        let mut rng = StdRng::seed_from_u64(11);
        for i in 0..500 {
            let at = now + Duration::seconds(i);
            eng.apply_tick(TickDraw::sample(&mut rng), at);
            assert!(eng.cumulative_profit() >= 0.0);
            if eng.phase() != EnginePhase::Running {
                break;
            }
        }
    }

    #[test]
    fn test_day_counter_every_eighth_entry_capped() {
        let gate = unlocked_gate();
        // Huge target so the run never terminates in this test.
        let mut eng = engine(EngineConfig {
            target_profit: 1e12,
            ..EngineConfig::default()
        });
        let now = Utc::now();
        eng.start(&gate, now).unwrap();
        // Boot entries count toward the total: 2 so far.
        assert_eq!(eng.day_count(), 0);

        for i in 0..6 {
            eng.apply_tick(TickDraw::winning(50.0, 0.02), now + Duration::seconds(i));
        }
        // Total appended is now 8.
        assert_eq!(eng.day_count(), 1);

        for i in 6..200 {
            eng.apply_tick(TickDraw::winning(50.0, 0.02), now + Duration::seconds(i));
        }
        assert_eq!(eng.day_count(), 14);
    }

    #[test]
    fn test_target_reached_halts_and_logs_success() {
        let gate = unlocked_gate();
        let mut eng = engine(EngineConfig {
            target_profit: 10.0,
            success_rate: 1.0,
            ..EngineConfig::default()
        });
        let now = Utc::now();
        eng.start(&gate, now).unwrap();

        let mut ticks = 0;
        while eng.phase() == EnginePhase::Running {
            eng.apply_tick(TickDraw::winning(90.0, 0.045), now + Duration::seconds(ticks));
            ticks += 1;
            assert!(ticks < 100, "target never reached");
        }

        assert_eq!(eng.phase(), EnginePhase::TargetReached);
        assert!(eng.cumulative_profit() >= 10.0);
        assert_eq!(eng.log().last().unwrap().kind, LogKind::Success);
        assert!(eng.next_tick_at().is_none());

        // No further growth: ticks after the terminal phase are ignored.
        let len = eng.log().len();
        eng.apply_tick(TickDraw::winning(90.0, 0.045), now + Duration::seconds(ticks));
        assert_eq!(eng.log().len(), len);

        // Restart resets profit and log.
        eng.start(&gate, now + Duration::minutes(1)).unwrap();
        assert_eq!(eng.phase(), EnginePhase::Running);
        assert_eq!(eng.cumulative_profit(), 0.0);
        assert_eq!(eng.day_count(), 0);
        assert_eq!(eng.log().len(), 2);
    }

    #[test]
    fn test_stop_only_from_running_and_halts_ticks() {
        let gate = unlocked_gate();
        let mut eng = engine(EngineConfig::default());
        let now = Utc::now();

        assert!(eng.stop(now).is_err());

        eng.start(&gate, now).unwrap();
        eng.apply_tick(TickDraw::winning(50.0, 0.02), now);
        let profit = eng.cumulative_profit();

        eng.stop(now + Duration::seconds(1)).unwrap();
        assert_eq!(eng.phase(), EnginePhase::ManuallyStopped);
        assert!(eng.next_tick_at().is_none());
        // Stop pauses: profit survives, only restart resets it.
        assert_eq!(eng.cumulative_profit(), profit);

        // No tick may execute after stop returns.
        let len = eng.log().len();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(!eng.poll(now + Duration::minutes(1), &mut rng));
        assert_eq!(eng.log().len(), len);
    }

    #[test]
    fn test_poll_respects_the_tick_period() {
        let gate = unlocked_gate();
        let mut eng = engine(EngineConfig::default());
        let now = Utc::now();
        eng.start(&gate, now).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        // Not due yet.
        assert!(!eng.poll(now + Duration::seconds(4), &mut rng));
        assert_eq!(eng.log().len(), 2);

        // Due: exactly one tick executes and the timer reschedules.
        let at = now + Duration::seconds(5);
        assert!(eng.poll(at, &mut rng));
        assert_eq!(eng.log().len(), 3);
        assert_eq!(eng.next_tick_at(), Some(at + Duration::seconds(5)));
        assert!(!eng.poll(at + Duration::seconds(1), &mut rng));
    }

    #[test]
    fn test_halt_resets_everything() {
        let gate = unlocked_gate();
        let mut eng = engine(EngineConfig::default());
        let now = Utc::now();
        eng.start(&gate, now).unwrap();
        eng.apply_tick(TickDraw::winning(50.0, 0.02), now);

        eng.halt();
        assert_eq!(eng.phase(), EnginePhase::Idle);
        assert_eq!(eng.cumulative_profit(), 0.0);
        assert!(eng.log().is_empty());
        assert!(eng.next_tick_at().is_none());
    }

    #[test]
    fn test_progress_helpers() {
        let gate = unlocked_gate();
        let mut eng = engine(EngineConfig {
            target_profit: 100.0,
            ..EngineConfig::default()
        });
        let now = Utc::now();
        eng.start(&gate, now).unwrap();
        eng.apply_tick(TickDraw::winning(50.0, 0.5), now); // +25

        assert!((eng.progress_percent() - 25.0).abs() < 1e-9);
        assert!((eng.remaining_to_target() - 75.0).abs() < 1e-9);
    }
}
