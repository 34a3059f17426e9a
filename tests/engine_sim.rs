//! Long-run soak of the simulation engine under seeded randomness: the
//! invariants that must hold on every tick of every run, regardless of the
//! draws.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use watchtrade::{
    AccessGate, AssetKind, EngineConfig, EnginePhase, MemoryLedger, PurchaseRecord,
    SimulationEngine, TRADE_LOG_CAP,
};

fn unlocked_gate() -> AccessGate {
    let mut gate = AccessGate::new(Arc::new(MemoryLedger::new()));
    gate.mark_identity_linked().unwrap();
    gate.mark_value_verified(PurchaseRecord {
        amount: 100.0,
        asset: AssetKind::Sol,
        verified_at: Utc::now(),
        reference_id: "SOLSOAK0001".to_string(),
    })
    .unwrap();
    gate
}

#[test]
fn invariants_hold_across_seeds() {
    let gate = unlocked_gate();

    for seed in 0..16u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        let start = Utc::now();
        engine.start(&gate, start).unwrap();

        let mut now = start;
        for _ in 0..2_000 {
            now += Duration::seconds(5);
            let ticked = engine.poll(now, &mut rng);

            // Profit is floored at zero, the log never exceeds its cap,
            // and the day counter stays within its bounds.
            assert!(engine.cumulative_profit() >= 0.0, "seed {seed}");
            assert!(engine.log().len() <= TRADE_LOG_CAP, "seed {seed}");
            assert!(engine.day_count() <= 14, "seed {seed}");

            match engine.phase() {
                EnginePhase::Running => {
                    assert!(ticked);
                    // While running the next tick is always scheduled
                    // exactly one period out.
                    assert_eq!(engine.next_tick_at(), Some(now + Duration::seconds(5)));
                }
                EnginePhase::TargetReached => {
                    assert!(engine.next_tick_at().is_none());
                    assert!(engine.cumulative_profit() >= 2_000.0);
                    break;
                }
                phase => panic!("unexpected phase {phase:?} for seed {seed}"),
            }
        }
    }
}

#[test]
fn log_entries_are_time_ordered() {
    let gate = unlocked_gate();
    let mut rng = StdRng::seed_from_u64(99);
    let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
    let start = Utc::now();
    engine.start(&gate, start).unwrap();

    let mut now = start;
    for _ in 0..100 {
        now += Duration::seconds(5);
        if !engine.poll(now, &mut rng) {
            break;
        }
    }

    let stamps: Vec<_> = engine.log().entries().map(|e| e.at).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn stop_and_restart_round_trip() {
    let gate = unlocked_gate();
    let mut rng = StdRng::seed_from_u64(21);
    // Target high enough that a short run cannot terminate on its own.
    let mut engine = SimulationEngine::new(EngineConfig {
        target_profit: 1e9,
        ..EngineConfig::default()
    })
    .unwrap();
    let start = Utc::now();
    engine.start(&gate, start).unwrap();

    let mut now = start;
    for _ in 0..10 {
        now += Duration::seconds(5);
        engine.poll(now, &mut rng);
    }
    let profit = engine.cumulative_profit();
    let days = engine.day_count();

    // Stop pauses without resetting.
    engine.stop(now).unwrap();
    assert_eq!(engine.phase(), EnginePhase::ManuallyStopped);
    assert_eq!(engine.cumulative_profit(), profit);
    assert_eq!(engine.day_count(), days);
    assert!(!engine.poll(now + Duration::minutes(10), &mut rng));

    // Restart resets the run state and schedules afresh.
    engine.start(&gate, now).unwrap();
    assert_eq!(engine.phase(), EnginePhase::Running);
    assert_eq!(engine.cumulative_profit(), 0.0);
    assert_eq!(engine.day_count(), 0);
    assert_eq!(engine.log().len(), 2);
    assert_eq!(engine.next_tick_at(), Some(now + Duration::seconds(5)));
}

#[test]
fn snapshot_reflects_engine_state() {
    let gate = unlocked_gate();
    let mut rng = StdRng::seed_from_u64(4);
    let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
    let start = Utc::now();
    engine.start(&gate, start).unwrap();
    engine.poll(start + Duration::seconds(5), &mut rng);

    let state = engine.state();
    assert!(state.running);
    assert_eq!(state.phase, EnginePhase::Running);
    assert_eq!(state.balance, 1_250.0);
    assert_eq!(state.target_profit, 2_000.0);
    assert_eq!(state.cumulative_profit, engine.cumulative_profit());
    assert_eq!(state.log.len(), engine.log().len());
}
