//! Integration Tests - Detection Loop & Simulation on Paused Time
//!
//! `start_paused` makes the tokio clock auto-advance only when every task
//! is idle, so interval timing is exact and the tests never sleep for real.

use lockwatch_engine::adapters::{ChannelSink, Detector, DetectorPhase, Simulation};
use lockwatch_engine::domain::*;
use lockwatch_engine::infrastructure::{SimulationConfig, DEFAULT_DETECTION_INTERVAL};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};

fn deadlocked_pair() -> Arc<Ledger> {
    let ledger = Arc::new(Ledger::with_inventory(2, vec![1, 1]).unwrap());
    for (p, r) in [(0, 0), (1, 1), (0, 1), (1, 0)] {
        ledger.request(ProcessId(p), ResourceId(r), 1).unwrap();
    }
    ledger
}

#[tokio::test(start_paused = true)]
async fn test_no_report_before_first_interval() {
    let (sink, mut rx) = ChannelSink::channel();
    let handle = Detector::new(deadlocked_pair(), DEFAULT_DETECTION_INTERVAL, sink)
        .unwrap()
        .spawn();

    let early = time::timeout(Duration::from_secs(4), rx.recv()).await;
    assert!(early.is_err());
    assert_eq!(handle.passes(), 0);
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_reports_cycle_on_each_tick() {
    let (sink, mut rx) = ChannelSink::channel();
    let start = Instant::now();
    let handle = Detector::new(deadlocked_pair(), DEFAULT_DETECTION_INTERVAL, sink)
        .unwrap()
        .spawn();

    for pass in 1..=3u32 {
        let report = rx.recv().await.unwrap();
        let due = DEFAULT_DETECTION_INTERVAL * pass;
        let elapsed = start.elapsed();
        assert!(elapsed >= due && elapsed < due + Duration::from_millis(5));
        assert_eq!(
            report.cycle().unwrap().members(),
            &[ProcessId(0), ProcessId(1)]
        );
    }
    assert_eq!(handle.passes(), 3);
    assert_eq!(handle.phase(), DetectorPhase::Idle);

    assert_eq!(handle.shutdown().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_abort_mid_run_leaves_ledger_usable() {
    let ledger = deadlocked_pair();
    let (sink, mut rx) = ChannelSink::channel();
    let handle = Detector::new(ledger.clone(), Duration::from_millis(10), sink)
        .unwrap()
        .spawn();

    rx.recv().await.unwrap();
    handle.shutdown().await;

    // Lock is free and state intact
    ledger.release(ProcessId(0), ResourceId(0), 1).unwrap();
    assert_eq!(ledger.check_conservation(), Ok(()));
}

#[tokio::test(start_paused = true)]
async fn test_circular_wait_simulation() {
    let mut config = SimulationConfig::circular_wait();
    config.duration = Duration::from_secs(6);

    let summary = Simulation::new(config).unwrap().run().await;

    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.deadlock_passes(), 1);
    let cycle = summary.first_deadlock().unwrap();
    assert_eq!(cycle.to_string(), "P0 -> P1 -> P2 -> P0");
    assert!(!cycle.contains(ProcessId(3)));

    // Holdings and stale demand stay put after teardown
    let snapshot = &summary.final_snapshot;
    assert_eq!(snapshot.available(), &[0, 0, 0]);
    assert_eq!(
        snapshot.request().to_rows(),
        vec![vec![0, 1, 0], vec![0, 0, 1], vec![1, 0, 0], vec![0, 0, 0]]
    );
}

#[tokio::test(start_paused = true)]
async fn test_simulation_before_requests_complete_sees_no_deadlock() {
    // Detection fires while actors are still asleep after their first grant
    let mut config = SimulationConfig::circular_wait();
    config.engine.detection_interval = Duration::from_millis(500);
    config.duration = Duration::from_millis(700);

    let summary = Simulation::new(config).unwrap().run().await;

    assert_eq!(summary.reports, vec![DetectionReport::NoDeadlock]);
    assert!(summary.first_deadlock().is_none());
}
