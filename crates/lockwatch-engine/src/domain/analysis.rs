//! One detection pass: snapshot -> wait-for graph -> cycle search

use super::cycle::CycleDetector;
use super::ledger::Ledger;
use super::report::DetectionReport;
use super::snapshot::Snapshot;
use super::wait_for::WaitForGraph;
use tracing::trace;

/// Analyse a snapshot that the caller already owns
pub fn analyze(snapshot: &Snapshot) -> DetectionReport {
    let graph = WaitForGraph::from_snapshot(snapshot);
    trace!(edges = %graph, "wait-for graph built");

    match CycleDetector::find_cycle(&graph) {
        Some(cycle) => DetectionReport::Deadlock {
            cycle,
            request_snapshot: snapshot.request().clone(),
        },
        None => DetectionReport::NoDeadlock,
    }
}

/// Snapshot the ledger (lock held for the copy only), then analyse the copy
pub fn detect_once(ledger: &Ledger) -> DetectionReport {
    let snapshot = ledger.snapshot();
    analyze(&snapshot)
}
