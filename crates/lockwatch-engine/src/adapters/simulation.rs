//! Simulation Orchestrator - scripted process actors against a live detector
//!
//! ```text
//!   Simulation::run
//!     ├─ Arc<Ledger>
//!     ├─ Detector  ── Tee(LogSink, ChannelSink) ──> reports
//!     ├─ actor P0  ── request / release / sleep ──┐
//!     ├─ actor P1  ──            ...              ├─> Ledger
//!     └─ actor Pn  ──            ...              ┘
//!
//!   sleep(duration) -> abort everything -> SimulationSummary
//! ```
//!
//! Actors move to their next step whatever the request outcome; a WAITING
//! request only leaves demand in the Request matrix. After its last step an
//! actor idles, keeping its holdings, until the run is torn down.

use super::detector::Detector;
use super::sink::{ChannelSink, LogSink, Tee};
use crate::domain::{
    detect_once, ConfigError, Cycle, DetectionReport, Ledger, LedgerError, ProcessId, Snapshot,
};
use crate::infrastructure::{SimulationConfig, Step};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info};

/// A protocol error that stopped one actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorFailure {
    /// Actor that stopped
    pub process: ProcessId,
    /// Index of the failing step in its script
    pub step: usize,
    /// Rejection returned by the ledger
    pub error: LedgerError,
}

impl fmt::Display for ActorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stopped at step {}: {}", self.process, self.step, self.error)
    }
}

/// Apply one non-sleep step to the ledger
fn apply(ledger: &Ledger, process: ProcessId, step: &Step) -> Result<(), LedgerError> {
    match *step {
        Step::Request { resource, count } => ledger.request(process, resource, count).map(|_| ()),
        Step::Release { resource, count } => ledger.release(process, resource, count),
        Step::Sleep { .. } => Ok(()),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Timed Simulation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    /// Every report the detector emitted, in order
    pub reports: Vec<DetectionReport>,
    /// Ledger contents after all tasks were stopped
    pub final_snapshot: Snapshot,
    /// Actors that stopped on a protocol error
    pub failures: Vec<ActorFailure>,
}

impl SimulationSummary {
    /// Cycle of the first deadlock report, if any pass found one
    pub fn first_deadlock(&self) -> Option<&Cycle> {
        self.reports.iter().find_map(DetectionReport::cycle)
    }

    /// Number of passes that reported a deadlock
    pub fn deadlock_passes(&self) -> usize {
        self.reports.iter().filter(|r| r.is_deadlock()).count()
    }
}

/// One timed run of scripted actors plus the detector
pub struct Simulation {
    config: SimulationConfig,
    ledger: Arc<Ledger>,
}

impl Simulation {
    /// Validate the scenario and build a fresh ledger for it
    ///
    /// # Errors
    /// Any [`SimulationConfig::validate`] error.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ledger = Arc::new(Ledger::new(&config.engine)?);
        Ok(Self { config, ledger })
    }

    /// Shared ledger driven by this simulation
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Run for the configured duration, then tear everything down
    ///
    /// # Panics
    /// Outside a tokio runtime.
    pub async fn run(self) -> SimulationSummary {
        let dims = self.ledger.dimensions();
        info!(
            processes = dims.processes,
            resources = dims.resources,
            duration_ms = self.config.duration.as_millis() as u64,
            "🚀 simulation started"
        );

        let (report_sink, mut reports_rx) = ChannelSink::channel();
        // Interval was validated with the scenario
        let detector = match Detector::new(
            self.ledger.clone(),
            self.config.engine.detection_interval,
            Tee::new(LogSink::new(), report_sink),
        ) {
            Ok(detector) => Some(detector.spawn()),
            Err(e) => {
                error!(error = %e, "detector not started");
                None
            }
        };

        let (failure_tx, mut failure_rx) = mpsc::unbounded_channel();
        let actors: Vec<JoinHandle<()>> = dims
            .process_ids()
            .map(|process| {
                let steps = self.config.script(process).to_vec();
                tokio::spawn(drive_actor(
                    self.ledger.clone(),
                    process,
                    steps,
                    failure_tx.clone(),
                ))
            })
            .collect();
        drop(failure_tx);

        time::sleep(self.config.duration).await;

        info!("⏹️ run time elapsed, stopping actors and detector");
        let passes = match detector {
            Some(handle) => handle.shutdown().await,
            None => 0,
        };
        for actor in &actors {
            actor.abort();
        }
        for actor in actors {
            let _ = actor.await;
        }

        let mut reports = Vec::new();
        while let Ok(report) = reports_rx.try_recv() {
            reports.push(report);
        }
        let mut failures = Vec::new();
        while let Ok(failure) = failure_rx.try_recv() {
            failures.push(failure);
        }

        let final_snapshot = self.ledger.snapshot();
        info!(
            passes,
            deadlock_passes = reports.iter().filter(|r| r.is_deadlock()).count(),
            failures = failures.len(),
            "simulation finished"
        );

        SimulationSummary {
            reports,
            final_snapshot,
            failures,
        }
    }
}

async fn drive_actor(
    ledger: Arc<Ledger>,
    process: ProcessId,
    steps: Vec<Step>,
    failures: mpsc::UnboundedSender<ActorFailure>,
) {
    debug!(%process, steps = steps.len(), "actor started");

    for (index, step) in steps.iter().enumerate() {
        if let Step::Sleep { ms } = *step {
            time::sleep(Duration::from_millis(ms)).await;
            continue;
        }
        if let Err(e) = apply(&ledger, process, step) {
            error!(%process, step = index, error = %e, "actor stopped on protocol error");
            let _ = failures.send(ActorFailure {
                process,
                step: index,
                error: e,
            });
            return;
        }
    }

    debug!(%process, "script finished, idling");
    std::future::pending::<()>().await;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sequential Replay
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ledger state and single detection pass after a sequential replay
#[derive(Debug)]
pub struct Replay {
    /// Ledger after every script ran to its end (or first error)
    pub ledger: Ledger,
    /// Actors that stopped on a protocol error
    pub failures: Vec<ActorFailure>,
    /// Result of one detection pass over the final ledger
    pub report: DetectionReport,
}

/// Replay a scenario without timers, then run one detection pass
///
/// Actors take turns in process order, one non-sleep step each per round,
/// until every script is exhausted. Sleeps are skipped. An actor that hits
/// a protocol error drops out of later rounds.
///
/// # Errors
/// Any [`SimulationConfig::validate`] error.
pub fn replay(config: &SimulationConfig) -> Result<Replay, ConfigError> {
    config.validate()?;
    let ledger = Ledger::new(&config.engine)?;
    let dims = ledger.dimensions();

    let mut cursors: Vec<Option<usize>> = vec![Some(0); dims.processes];
    let mut failures = Vec::new();

    loop {
        let mut progressed = false;

        for process in dims.process_ids() {
            let script = config.script(process);
            let slot = &mut cursors[process.as_usize()];
            let Some(start) = *slot else { continue };

            let next = script[start.min(script.len())..]
                .iter()
                .position(|s| !matches!(s, Step::Sleep { .. }))
                .map(|offset| start + offset);
            let Some(index) = next else {
                *slot = None;
                continue;
            };

            progressed = true;
            match apply(&ledger, process, &script[index]) {
                Ok(()) => *slot = Some(index + 1),
                Err(e) => {
                    *slot = None;
                    failures.push(ActorFailure {
                        process,
                        step: index,
                        error: e,
                    });
                }
            }
        }

        if !progressed {
            break;
        }
    }

    let report = detect_once(&ledger);
    Ok(Replay {
        ledger,
        failures,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceId;
    use crate::infrastructure::{ActorScript, EngineConfig};

    fn scenario(available: Vec<u32>, actors: Vec<Vec<Step>>) -> SimulationConfig {
        let engine = EngineConfig::builder()
            .processes(actors.len())
            .inventory(available)
            .detection_interval(Duration::from_secs(1))
            .build()
            .unwrap();
        SimulationConfig {
            engine,
            duration: Duration::from_secs(3),
            actors: actors.into_iter().map(ActorScript::new).collect(),
        }
    }

    #[test]
    fn test_replay_circular_wait() {
        let replay = replay(&SimulationConfig::circular_wait()).unwrap();
        let cycle = replay.report.cycle().unwrap();
        assert_eq!(cycle.members(), &[ProcessId(0), ProcessId(1), ProcessId(2)]);
        assert!(replay.failures.is_empty());
        assert!(replay.ledger.check_conservation().is_ok());
    }

    #[test]
    fn test_replay_interleaves_rounds() {
        let config = scenario(
            vec![1],
            vec![
                vec![Step::request(0, 1), Step::release(0, 1)],
                vec![Step::sleep(10), Step::request(0, 1)],
            ],
        );
        let replay = replay(&config).unwrap();

        let guard = replay.ledger.lock();
        assert_eq!(guard.held(ProcessId(0), ResourceId(0)), 0);
        // P1's request ran in round one, before the release
        assert_eq!(guard.pending(ProcessId(1), ResourceId(0)), 1);
        assert_eq!(guard.held(ProcessId(1), ResourceId(0)), 0);
        drop(guard);
        assert_eq!(replay.report, DetectionReport::NoDeadlock);
    }

    #[test]
    fn test_replay_records_failure_and_continues() {
        let config = scenario(
            vec![2],
            vec![
                vec![Step::release(0, 1), Step::request(0, 1)],
                vec![Step::request(0, 1)],
            ],
        );
        let replay = replay(&config).unwrap();

        assert_eq!(replay.failures.len(), 1);
        let failure = &replay.failures[0];
        assert_eq!(failure.process, ProcessId(0));
        assert_eq!(failure.step, 0);
        assert!(failure.error.is_over_release());
        // P0 dropped out; P1 still ran
        assert_eq!(replay.ledger.lock().held(ProcessId(1), ResourceId(0)), 1);
        assert_eq!(replay.ledger.lock().held(ProcessId(0), ResourceId(0)), 0);
    }

    #[test]
    fn test_failure_display() {
        let failure = ActorFailure {
            process: ProcessId(2),
            step: 4,
            error: LedgerError::ZeroCount {
                process: ProcessId(2),
                resource: ResourceId(0),
            },
        };
        assert!(failure.to_string().starts_with("P2 stopped at step 4: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_circular_wait() {
        let mut config = SimulationConfig::circular_wait();
        config.duration = Duration::from_secs(6);

        let summary = Simulation::new(config).unwrap().run().await;

        assert_eq!(summary.reports.len(), 1);
        let cycle = summary.first_deadlock().unwrap();
        assert_eq!(cycle.members(), &[ProcessId(0), ProcessId(1), ProcessId(2)]);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.final_snapshot.available(), &[0, 0, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_failing_actor_only() {
        let config = scenario(
            vec![1, 1],
            vec![
                vec![Step::release(1, 1)],
                vec![Step::request(0, 1), Step::sleep(100), Step::request(1, 1)],
            ],
        );

        let summary = Simulation::new(config).unwrap().run().await;

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].process, ProcessId(0));
        assert_eq!(summary.final_snapshot.available(), &[0, 0]);
        assert_eq!(summary.deadlock_passes(), 0);
        assert!(!summary.reports.is_empty());
    }
}
