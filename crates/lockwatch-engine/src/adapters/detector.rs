//! Detection Loop - periodic snapshot analysis on a tokio timer
//!
//! # State Machine
//!
//! ```text
//!            tick (every `interval`)
//!   ┌──────┐ ─────────────────────────> ┌───────────┐
//!   │ IDLE │                            │ ANALYZING │
//!   └──────┘ <───────────────────────── └───────────┘
//!              report emitted
//! ```
//!
//! On entering ANALYZING the task locks the ledger, copies it, and unlocks
//! before building the graph. The only `.await` is the tick, where no lock
//! is held, so aborting the task at any point leaves the ledger intact.
//! The loop has no stop condition of its own; it ends when aborted or when
//! the runtime shuts down.

use super::sink::ReportSink;
use crate::domain::{detect_once, ConfigError, Ledger};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Detector state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    /// Waiting for the next tick
    Idle = 0,
    /// Snapshot taken, analysis running
    Analyzing = 1,
}

impl DetectorPhase {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Analyzing,
            _ => Self::Idle,
        }
    }
}

/// Periodic deadlock detector bound to one ledger
pub struct Detector<S: ReportSink> {
    ledger: Arc<Ledger>,
    interval: Duration,
    sink: S,
}

impl<S: ReportSink> Detector<S> {
    /// Create a detector that runs every `interval`
    ///
    /// # Errors
    /// `ZeroInterval` if `interval` is zero.
    pub fn new(ledger: Arc<Ledger>, interval: Duration, sink: S) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self {
            ledger,
            interval,
            sink,
        })
    }

    /// Spawn the loop on the current tokio runtime
    ///
    /// The first pass runs one full interval after spawning.
    ///
    /// # Panics
    /// Outside a tokio runtime.
    pub fn spawn(self) -> DetectorHandle {
        let phase = Arc::new(AtomicU8::new(DetectorPhase::Idle as u8));
        let passes = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(self.run(phase.clone(), passes.clone()));

        DetectorHandle {
            phase,
            passes,
            task,
        }
    }

    async fn run(mut self, phase: Arc<AtomicU8>, passes: Arc<AtomicU64>) {
        info!(interval_ms = self.interval.as_millis() as u64, "🔍 deadlock detector started");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            phase.store(DetectorPhase::Analyzing as u8, Ordering::Release);
            let report = detect_once(&self.ledger);
            let pass = passes.fetch_add(1, Ordering::AcqRel) + 1;
            debug!(pass, deadlock = report.is_deadlock(), "detection pass complete");

            self.sink.emit(&report);
            phase.store(DetectorPhase::Idle as u8, Ordering::Release);
        }
    }
}

/// Handle to a running detector task
#[derive(Debug)]
pub struct DetectorHandle {
    phase: Arc<AtomicU8>,
    passes: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl DetectorHandle {
    /// Current state of the loop
    pub fn phase(&self) -> DetectorPhase {
        DetectorPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Completed detection passes so far
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Acquire)
    }

    /// Cancel the loop; safe at any point
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Whether the task has ended (only after `abort` or runtime shutdown)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abort and wait until the task is gone
    pub async fn shutdown(self) -> u64 {
        self.task.abort();
        let _ = self.task.await;
        self.passes.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sink::ChannelSink;
    use crate::domain::{DetectionReport, ProcessId, ResourceId};

    #[test]
    fn test_zero_interval_rejected() {
        let ledger = Arc::new(Ledger::with_inventory(1, vec![1]).unwrap());
        let (sink, _rx) = ChannelSink::channel();
        let result = Detector::new(ledger, Duration::ZERO, sink);
        assert!(matches!(result, Err(ConfigError::ZeroInterval)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pass_after_one_interval() {
        let ledger = Arc::new(Ledger::with_inventory(2, vec![1]).unwrap());
        let (sink, mut rx) = ChannelSink::channel();
        let handle = Detector::new(ledger, Duration::from_secs(5), sink)
            .unwrap()
            .spawn();

        let early = time::timeout(Duration::from_millis(4_900), rx.recv()).await;
        assert!(early.is_err(), "no pass before the first interval elapses");
        assert_eq!(handle.passes(), 0);

        assert_eq!(rx.recv().await, Some(DetectionReport::NoDeadlock));
        assert_eq!(handle.passes(), 1);
        assert_eq!(handle.phase(), DetectorPhase::Idle);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sees_ledger_changes_between_passes() {
        let ledger = Arc::new(Ledger::with_inventory(2, vec![1, 1]).unwrap());
        let (sink, mut rx) = ChannelSink::channel();
        let handle = Detector::new(ledger.clone(), Duration::from_secs(5), sink)
            .unwrap()
            .spawn();

        assert_eq!(rx.recv().await, Some(DetectionReport::NoDeadlock));

        ledger.request(ProcessId(0), ResourceId(0), 1).unwrap();
        ledger.request(ProcessId(1), ResourceId(1), 1).unwrap();
        ledger.request(ProcessId(0), ResourceId(1), 1).unwrap();
        ledger.request(ProcessId(1), ResourceId(0), 1).unwrap();

        let report = rx.recv().await.unwrap();
        assert!(report.is_deadlock());
        assert_eq!(handle.passes(), 2);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_stops_reports() {
        let ledger = Arc::new(Ledger::with_inventory(1, vec![1]).unwrap());
        let (sink, mut rx) = ChannelSink::channel();
        let handle = Detector::new(ledger.clone(), Duration::from_secs(1), sink)
            .unwrap()
            .spawn();

        rx.recv().await.unwrap();
        handle.abort();

        // Sender is dropped with the aborted task
        assert_eq!(rx.recv().await, None);
        assert!(handle.is_finished());
        assert!(ledger.check_conservation().is_ok());
        ledger.request(ProcessId(0), ResourceId(0), 1).unwrap();
    }
}
