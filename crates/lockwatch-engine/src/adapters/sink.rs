//! Report Sinks - where detection results go
//!
//! The detector hands every [`DetectionReport`] to a [`ReportSink`]. Sinks
//! must not block: the detection task calls them between ticks.

use crate::domain::DetectionReport;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Outbound port for detection results
pub trait ReportSink: Send + 'static {
    /// Deliver one report
    fn emit(&mut self, report: &DetectionReport);
}

impl<F> ReportSink for F
where
    F: FnMut(&DetectionReport) + Send + 'static,
{
    fn emit(&mut self, report: &DetectionReport) {
        self(report);
    }
}

/// Fan out to two sinks
#[derive(Debug, Clone)]
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: ReportSink, B: ReportSink> Tee<A, B> {
    /// Deliver to `first`, then `second`
    pub const fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: ReportSink, B: ReportSink> ReportSink for Tee<A, B> {
    fn emit(&mut self, report: &DetectionReport) {
        self.first.emit(report);
        self.second.emit(report);
    }
}

/// Console reporting through `tracing`
///
/// Deadlocks go out at `warn`, clean passes at `info`, each stamped with the
/// UTC time of day of the pass in the `at_utc` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a log sink
    pub const fn new() -> Self {
        Self
    }
}

impl ReportSink for LogSink {
    fn emit(&mut self, report: &DetectionReport) {
        let at = utc_clock();
        match report {
            DetectionReport::Deadlock { cycle, .. } => {
                warn!(at_utc = %at, cycle = %cycle, "🔴 deadlock detected\n{report}");
            }
            DetectionReport::NoDeadlock => {
                info!(at_utc = %at, "🟢 {report}");
            }
        }
    }
}

/// Forward reports over an unbounded tokio channel
///
/// A closed receiver is not an error; reports are then dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DetectionReport>,
}

impl ChannelSink {
    /// Wrap a sender
    pub fn new(tx: mpsc::UnboundedSender<DetectionReport>) -> Self {
        Self { tx }
    }

    /// Create a sink and the receiver paired with it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DetectionReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ReportSink for ChannelSink {
    fn emit(&mut self, report: &DetectionReport) {
        let _ = self.tx.send(report.clone());
    }
}

/// Current UTC time of day as `HH:MM:SS`
fn utc_clock() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    utc_time_of_day(secs)
}

/// `HH:MM:SS` of a Unix timestamp, no zone offset applied
fn utc_time_of_day(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}
