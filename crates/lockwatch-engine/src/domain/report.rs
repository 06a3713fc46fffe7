//! Detection Report - outcome of one analysis pass
//!
//! Wire shape (JSON):
//!
//! ```text
//! {"deadlock": true, "cycle": [0, 1], "request_snapshot": [[0, 1], [1, 0]]}
//! {"deadlock": false}
//! ```
//!
//! "No deadlock" only describes the snapshot's instant. It is not a safety
//! guarantee about later states.

use super::cycle::Cycle;
use super::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of analysing one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ReportWire", try_from = "ReportWire")]
pub enum DetectionReport {
    /// A wait cycle exists in the snapshot
    Deadlock {
        /// Processes on the cycle, in traversal order
        cycle: Cycle,
        /// Request matrix at the snapshot instant
        request_snapshot: Matrix,
    },
    /// No cycle in this snapshot
    NoDeadlock,
}

impl DetectionReport {
    /// Whether a cycle was found
    pub const fn is_deadlock(&self) -> bool {
        matches!(self, Self::Deadlock { .. })
    }

    /// The detected cycle, if any
    pub const fn cycle(&self) -> Option<&Cycle> {
        match self {
            Self::Deadlock { cycle, .. } => Some(cycle),
            Self::NoDeadlock => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ReportWire {
    deadlock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cycle: Option<Cycle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_snapshot: Option<Matrix>,
}

impl From<DetectionReport> for ReportWire {
    fn from(report: DetectionReport) -> Self {
        match report {
            DetectionReport::Deadlock {
                cycle,
                request_snapshot,
            } => Self {
                deadlock: true,
                cycle: Some(cycle),
                request_snapshot: Some(request_snapshot),
            },
            DetectionReport::NoDeadlock => Self {
                deadlock: false,
                cycle: None,
                request_snapshot: None,
            },
        }
    }
}

impl TryFrom<ReportWire> for DetectionReport {
    type Error = String;

    fn try_from(wire: ReportWire) -> Result<Self, Self::Error> {
        match (wire.deadlock, wire.cycle, wire.request_snapshot) {
            (true, Some(cycle), Some(request_snapshot)) => Ok(Self::Deadlock {
                cycle,
                request_snapshot,
            }),
            (true, _, _) => Err("deadlock report requires cycle and request_snapshot".into()),
            (false, _, _) => Ok(Self::NoDeadlock),
        }
    }
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadlock {
                cycle,
                request_snapshot,
            } => {
                let rule = "=".repeat(50);
                writeln!(f, "{rule}")?;
                writeln!(f, "DEADLOCK DETECTED")?;
                writeln!(f, "  Cycle: {cycle}")?;
                write!(f, "  Involved Processes: [")?;
                for (i, p) in cycle.members().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                writeln!(f, "]")?;
                writeln!(f, "  Snapshot of Request Matrix:")?;
                writeln!(f, "{request_snapshot}")?;
                write!(f, "{rule}")
            }
            Self::NoDeadlock => {
                write!(f, "no deadlock: system is currently in a safe-appearing state")
            }
        }
    }
}
