//! Domain Layer - Ledger, Protocol and Detection Pipeline
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  Ledger (shared, Mutex)         Protocol                    │
//! │  ├─ Available [R]               ├─ request(i, j, c)         │
//! │  ├─ Allocation [N×R]            └─ release(i, j, c)         │
//! │  └─ Request [N×R]                                           │
//! │                                                             │
//! │              Detection Pipeline (lock-free)                 │
//! │              Snapshot ─> WaitForGraph ─> CycleDetector      │
//! │                                  └─> DetectionReport        │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous. The periodic loop and the actors that
//! drive the protocol live in [`crate::adapters`].
//!
//! # Example
//!
//! ```rust
//! use lockwatch_engine::domain::*;
//!
//! let ledger = Ledger::with_inventory(2, vec![1, 1]).unwrap();
//! ledger.request(ProcessId(0), ResourceId(0), 1).unwrap();
//! ledger.request(ProcessId(1), ResourceId(1), 1).unwrap();
//! ledger.request(ProcessId(0), ResourceId(1), 1).unwrap();
//! ledger.request(ProcessId(1), ResourceId(0), 1).unwrap();
//!
//! let report = detect_once(&ledger);
//! assert_eq!(report.cycle().unwrap().members(), &[ProcessId(0), ProcessId(1)]);
//! ```

pub mod analysis;
pub mod cycle;
pub mod error;
pub mod ledger;
pub mod matrix;
pub mod protocol;
pub mod report;
pub mod snapshot;
pub mod types;
pub mod wait_for;

pub use analysis::{analyze, detect_once};
pub use cycle::{Cycle, CycleDetector};
pub use error::{ConfigError, LedgerError, LedgerErrorKind};
pub use ledger::{Ledger, LedgerGuard};
pub use matrix::Matrix;
pub use protocol::RequestOutcome;
pub use report::DetectionReport;
pub use snapshot::Snapshot;
pub use types::{Dimensions, ProcessId, ResourceId};
pub use wait_for::WaitForGraph;
