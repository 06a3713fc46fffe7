//! lockwatch Deadlock Detection Engine
//!
//! # Overview
//!
//! `lockwatch-engine` models a fixed population of processes contending for
//! a fixed set of reusable resource types. Processes mutate a shared
//! allocation ledger through a grant-or-queue protocol; a periodic detector
//! copies the ledger, builds a wait-for graph from the copy and reports the
//! first wait cycle it finds.
//!
//! # Trinity Architecture
//!
//! - **Domain**: ledger, protocol, snapshot, wait-for graph, cycle detector
//! - **Infrastructure**: engine configuration and simulation scenarios
//! - **Adapters**: tokio detection loop, report sinks, simulation orchestrator
//!
//! # Invariants
//!
//! ## Ledger Laws
//! - **Conservation**: `Available[j] + Σᵢ Allocation[i][j]` is constant per j
//! - **Non-negativity**: no counter ever goes below zero
//! - **Atomicity**: a rejected call leaves the ledger unchanged
//!
//! ## Detection Laws
//! - **Consistent cut**: each pass analyses one snapshot taken under the lock
//! - **Soundness**: every reported cycle edge exists in the graph
//! - **Determinism**: the same snapshot always yields the same report
//!
//! # Usage
//!
//! ```rust
//! use lockwatch_engine::{detect_once, EngineConfig, Ledger, ProcessId, ResourceId};
//!
//! let config = EngineConfig::builder()
//!     .processes(3)
//!     .inventory(vec![1, 1, 1])
//!     .build()
//!     .unwrap();
//! let ledger = Ledger::new(&config).unwrap();
//!
//! // Each process takes one resource, then wants its neighbour's
//! for (p, r) in [(0, 0), (1, 1), (2, 2), (0, 1), (1, 2), (2, 0)] {
//!     ledger.request(ProcessId(p), ResourceId(r), 1).unwrap();
//! }
//!
//! let report = detect_once(&ledger);
//! assert_eq!(report.cycle().unwrap().to_string(), "P0 -> P1 -> P2 -> P0");
//! ```

#![warn(clippy::all)]

// Trinity Architecture Layers
pub mod domain;
pub mod infrastructure;
pub mod adapters;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Re-export Primary Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// Ledger types
pub use domain::{
    ConfigError,
    Dimensions,
    Ledger,
    LedgerError,
    LedgerErrorKind,
    LedgerGuard,
    Matrix,
    ProcessId,
    RequestOutcome,
    ResourceId,
    Snapshot,
};

// Detection pipeline
pub use domain::{analyze, detect_once, Cycle, CycleDetector, DetectionReport, WaitForGraph};

// Configuration
pub use infrastructure::{ActorScript, EngineConfig, SimulationConfig, Step};

// Runtime adapters
pub use adapters::{
    replay,
    ChannelSink,
    Detector,
    DetectorHandle,
    DetectorPhase,
    LogSink,
    ReportSink,
    Simulation,
    SimulationSummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
