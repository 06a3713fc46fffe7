//! Adapters Layer - Ports & Adapters Pattern
//!
//! Connects the synchronous domain to the tokio runtime and to the outside
//! world.
//!
//! # Hexagonal Architecture
//! - Inbound: scripted actors drive the protocol (`simulation`)
//! - Periodic: the detection loop samples the ledger (`detector`)
//! - Outbound: reports leave through a [`ReportSink`] (`sink`)

pub mod detector;
pub mod simulation;
pub mod sink;

// Re-exports
pub use detector::{Detector, DetectorHandle, DetectorPhase};
pub use simulation::{replay, ActorFailure, Replay, Simulation, SimulationSummary};
pub use sink::{ChannelSink, LogSink, ReportSink, Tee};
