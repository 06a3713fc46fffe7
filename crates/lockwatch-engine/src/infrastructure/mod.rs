//! Infrastructure Layer - Configuration & Scenario Loading
//!
//! # Responsibilities
//! - Startup configuration (N, R, inventory, detection interval)
//! - JSON scenario files for the simulation orchestrator

pub mod config;
pub mod scenario;

// Re-exports
pub use config::{EngineConfig, EngineConfigBuilder, DEFAULT_DETECTION_INTERVAL};
pub use scenario::{ActorScript, SimulationConfig, Step, DEFAULT_RUN_DURATION};
