//! # lockwatch Trace
//!
//! Post-mortem confirmation of real deadlocks in native programs, the
//! counterpart of the engine's live detector.
//!
//! ## Module Organization
//!
//! - `strace`: per-thread last-syscall analysis of `strace -f` output
//! - `procfs`: pid lookup and memory/thread summary from `/proc`
//! - `error`: `TraceError`

pub mod error;
pub mod procfs;
pub mod strace;

// Re-export commonly used types
pub use error::TraceError;
pub use procfs::{ProcFs, ProcessInfo};
pub use strace::{TraceAnalysis, Verdict};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
