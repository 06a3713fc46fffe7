//! Domain Error Types
//!
//! Protocol errors are returned to the immediate caller and never touch the
//! shared ledger. Configuration errors are fatal at construction time.

use super::types::{ProcessId, ResourceId};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Protocol Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Rejected `request` / `release` call
///
/// Every variant leaves the ledger exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Process index outside `0..N`
    #[error("Invalid process ID: {process} (ledger tracks {limit} processes)")]
    InvalidProcess { process: ProcessId, limit: usize },

    /// Resource index outside `0..R`
    #[error("Invalid resource ID: {resource} (ledger tracks {limit} resource types)")]
    InvalidResource { resource: ResourceId, limit: usize },

    /// Unit count of zero
    #[error("Invalid count for {process}/{resource}: unit count must be positive")]
    ZeroCount {
        process: ProcessId,
        resource: ResourceId,
    },

    /// The counter would leave the representable range
    #[error("Count overflow for {process}/{resource}: adding {count} units exceeds counter range")]
    CountOverflow {
        process: ProcessId,
        resource: ResourceId,
        count: u32,
    },

    /// Release of more units than the process holds
    #[error("Over-release: {process} holds {held} of {resource} but tried to release {requested}")]
    OverRelease {
        process: ProcessId,
        resource: ResourceId,
        held: u32,
        requested: u32,
    },
}

/// Coarse error taxonomy for callers that only branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorKind {
    /// Malformed call; fix the arguments and retry
    InvalidArgument,
    /// Caller bookkeeping bug: released more than held
    OverRelease,
}

impl LedgerError {
    /// Classify into the two-kind taxonomy
    pub const fn kind(&self) -> LedgerErrorKind {
        match self {
            Self::InvalidProcess { .. }
            | Self::InvalidResource { .. }
            | Self::ZeroCount { .. }
            | Self::CountOverflow { .. } => LedgerErrorKind::InvalidArgument,
            Self::OverRelease { .. } => LedgerErrorKind::OverRelease,
        }
    }

    /// Whether this is an argument-validation failure
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self.kind(), LedgerErrorKind::InvalidArgument)
    }

    /// Whether this is an over-release
    pub const fn is_over_release(&self) -> bool {
        matches!(self.kind(), LedgerErrorKind::OverRelease)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Configuration Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Invalid startup configuration or scenario
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Process count must be positive")]
    NoProcesses,

    #[error("Resource type count must be positive")]
    NoResources,

    #[error("Initial inventory has {actual} entries, expected {expected}")]
    InventoryLength { expected: usize, actual: usize },

    #[error("Detection interval must be non-zero")]
    ZeroInterval,

    #[error("Simulation duration must be non-zero")]
    ZeroDuration,

    #[error("Matrix rows have unequal lengths")]
    RaggedMatrix,

    /// Snapshot parts disagree on N or R
    #[error("Dimension mismatch: {what} is {actual_rows}x{actual_cols}, expected {expected_rows}x{expected_cols}")]
    DimensionMismatch {
        what: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("Scenario defines {scripts} actor scripts but only {processes} processes")]
    TooManyScripts { scripts: usize, processes: usize },

    #[error("Scenario step {step} of {process} is invalid: {reason}")]
    InvalidStep {
        process: ProcessId,
        step: usize,
        reason: String,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(String),

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let invalid = LedgerError::ZeroCount {
            process: ProcessId(0),
            resource: ResourceId(0),
        };
        assert!(invalid.is_invalid_argument());
        assert!(!invalid.is_over_release());

        let over = LedgerError::OverRelease {
            process: ProcessId(0),
            resource: ResourceId(0),
            held: 2,
            requested: 3,
        };
        assert_eq!(over.kind(), LedgerErrorKind::OverRelease);
        assert!(over.is_over_release());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::OverRelease {
            process: ProcessId(0),
            resource: ResourceId(1),
            held: 2,
            requested: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("P0"));
        assert!(msg.contains("R1"));
        assert!(msg.contains('2'));
        assert!(msg.contains('3'));
    }
}
