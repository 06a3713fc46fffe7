//! # Trace Analysis Errors
//!
//! A missing trace file is reported apart from other I/O failures so the
//! caller can skip it and move on to the next file.

use std::io;
use std::path::PathBuf;

/// Failure while reading a trace or inspecting `/proc`
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// Trace file does not exist
    #[error("trace file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any other read failure
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No live process has the requested name
    #[error("no running process named {name:?}")]
    ProcessNotFound { name: String },

    /// The process exited before it could be inspected
    #[error("process {pid} is no longer running")]
    ProcessGone { pid: u32 },
}

impl TraceError {
    /// Classify an I/O error raised while reading `path`
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether the target simply was not there
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::ProcessNotFound { .. } | Self::ProcessGone { .. }
        )
    }
}
