//! # Live Process Inspection
//!
//! Reads the Linux `/proc` filesystem directly. The root is configurable so
//! tests can point it at a fabricated tree.
//!
//! ```text
//! /proc/<pid>/comm          executable name
//! /proc/<pid>/status        VmSize:, VmRSS: lines
//! /proc/<pid>/task/<tid>/   one directory per thread
//! ```

use crate::error::TraceError;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default mount point
pub const PROC_ROOT: &str = "/proc";

/// Memory and thread summary of one live process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    /// Process id
    pub pid: u32,
    /// `VmSize` as printed by the kernel, e.g. `"23040 kB"`
    pub vm_size: Option<String>,
    /// `VmRSS` as printed by the kernel
    pub vm_rss: Option<String>,
    /// Thread ids, ascending
    pub threads: Vec<u32>,
}

impl fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tids: Vec<String> = self.threads.iter().map(u32::to_string).collect();
        writeln!(f, "PID: {}", self.pid)?;
        writeln!(f, "Threads: {}", tids.join(", "))?;
        writeln!(f, "VmSize: {}", self.vm_size.as_deref().unwrap_or("n/a"))?;
        write!(f, "VmRSS: {}", self.vm_rss.as_deref().unwrap_or("n/a"))
    }
}

/// Handle on a proc filesystem root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(PROC_ROOT)
    }
}

impl ProcFs {
    /// Use `root` in place of `/proc`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root this handle reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lowest pid whose `comm` equals `name` exactly
    ///
    /// Processes that vanish during the scan are skipped.
    ///
    /// # Errors
    /// `ProcessNotFound` when nothing matches, `Io` if the root is unreadable.
    pub fn find_pid_by_name(&self, name: &str) -> Result<u32, TraceError> {
        let entries = fs::read_dir(&self.root).map_err(|e| TraceError::from_io(&self.root, e))?;

        let found = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .filter(|pid| {
                fs::read_to_string(self.root.join(pid.to_string()).join("comm"))
                    .map(|comm| comm.trim_end_matches('\n') == name)
                    .unwrap_or(false)
            })
            .min();

        match found {
            Some(pid) => {
                debug!(name, pid, "process found");
                Ok(pid)
            }
            None => Err(TraceError::ProcessNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Memory usage and thread ids of `pid`
    ///
    /// # Errors
    /// `ProcessGone` if the process directory has disappeared, `Io` for
    /// other read failures.
    pub fn process_info(&self, pid: u32) -> Result<ProcessInfo, TraceError> {
        let dir = self.root.join(pid.to_string());
        let gone = |path: PathBuf, e: io::Error| match e.kind() {
            io::ErrorKind::NotFound => TraceError::ProcessGone { pid },
            _ => TraceError::from_io(path, e),
        };

        let status_path = dir.join("status");
        let status = fs::read_to_string(&status_path).map_err(|e| gone(status_path.clone(), e))?;

        let mut info = ProcessInfo {
            pid,
            vm_size: None,
            vm_rss: None,
            threads: Vec::new(),
        };
        for line in status.lines() {
            let mut fields = line.split_whitespace();
            let slot = match fields.next() {
                Some("VmSize:") => &mut info.vm_size,
                Some("VmRSS:") => &mut info.vm_rss,
                _ => continue,
            };
            *slot = Some(fields.collect::<Vec<_>>().join(" "));
        }

        let task_path = dir.join("task");
        let tasks = fs::read_dir(&task_path).map_err(|e| gone(task_path.clone(), e))?;
        info.threads = tasks
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .collect();
        info.threads.sort_unstable();

        Ok(info)
    }
}
