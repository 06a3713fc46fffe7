//! # strace Post-mortem Analysis
//!
//! Input is the output of `strace -f`, one syscall per line, each prefixed
//! with the thread id:
//!
//! ```text
//! 4242  futex(0x5581c0a4e0a8, FUTEX_WAIT_PRIVATE, 2, NULL <unfinished ...>
//! 4243  futex(0x5581c0a4e0d0, FUTEX_WAIT_PRIVATE, 2, NULL <unfinished ...>
//! 4241  exit_group(0)                     = ?
//! 4241  +++ exited with 0 +++
//! ```
//!
//! Only the last syscall of each thread matters. A thread whose last call is
//! a futex wait that never returned is considered permanently blocked; two or
//! more such threads are taken as evidence of a deadlock. Process notices
//! (`+++ ... +++`, `--- ... ---`) are not syscalls and never replace a
//! thread's last action. With `-f` every thread gets its own exit notice, so
//! a worker that returned is finished but the program as a whole is not.

use crate::error::TraceError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Threads needed to call a set of blocked waits a deadlock
pub const MIN_BLOCKED_THREADS: usize = 2;

/// Conclusion drawn from one trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// No thread-tagged line in the trace
    Empty,
    /// The program terminated with status 0
    CleanExit,
    /// At least two threads ended in a wait that never returned
    Deadlocked { blocked_tids: BTreeSet<u32> },
    /// Neither a clean exit nor enough blocked threads
    NoEvidence,
}

impl Verdict {
    /// Whether the trace confirms a deadlock
    pub const fn is_deadlocked(&self) -> bool {
        matches!(self, Self::Deadlocked { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "trace is empty or unreadable"),
            Self::CleanExit => write!(f, "program completed cleanly"),
            Self::Deadlocked { blocked_tids } => {
                let tids: Vec<String> = blocked_tids.iter().map(u32::to_string).collect();
                write!(
                    f,
                    "deadlock: {} threads permanently blocked ({})",
                    blocked_tids.len(),
                    tids.join(", ")
                )
            }
            Self::NoEvidence => write!(f, "no evidence of permanent blocking"),
        }
    }
}

/// What one thread left behind in the trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ThreadRecord {
    /// Last syscall line, trimmed
    last_action: Option<String>,
    /// Set by this thread's own `+++ exited with 0 +++` notice
    exited_zero: bool,
}

impl ThreadRecord {
    /// The thread ended on its own rather than hanging until killed
    fn terminated(&self) -> bool {
        self.exited_zero || self.last_action.as_deref().is_some_and(is_exit_call)
    }

    fn blocked(&self) -> bool {
        !self.terminated() && self.last_action.as_deref().is_some_and(is_blocked)
    }
}

/// Per-thread last actions collected from one trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceAnalysis {
    lines: usize,
    threads: BTreeMap<u32, ThreadRecord>,
}

impl TraceAnalysis {
    /// Read a trace file
    ///
    /// # Errors
    /// `NotFound` when the file does not exist, `Io` for any other failure.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TraceError::from_io(path, e))?;
        let analysis =
            Self::from_reader(BufReader::new(file)).map_err(|e| TraceError::from_io(path, e))?;

        debug!(
            path = %path.display(),
            lines = analysis.lines,
            threads = analysis.threads.len(),
            "trace parsed"
        );
        Ok(analysis)
    }

    /// Read a trace from any buffered source
    ///
    /// # Errors
    /// I/O errors from the reader, including invalid UTF-8.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut analysis = Self::default();
        for line in reader.lines() {
            analysis.push_line(&line?);
        }
        Ok(analysis)
    }

    fn push_line(&mut self, line: &str) {
        self.lines += 1;

        let Some((tid, body)) = split_tid(line) else {
            return;
        };
        let record = self.threads.entry(tid).or_default();
        if body.starts_with("+++") {
            if body.contains("exited with 0 ") {
                record.exited_zero = true;
            }
            return;
        }
        if body.starts_with("---") {
            return;
        }
        record.last_action = Some(line.trim().to_string());
    }

    /// Total lines read, tagged or not
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Thread ids seen, ascending
    pub fn threads(&self) -> impl Iterator<Item = u32> + '_ {
        self.threads.keys().copied()
    }

    /// Last syscall line recorded for `tid`
    pub fn last_action(&self, tid: u32) -> Option<&str> {
        self.threads.get(&tid)?.last_action.as_deref()
    }

    /// Threads whose last syscall never completed
    ///
    /// A thread that called `exit` or `exit_group`, or that strace reports
    /// as exited with status 0, is finished and never counts as blocked.
    pub fn blocked_threads(&self) -> BTreeSet<u32> {
        self.threads
            .iter()
            .filter(|(_, record)| record.blocked())
            .map(|(tid, _)| *tid)
            .collect()
    }

    /// Draw the conclusion for this trace
    ///
    /// The program exited cleanly if some thread ended the whole group with
    /// `exit_group(0)`, or if every thread exited with status 0. A single
    /// worker returning normally says nothing about the others.
    pub fn verdict(&self) -> Verdict {
        if self.threads.is_empty() {
            return Verdict::Empty;
        }

        let group_exit = self
            .threads
            .values()
            .filter_map(|record| record.last_action.as_deref())
            .any(is_clean_exit);
        let all_exited = self.threads.values().all(|record| record.exited_zero);
        if group_exit || all_exited {
            return Verdict::CleanExit;
        }

        let blocked_tids = self.blocked_threads();
        if blocked_tids.len() >= MIN_BLOCKED_THREADS {
            Verdict::Deadlocked { blocked_tids }
        } else {
            Verdict::NoEvidence
        }
    }
}

/// `"  4242  futex(...)"` -> `(4242, "futex(...)")`
///
/// The id must be followed by whitespace; lines without one are ignored.
fn split_tid(line: &str) -> Option<(u32, &str)> {
    let trimmed = line.trim_start();
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let rest = &trimmed[digits..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let tid = trimmed[..digits].parse().ok()?;
    Some((tid, rest.trim_start()))
}

/// Name of the syscall on a tagged line, e.g. `"exit_group"`
fn syscall_name(action: &str) -> Option<&str> {
    let (_, body) = split_tid(action)?;
    let end = body.find('(')?;
    Some(&body[..end])
}

fn is_exit_call(action: &str) -> bool {
    matches!(syscall_name(action), Some("exit" | "exit_group"))
}

fn is_clean_exit(action: &str) -> bool {
    action.contains("exit_group(0)") || (action.contains("exit_group(") && action.contains(" = 0"))
}

fn is_blocked(action: &str) -> bool {
    if action.ends_with('?') {
        return true;
    }
    let Some(call) = action.find("futex(") else {
        return false;
    };
    let call = &action[call..];
    match call.find("FUTEX_WAIT") {
        Some(wait) => !has_numeric_result(&call[wait..]),
        None => false,
    }
}

/// Whether `text` carries a syscall result such as ` = 0` or ` = -1 EAGAIN`
fn has_numeric_result(text: &str) -> bool {
    text.match_indices(" =").any(|(at, _)| {
        text[at + 2..]
            .trim_start()
            .starts_with(|c: char| c.is_ascii_digit() || c == '-')
    })
}
