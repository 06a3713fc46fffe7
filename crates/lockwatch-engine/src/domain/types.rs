//! Core Types for the Allocation Ledger

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process identifier (index `0..N` into the ledger rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub usize);

impl ProcessId {
    /// Create a new process identifier
    #[inline(always)]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying usize value
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Resource type identifier (index `0..R` into the ledger columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub usize);

impl ResourceId {
    /// Create a new resource identifier
    #[inline(always)]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying usize value
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Fixed shape of a ledger: `N` processes by `R` resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of processes (N)
    pub processes: usize,
    /// Number of resource types (R)
    pub resources: usize,
}

impl Dimensions {
    /// Create a new shape
    pub const fn new(processes: usize, resources: usize) -> Self {
        Self { processes, resources }
    }

    /// Whether `process` is a row of this shape
    #[inline]
    pub const fn has_process(&self, process: ProcessId) -> bool {
        process.0 < self.processes
    }

    /// Whether `resource` is a column of this shape
    #[inline]
    pub const fn has_resource(&self, resource: ResourceId) -> bool {
        resource.0 < self.resources
    }

    /// Iterate all process ids in ascending order
    pub fn process_ids(&self) -> impl Iterator<Item = ProcessId> {
        (0..self.processes).map(ProcessId)
    }

    /// Iterate all resource ids in ascending order
    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> {
        (0..self.resources).map(ResourceId)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} processes x {} resource types", self.processes, self.resources)
    }
}
