//! Resource Ledger - Shared Allocation State
//!
//! # Architecture
//!
//! The ledger owns the three shared structures behind a single
//! `parking_lot::Mutex`:
//!
//! ```text
//! Ledger
//!   ├─ dims:   Dimensions (N, R)         immutable
//!   ├─ totals: [u32; R]                  immutable, fixed at construction
//!   └─ state:  Mutex<LedgerState>
//!        ├─ available:  [u32; R]
//!        ├─ allocation: Matrix N×R
//!        └─ request:    Matrix N×R
//! ```
//!
//! Actors and the detector share it through `Arc<Ledger>`. The lock is only
//! ever held for one protocol call or one snapshot copy, and never across an
//! `.await`.
//!
//! `parking_lot::Mutex` is eventually fair and does not poison: a panic while
//! a guard is alive cannot leave a half-applied protocol call, because every
//! call validates before its first write.

use super::error::ConfigError;
use super::matrix::Matrix;
use super::snapshot::Snapshot;
use super::types::{Dimensions, ProcessId, ResourceId};
use crate::infrastructure::config::EngineConfig;
use parking_lot::{Mutex, MutexGuard};

/// Shared Available / Allocation / Request state plus its exclusion lock
#[derive(Debug)]
pub struct Ledger {
    dims: Dimensions,
    totals: Vec<u32>,
    state: Mutex<LedgerState>,
}

#[derive(Debug)]
pub(super) struct LedgerState {
    pub(super) available: Vec<u32>,
    pub(super) allocation: Matrix,
    pub(super) request: Matrix,
}

impl Ledger {
    /// Create a ledger from a validated configuration
    ///
    /// # Errors
    /// Any `ConfigError` reported by [`EngineConfig::validate`].
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::with_inventory(config.processes, config.initial_available.clone())
    }

    /// Create a ledger for `processes` actors and the given starting inventory
    ///
    /// The resource type count is the inventory length. Allocation and
    /// Request start all-zero.
    ///
    /// # Errors
    /// `NoProcesses` / `NoResources` on an empty dimension.
    pub fn with_inventory(processes: usize, available: Vec<u32>) -> Result<Self, ConfigError> {
        if processes == 0 {
            return Err(ConfigError::NoProcesses);
        }
        if available.is_empty() {
            return Err(ConfigError::NoResources);
        }

        let dims = Dimensions::new(processes, available.len());
        Ok(Self {
            dims,
            totals: available.clone(),
            state: Mutex::new(LedgerState {
                available,
                allocation: Matrix::zeros(processes, dims.resources),
                request: Matrix::zeros(processes, dims.resources),
            }),
        })
    }

    /// Fixed ledger shape
    #[inline]
    pub const fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Total units per resource type, constant for the ledger's lifetime
    #[inline]
    pub fn totals(&self) -> &[u32] {
        &self.totals
    }

    /// Acquire the exclusion lock
    ///
    /// The returned guard releases the lock when dropped. Keep it short-lived:
    /// one protocol call or one copy.
    pub fn lock(&self) -> LedgerGuard<'_> {
        LedgerGuard {
            dims: self.dims,
            state: self.state.lock(),
        }
    }

    /// Consistent point-in-time copy of all three structures
    ///
    /// The lock is held for the copy only.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Verify `Available[j] + Σᵢ Allocation[i][j] == Total[j]` for every j
    ///
    /// Returns the first resource type that violates conservation.
    pub fn check_conservation(&self) -> Result<(), ResourceId> {
        self.snapshot().check_conservation(&self.totals)
    }
}

/// Scoped exclusive access to the ledger state
///
/// Reads are public; writes only happen through the protocol methods
/// (`request` / `release`) so every mutation preserves conservation.
pub struct LedgerGuard<'a> {
    pub(super) dims: Dimensions,
    pub(super) state: MutexGuard<'a, LedgerState>,
}

impl LedgerGuard<'_> {
    /// Ledger shape
    #[inline]
    pub const fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Units of each resource type currently unallocated
    #[inline]
    pub fn available(&self) -> &[u32] {
        &self.state.available
    }

    /// Units held, per process and resource type
    #[inline]
    pub fn allocation(&self) -> &Matrix {
        &self.state.allocation
    }

    /// Unmet demand, per process and resource type
    #[inline]
    pub fn request_matrix(&self) -> &Matrix {
        &self.state.request
    }

    /// Units of `resource` currently held by `process`
    pub fn held(&self, process: ProcessId, resource: ResourceId) -> u32 {
        self.state.allocation.get(process.as_usize(), resource.as_usize())
    }

    /// Units of `resource` that `process` is still waiting for
    pub fn pending(&self, process: ProcessId, resource: ResourceId) -> u32 {
        self.state.request.get(process.as_usize(), resource.as_usize())
    }

    /// Copy all three structures while the lock is held
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_locked(
            self.state.available.clone(),
            self.state.allocation.clone(),
            self.state.request.clone(),
        )
    }
}
