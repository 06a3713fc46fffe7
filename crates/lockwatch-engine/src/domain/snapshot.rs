//! Ledger Snapshot - privately owned copy for one detection pass

use super::error::ConfigError;
use super::matrix::Matrix;
use super::types::{Dimensions, ResourceId};
use serde::{Deserialize, Serialize};

/// Value copy of Available / Allocation / Request taken under the lock
///
/// A snapshot is a consistent cut: it never mixes the effects of part of
/// one protocol call with part of another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotWire")]
pub struct Snapshot {
    available: Vec<u32>,
    allocation: Matrix,
    request: Matrix,
}

/// Unchecked input shape; becomes a `Snapshot` only through `from_parts`
#[derive(Deserialize)]
struct SnapshotWire {
    available: Vec<u32>,
    allocation: Matrix,
    request: Matrix,
}

impl TryFrom<SnapshotWire> for Snapshot {
    type Error = ConfigError;

    fn try_from(wire: SnapshotWire) -> Result<Self, Self::Error> {
        Self::from_parts(wire.available, wire.allocation, wire.request)
    }
}

impl Snapshot {
    pub(super) fn from_locked(available: Vec<u32>, allocation: Matrix, request: Matrix) -> Self {
        Self {
            available,
            allocation,
            request,
        }
    }

    /// Assemble a snapshot from explicit parts
    ///
    /// # Errors
    /// `NoProcesses` / `NoResources` on empty input, `DimensionMismatch` when
    /// the matrices disagree with each other or with the Available length.
    pub fn from_parts(
        available: Vec<u32>,
        allocation: Matrix,
        request: Matrix,
    ) -> Result<Self, ConfigError> {
        let expected = Dimensions::new(allocation.rows(), available.len());
        if expected.processes == 0 {
            return Err(ConfigError::NoProcesses);
        }
        if expected.resources == 0 {
            return Err(ConfigError::NoResources);
        }

        for (what, matrix) in [("allocation", &allocation), ("request", &request)] {
            if matrix.rows() != expected.processes || matrix.cols() != expected.resources {
                return Err(ConfigError::DimensionMismatch {
                    what,
                    expected_rows: expected.processes,
                    expected_cols: expected.resources,
                    actual_rows: matrix.rows(),
                    actual_cols: matrix.cols(),
                });
            }
        }

        Ok(Self {
            available,
            allocation,
            request,
        })
    }

    /// Shape of the copied ledger
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.allocation.rows(), self.available.len())
    }

    /// Copied Available vector
    pub fn available(&self) -> &[u32] {
        &self.available
    }

    /// Copied Allocation matrix
    pub fn allocation(&self) -> &Matrix {
        &self.allocation
    }

    /// Copied Request matrix
    pub fn request(&self) -> &Matrix {
        &self.request
    }

    /// Take ownership of the Request matrix (attached to deadlock reports)
    pub fn into_request(self) -> Matrix {
        self.request
    }

    /// Check the conservation law against fixed totals
    ///
    /// Returns the first resource type whose free plus held units differ
    /// from its total.
    pub fn check_conservation(&self, totals: &[u32]) -> Result<(), ResourceId> {
        for (col, &total) in totals.iter().enumerate() {
            let free = self.available.get(col).copied().map_or(0, u64::from);
            if free + self.allocation.column_sum(col) != u64::from(total) {
                return Err(ResourceId(col));
            }
        }
        Ok(())
    }
}
