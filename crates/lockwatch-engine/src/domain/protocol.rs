//! Request/Release Protocol
//!
//! Both operations run atomically under the ledger lock and never wait: a
//! request is either granted from the free pool or recorded as unmet demand.
//! No safety check runs before a grant; this is detection after the fact.
//!
//! A grant does not clear a Request entry left by an earlier WAITING call.
//! Stale demand stays visible to the detector as evidence of blocking.

use super::error::LedgerError;
use super::ledger::{Ledger, LedgerGuard};
use super::types::{ProcessId, ResourceId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Result of a successful `request`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestOutcome {
    /// Units moved from Available to Allocation
    Granted,
    /// Units added to the Request matrix
    Waiting,
}

impl LedgerGuard<'_> {
    fn validate(
        &self,
        process: ProcessId,
        resource: ResourceId,
        count: u32,
    ) -> Result<(usize, usize), LedgerError> {
        if !self.dims.has_process(process) {
            return Err(LedgerError::InvalidProcess {
                process,
                limit: self.dims.processes,
            });
        }
        if !self.dims.has_resource(resource) {
            return Err(LedgerError::InvalidResource {
                resource,
                limit: self.dims.resources,
            });
        }
        if count == 0 {
            return Err(LedgerError::ZeroCount { process, resource });
        }
        Ok((process.as_usize(), resource.as_usize()))
    }

    /// Ask for `count` units of `resource` on behalf of `process`
    ///
    /// # Errors
    /// `InvalidProcess`, `InvalidResource`, `ZeroCount`, `CountOverflow`;
    /// the ledger is unchanged on error.
    pub fn request(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
        count: u32,
    ) -> Result<RequestOutcome, LedgerError> {
        let (p, r) = self.validate(process, resource, count)?;
        let overflow = LedgerError::CountOverflow {
            process,
            resource,
            count,
        };

        let free = self.state.available[r];
        if free >= count {
            let held = self
                .state
                .allocation
                .get(p, r)
                .checked_add(count)
                .ok_or(overflow)?;
            self.state.available[r] = free - count;
            self.state.allocation.set(p, r, held);
            Ok(RequestOutcome::Granted)
        } else {
            let pending = self
                .state
                .request
                .get(p, r)
                .checked_add(count)
                .ok_or(overflow)?;
            self.state.request.set(p, r, pending);
            Ok(RequestOutcome::Waiting)
        }
    }

    /// Return `count` units of `resource` held by `process`
    ///
    /// # Errors
    /// `OverRelease` when `count` exceeds the process's holding, plus the
    /// argument errors of [`request`](Self::request). The ledger is unchanged
    /// on error.
    pub fn release(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
        count: u32,
    ) -> Result<(), LedgerError> {
        let (p, r) = self.validate(process, resource, count)?;

        let held = self.state.allocation.get(p, r);
        if held < count {
            return Err(LedgerError::OverRelease {
                process,
                resource,
                held,
                requested: count,
            });
        }

        let free = self.state.available[r]
            .checked_add(count)
            .ok_or(LedgerError::CountOverflow {
                process,
                resource,
                count,
            })?;
        self.state.allocation.set(p, r, held - count);
        self.state.available[r] = free;
        Ok(())
    }
}

impl Ledger {
    /// Lock, run [`LedgerGuard::request`], unlock, then log the outcome
    ///
    /// # Errors
    /// See [`LedgerGuard::request`].
    pub fn request(
        &self,
        process: ProcessId,
        resource: ResourceId,
        count: u32,
    ) -> Result<RequestOutcome, LedgerError> {
        let result = self.lock().request(process, resource, count);

        match &result {
            Ok(RequestOutcome::Granted) => {
                debug!(%process, %resource, count, "granted");
            }
            Ok(RequestOutcome::Waiting) => {
                info!(%process, %resource, count, "waiting: added to request matrix");
            }
            Err(e) => {
                warn!(%process, %resource, count, error = %e, "request rejected");
            }
        }
        result
    }

    /// Lock, run [`LedgerGuard::release`], unlock, then log the outcome
    ///
    /// # Errors
    /// See [`LedgerGuard::release`].
    pub fn release(
        &self,
        process: ProcessId,
        resource: ResourceId,
        count: u32,
    ) -> Result<(), LedgerError> {
        let result = self.lock().release(process, resource, count);

        match &result {
            Ok(()) => debug!(%process, %resource, count, "released"),
            Err(e) => warn!(%process, %resource, count, error = %e, "release rejected"),
        }
        result
    }
}
