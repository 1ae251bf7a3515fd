//! # Lanes
//!
//! RAII guards over the two per-key lanes. Acquiring runs the activity state
//! machine forward; dropping runs it back, on every exit path.

use super::context::SyncContext;
use crate::domain::{ReactionKey, ReactionSyncError, SyncState, WorkKind, WorkflowStage};
use tracing::warn;

/// Holds the refresh lane of one key.
pub struct RefreshLease<'a> {
    ctx: &'a SyncContext,
    key: ReactionKey,
    epoch: u64,
}

impl<'a> RefreshLease<'a> {
    /// Enter the refresh lane; `None` if a refresh is already in flight.
    pub fn acquire(ctx: &'a SyncContext, key: ReactionKey) -> Option<Self> {
        let epoch = ctx.with_state(key, |s| s.begin_refresh().map(|_| ctx.epoch())).ok()?;
        Some(Self { ctx, key, epoch })
    }

    /// Apply `f` unless the context was reset meanwhile.
    pub fn update<R>(&self, f: impl FnOnce(&mut SyncState) -> R) -> Result<R, ReactionSyncError> {
        self.ctx
            .update(self.key, self.epoch, f)
            .ok_or(ReactionSyncError::ContextReset)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if let Ok(Err(e)) = self.update(|s| s.end_refresh()) {
            warn!("[sr-sync] refresh lane release failed: {}", e);
        }
    }
}

/// Holds the working lane of one key.
pub struct WorkLease<'a> {
    ctx: &'a SyncContext,
    key: ReactionKey,
    epoch: u64,
}

impl<'a> WorkLease<'a> {
    /// Enter the working lane; `None` if another action is working.
    pub fn acquire(ctx: &'a SyncContext, key: ReactionKey, kind: WorkKind) -> Option<Self> {
        let epoch = ctx
            .with_state(key, |s| s.begin_work(kind).map(|_| ctx.epoch()))
            .ok()?;
        Some(Self { ctx, key, epoch })
    }

    /// Key this lease belongs to.
    pub fn key(&self) -> ReactionKey {
        self.key
    }

    /// Apply `f` unless the context was reset meanwhile.
    pub fn update<R>(&self, f: impl FnOnce(&mut SyncState) -> R) -> Result<R, ReactionSyncError> {
        self.ctx
            .update(self.key, self.epoch, f)
            .ok_or(ReactionSyncError::ContextReset)
    }

    /// Move the workflow to `stage`.
    pub fn advance(&self, stage: WorkflowStage) -> Result<(), ReactionSyncError> {
        self.update(|s| s.advance(stage))?
    }

    /// Record a status message.
    pub fn record(&self, message: impl Into<String>) {
        let _ = self.update(|s| s.record(message));
    }

    /// Has the context been reset since this lease was taken?
    pub fn is_stale(&self) -> bool {
        self.ctx.epoch() != self.epoch
    }
}

impl Drop for WorkLease<'_> {
    fn drop(&mut self) {
        if let Ok(Err(e)) = self.update(|s| s.end_work()) {
            warn!("[sr-sync] working lane release failed: {}", e);
        }
    }
}
