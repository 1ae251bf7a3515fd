//! # Handle Synchronizer
//!
//! Deduplicated reads of the two handles of a key, committed only while the
//! identity they were read under is still current.

use super::context::SyncContext;
use super::lease::RefreshLease;
use crate::algorithms::{run_guarded, GuardOutcome};
use crate::domain::{Address, Handle, ReactionKey, ReactionSyncError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one `refresh` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another refresh of the key was in flight; nothing done.
    InFlight,
    /// No contract on this network; handles cleared.
    Cleared,
    /// Both handles stored.
    Committed,
    /// Identity changed during the read; results dropped.
    Discarded,
    /// Read failed; handles untouched.
    Failed(String),
}

/// Reads and stores handles.
pub struct HandleSynchronizer {
    ctx: Arc<SyncContext>,
}

impl HandleSynchronizer {
    /// Create a synchronizer over `ctx`.
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }

    /// Refresh both handles of `key`.
    pub async fn refresh(&self, key: ReactionKey) -> RefreshOutcome {
        let ctx = self.ctx.as_ref();
        let Some(lease) = RefreshLease::acquire(ctx, key) else {
            debug!("[sr-sync] refresh already in flight for {:?}", key);
            return RefreshOutcome::InFlight;
        };

        let snapshot = ctx.snapshot();
        let Some(contract) = snapshot.contract_address else {
            let _ = lease.update(|s| {
                s.set_total_handle(None);
                s.set_my_handle(None);
            });
            return RefreshOutcome::Cleared;
        };

        let outcome = run_guarded(
            &snapshot,
            self.read_handles(contract, snapshot.signer, &key),
            |snap| ctx.is_current(snap),
            |(total, mine)| {
                let _ = lease.update(|s| {
                    s.set_total_handle(Some(total));
                    s.set_my_handle(Some(mine));
                });
            },
        )
        .await;

        match outcome {
            GuardOutcome::Committed => RefreshOutcome::Committed,
            GuardOutcome::Discarded => {
                debug!("[sr-sync] identity changed during refresh, results dropped");
                RefreshOutcome::Discarded
            }
            GuardOutcome::Failed(e) => {
                warn!("[sr-sync] handle read failed: {}", e);
                let message = format!("Read failed: {}", e);
                let _ = lease.update(|s| s.record(message.clone()));
                RefreshOutcome::Failed(message)
            }
        }
    }

    /// Read `(total, mine)` concurrently, bypassing the refresh lane.
    ///
    /// Without a signer the caller's tally is `Handle::ZERO`.
    pub async fn read_handles(
        &self,
        contract: Address,
        signer: Option<Address>,
        key: &ReactionKey,
    ) -> Result<(Handle, Handle), ReactionSyncError> {
        let ledger = &self.ctx.ports().ledger;
        let total = ledger.get_total(contract, key);
        let mine = async {
            match signer {
                Some(caller) => ledger.get_my_tally(contract, caller, key).await,
                None => Ok(Handle::ZERO),
            }
        };
        tokio::try_join!(total, mine)
    }
}
