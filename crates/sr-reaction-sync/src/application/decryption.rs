//! # Decryption Session Manager
//!
//! Turns a handle into cleartext: zero short-circuit, session load-or-sign,
//! single-request user decrypt.

use super::context::SyncContext;
use super::lease::WorkLease;
use super::synchronizer::HandleSynchronizer;
use crate::domain::{
    invariant_requires_decryption, Address, DecryptKind, DecryptRequest, Handle, ReactionKey,
    ReactionSyncError, SyncState, WorkKind, WorkflowStage,
};
use crate::ports::{FheInstance, WalletSigner};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one decrypt call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// Contract, provider instance or signer missing.
    NotReady,
    /// Another action holds the working lane.
    Busy,
    /// No handle to decrypt.
    NoHandle,
    /// Cleartext stored.
    Decrypted(u64),
    /// Decryption failed; cleartext untouched.
    Failed(String),
}

/// Obtains decryption sessions and applies them to handles.
pub struct DecryptionSessionManager {
    ctx: Arc<SyncContext>,
    synchronizer: Arc<HandleSynchronizer>,
}

impl DecryptionSessionManager {
    /// Create a manager over `ctx`.
    pub fn new(ctx: Arc<SyncContext>, synchronizer: Arc<HandleSynchronizer>) -> Self {
        Self { ctx, synchronizer }
    }

    /// User-triggered decrypt. Takes the working lane of `key` only when a
    /// session is actually needed.
    ///
    /// `handle` overrides the stored handle of `which`.
    pub async fn decrypt(
        &self,
        key: ReactionKey,
        which: DecryptKind,
        handle: Option<Handle>,
    ) -> DecryptOutcome {
        if self.ready().is_none() {
            return DecryptOutcome::NotReady;
        }
        if which == DecryptKind::Total {
            self.synchronizer.refresh(key).await;
        }

        let Some(handle) = handle.or_else(|| self.ctx.state(&key).handle(which)) else {
            return DecryptOutcome::NoHandle;
        };
        if !invariant_requires_decryption(&handle) {
            self.ctx.with_state(key, |s| store_zero(s, which));
            return DecryptOutcome::Decrypted(0);
        }

        let Some(lease) = WorkLease::acquire(&self.ctx, key, WorkKind::Decrypt(which)) else {
            debug!("[sr-sync] decrypt {} skipped, key busy", which);
            return DecryptOutcome::Busy;
        };
        self.decrypt_nonzero(&lease, which, handle).await
    }

    /// Decrypt from inside a workflow that already holds the working lane.
    pub async fn decrypt_in_workflow(
        &self,
        lease: &WorkLease<'_>,
        which: DecryptKind,
    ) -> DecryptOutcome {
        if self.ready().is_none() {
            return DecryptOutcome::NotReady;
        }
        let key = lease.key();

        if which == DecryptKind::Total {
            if let Err(e) = lease.advance(WorkflowStage::Syncing) {
                return self.fail(lease, which, e);
            }
            self.synchronizer.refresh(key).await;
        }

        let handle = match lease.update(|s| s.handle(which)) {
            Ok(Some(handle)) => handle,
            Ok(None) => return DecryptOutcome::NoHandle,
            Err(e) => return self.fail(lease, which, e),
        };
        if !invariant_requires_decryption(&handle) {
            let _ = lease.update(|s| store_zero(s, which));
            return DecryptOutcome::Decrypted(0);
        }
        self.decrypt_nonzero(lease, which, handle).await
    }

    fn ready(&self) -> Option<(Address, FheInstance, Arc<dyn WalletSigner>)> {
        Some((self.ctx.contract()?, self.ctx.fhe()?, self.ctx.signer()?))
    }

    async fn decrypt_nonzero(
        &self,
        lease: &WorkLease<'_>,
        which: DecryptKind,
        handle: Handle,
    ) -> DecryptOutcome {
        let Some((contract, fhe, signer)) = self.ready() else {
            return DecryptOutcome::NotReady;
        };

        let stage = match which {
            DecryptKind::Total => WorkflowStage::DecryptingTotal,
            DecryptKind::Mine => WorkflowStage::DecryptingMine,
        };
        if let Err(e) = lease.advance(stage) {
            return self.fail(lease, which, e);
        }
        lease.record(format!("Decrypt {}…", which));

        match self.decrypt_handle(lease, contract, signer, &fhe, handle).await {
            Ok(value) => {
                info!("[sr-sync] decrypted {} for {:?}", which, lease.key());
                match lease.update(|s| {
                    s.set_decrypted(which, value);
                    s.record(format!("{} = {}", which, value));
                }) {
                    Ok(()) => DecryptOutcome::Decrypted(value),
                    Err(e) => DecryptOutcome::Failed(e.to_string()),
                }
            }
            Err(e) => self.fail(lease, which, e),
        }
    }

    /// Load or sign a session for `[contract]` and decrypt exactly `handle`.
    ///
    /// A session signed across a context reset is dropped from the store
    /// instead of being used.
    pub async fn decrypt_handle(
        &self,
        lease: &WorkLease<'_>,
        contract: Address,
        signer: Arc<dyn WalletSigner>,
        fhe: &FheInstance,
        handle: Handle,
    ) -> Result<u64, ReactionSyncError> {
        let ports = self.ctx.ports();
        let session = ports
            .sessions
            .load_or_sign(
                &[contract],
                self.ctx.config().session_duration_days,
                signer,
                ports.store.as_ref(),
            )
            .await?
            .ok_or(ReactionSyncError::SignatureUnavailable)?;

        if lease.is_stale() {
            let removed = ports
                .sessions
                .clear_sessions(Some(session.user_address), ports.store.as_ref())
                .await?;
            debug!(removed, "[sr-sync] session signed across a reset, discarded");
            return Err(ReactionSyncError::ContextReset);
        }

        let request = DecryptRequest {
            handle,
            contract_address: contract,
        };
        let cleartext = fhe.decryptor.user_decrypt(&[request], &session).await?;

        cleartext
            .get(&handle)
            .copied()
            .ok_or_else(|| ReactionSyncError::DecryptionFailed(format!("no cleartext for {}", handle)))
    }

    fn fail(&self, lease: &WorkLease<'_>, which: DecryptKind, e: ReactionSyncError) -> DecryptOutcome {
        warn!("[sr-sync] decrypt {} failed: {}", which, e);
        let message = format!("Decrypt {} failed: {}", which, e);
        lease.record(message.clone());
        DecryptOutcome::Failed(message)
    }
}

fn store_zero(state: &mut SyncState, which: DecryptKind) {
    state.set_decrypted(which, 0);
    state.record(format!("{} = 0", which));
}
