//! # Action Coordinator
//!
//! Single-flight `react` and `request_total_access` workflows:
//! encrypt, submit, confirm, re-sync, auto-decrypt.

use super::context::SyncContext;
use super::decryption::DecryptionSessionManager;
use super::lease::WorkLease;
use super::synchronizer::HandleSynchronizer;
use crate::domain::{
    create_encrypted_input, Address, DecryptKind, Handle, ReactionKey, ReactionSyncError,
    WorkKind, WorkflowStage,
};
use crate::ports::{FheInstance, WalletSigner};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Status recorded after a successful access request.
pub const ACCESS_GRANTED_MESSAGE: &str = "Access granted. You can decrypt the total now.";

/// Status recorded after a failed reaction when details are hidden.
pub const REACT_FAILED_MESSAGE: &str = "React failed";

/// Result of one workflow call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Preconditions not met; nothing done.
    NotReady,
    /// Another action holds the working lane; nothing done.
    Busy,
    /// Transaction confirmed and follow-up sync ran.
    Completed,
    /// Workflow failed; lane released.
    Failed(String),
}

/// Runs user-triggered ledger workflows.
pub struct ActionCoordinator {
    ctx: Arc<SyncContext>,
    synchronizer: Arc<HandleSynchronizer>,
    decryption: Arc<DecryptionSessionManager>,
}

impl ActionCoordinator {
    /// Create a coordinator over `ctx`.
    pub fn new(
        ctx: Arc<SyncContext>,
        synchronizer: Arc<HandleSynchronizer>,
        decryption: Arc<DecryptionSessionManager>,
    ) -> Self {
        Self {
            ctx,
            synchronizer,
            decryption,
        }
    }

    /// Submit an encrypted `+amount` for `key`.
    pub async fn react(&self, key: ReactionKey, amount: u32) -> ActionOutcome {
        let ctx = self.ctx.as_ref();
        if amount == 0 {
            return ActionOutcome::NotReady;
        }
        let (Some(contract), Some(fhe), Some(signer)) = (ctx.contract(), ctx.fhe(), ctx.signer())
        else {
            return ActionOutcome::NotReady;
        };
        let Some(lease) = WorkLease::acquire(ctx, key, WorkKind::React) else {
            debug!("[sr-sync] react skipped, key busy");
            return ActionOutcome::Busy;
        };

        let op_id = Uuid::new_v4();
        info!(%op_id, amount, "[sr-sync] react started");
        lease.record(format!("React +{}…", amount));

        if let Err(e) = self.submit_reaction(&lease, contract, &fhe, signer, amount).await {
            warn!(%op_id, error = %e, "[sr-sync] react failed");
            let message = if ctx.config().surface_react_errors {
                format!("{}: {}", REACT_FAILED_MESSAGE, e)
            } else {
                REACT_FAILED_MESSAGE.to_string()
            };
            lease.record(message.clone());
            return ActionOutcome::Failed(message);
        }

        if let Err(e) = lease.advance(WorkflowStage::Syncing) {
            return ActionOutcome::Failed(e.to_string());
        }
        self.synchronizer.refresh(key).await;
        self.decryption
            .decrypt_in_workflow(&lease, DecryptKind::Mine)
            .await;

        info!(%op_id, "[sr-sync] react completed");
        ActionOutcome::Completed
    }

    /// Encrypt, submit, confirm, then store the caller's fresh tally handle.
    async fn submit_reaction(
        &self,
        lease: &WorkLease<'_>,
        contract: Address,
        fhe: &FheInstance,
        signer: Arc<dyn WalletSigner>,
        amount: u32,
    ) -> Result<Handle, ReactionSyncError> {
        let key = lease.key();
        let ledger = &self.ctx.ports().ledger;
        let caller = signer.address();

        let settle = self.ctx.config().react_settle_delay_ms;
        if settle > 0 {
            tokio::time::sleep(Duration::from_millis(settle)).await;
        }

        lease.advance(WorkflowStage::Encrypting)?;
        let input = create_encrypted_input(contract, caller).add32(amount);
        let encrypted = fhe.encryptor.encrypt(input).await?;
        let ciphertext = encrypted.handles.first().copied().ok_or_else(|| {
            ReactionSyncError::EncryptionFailed("provider returned no handles".to_string())
        })?;

        lease.advance(WorkflowStage::Submitting)?;
        let tx_hash = ledger
            .react(contract, caller, &key, ciphertext, &encrypted.input_proof)
            .await?;

        lease.advance(WorkflowStage::Confirming)?;
        let receipt = ledger.wait_for_receipt(tx_hash).await?.ensure_success()?;
        debug!(tx = %receipt.tx_hash, block = receipt.block_number, "[sr-sync] reaction confirmed");
        lease.record(format!("Reacted +{}", amount));

        let (_, mine) = self
            .synchronizer
            .read_handles(contract, Some(caller), &key)
            .await?;
        lease.update(|s| s.set_my_handle(Some(mine)))?;
        Ok(mine)
    }

    /// Ask for permission to decrypt the total of `key`.
    pub async fn request_total_access(&self, key: ReactionKey) -> ActionOutcome {
        let ctx = self.ctx.as_ref();
        let (Some(contract), Some(signer)) = (ctx.contract(), ctx.signer()) else {
            return ActionOutcome::NotReady;
        };
        let Some(lease) = WorkLease::acquire(ctx, key, WorkKind::RequestAccess) else {
            debug!("[sr-sync] access request skipped, key busy");
            return ActionOutcome::Busy;
        };

        let op_id = Uuid::new_v4();
        info!(%op_id, "[sr-sync] total access requested");
        lease.record("Request total access…");

        if let Err(e) = self.submit_access_request(&lease, contract, signer.address()).await {
            warn!(%op_id, error = %e, "[sr-sync] access request failed");
            let message = format!("Request failed: {}", e);
            lease.record(message.clone());
            return ActionOutcome::Failed(message);
        }
        lease.record(ACCESS_GRANTED_MESSAGE);

        if let Err(e) = lease.advance(WorkflowStage::Syncing) {
            return ActionOutcome::Failed(e.to_string());
        }
        self.synchronizer.refresh(key).await;
        self.decryption
            .decrypt_in_workflow(&lease, DecryptKind::Total)
            .await;

        info!(%op_id, "[sr-sync] access request completed");
        ActionOutcome::Completed
    }

    async fn submit_access_request(
        &self,
        lease: &WorkLease<'_>,
        contract: Address,
        caller: Address,
    ) -> Result<(), ReactionSyncError> {
        let ledger = &self.ctx.ports().ledger;

        lease.advance(WorkflowStage::Submitting)?;
        let tx_hash = ledger
            .request_total_access(contract, caller, &lease.key())
            .await?;

        lease.advance(WorkflowStage::Confirming)?;
        ledger.wait_for_receipt(tx_hash).await?.ensure_success()?;
        Ok(())
    }
}
