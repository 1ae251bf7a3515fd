//! Mock FHE Provider
//!
//! Implements `Encryptor` and `Decryptor` over the ciphertext vault. The
//! decrypt path enforces everything a relayer would: session window, the
//! permit signature, and the on-ledger access list.

use super::vault::CiphertextVault;
use crate::algorithms::recover_signer;
use crate::domain::{
    invariant_session_authorizes, unix_now, DecryptRequest, DecryptionSession, EncryptedInput,
    EncryptedInputBuilder, Handle, ReactionSyncError,
};
use crate::ports::outbound::{Decryptor, Encryptor};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Mock encryption/decryption provider.
pub struct MockFhe {
    vault: Arc<CiphertextVault>,
}

impl MockFhe {
    /// Provider over `vault`.
    pub fn new(vault: Arc<CiphertextVault>) -> Self {
        Self { vault }
    }

    fn verify_session(
        &self,
        request: &DecryptRequest,
        session: &DecryptionSession,
        now: u64,
    ) -> Result<(), ReactionSyncError> {
        invariant_session_authorizes(session, session.user_address, request.contract_address, now)?;

        let signer = recover_signer(&session.permit().digest(), &session.signature_bytes()?)?;
        if signer != session.user_address {
            return Err(ReactionSyncError::InvalidSession(format!(
                "permit signed by {}, not {}",
                signer, session.user_address
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Encryptor for MockFhe {
    async fn encrypt(
        &self,
        input: EncryptedInputBuilder,
    ) -> Result<EncryptedInput, ReactionSyncError> {
        if input.values.is_empty() {
            return Err(ReactionSyncError::EncryptionFailed("no values added".to_string()));
        }
        let (handles, input_proof) = self
            .vault
            .register_inputs(&input.values, input.contract, input.user);
        Ok(EncryptedInput {
            handles,
            input_proof,
        })
    }
}

#[async_trait]
impl Decryptor for MockFhe {
    async fn user_decrypt(
        &self,
        requests: &[DecryptRequest],
        session: &DecryptionSession,
    ) -> Result<HashMap<Handle, u64>, ReactionSyncError> {
        let now = unix_now();
        let mut cleartexts = HashMap::with_capacity(requests.len());

        for request in requests {
            self.verify_session(request, session, now)?;
            if !self.vault.is_allowed(request.handle, session.user_address) {
                return Err(ReactionSyncError::NotAuthorized(request.handle));
            }
            let value = self.vault.value(request.handle).ok_or_else(|| {
                ReactionSyncError::DecryptionFailed(format!("unknown handle {}", request.handle))
            })?;
            cleartexts.insert(request.handle, value);
        }

        debug!("[sr-fhe] decrypted {} handle(s)", cleartexts.len());
        Ok(cleartexts)
    }
}
