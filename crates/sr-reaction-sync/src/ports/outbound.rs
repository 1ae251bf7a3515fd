//! # Outbound Ports
//!
//! Capability traits for the collaborators the synchronizer talks to: the
//! ledger, the encryption/decryption provider, the authorization-signature
//! provider with its string store, and the wallet.

use crate::domain::{
    Address, DecryptRequest, DecryptionPermit, DecryptionSession, EncryptedInput,
    EncryptedInputBuilder, Handle, NetworkId, ReactionKey, ReactionSyncError, TxHash, TxReceipt,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// SecretReactions contract - outbound port.
#[async_trait]
pub trait ReactionLedger: Send + Sync {
    /// Handle of the aggregate total for `key`.
    async fn get_total(
        &self,
        contract: Address,
        key: &ReactionKey,
    ) -> Result<Handle, ReactionSyncError>;

    /// Handle of `caller`'s own tally for `key`.
    async fn get_my_tally(
        &self,
        contract: Address,
        caller: Address,
        key: &ReactionKey,
    ) -> Result<Handle, ReactionSyncError>;

    /// Submit an encrypted increment.
    async fn react(
        &self,
        contract: Address,
        caller: Address,
        key: &ReactionKey,
        ciphertext: Handle,
        input_proof: &[u8],
    ) -> Result<TxHash, ReactionSyncError>;

    /// Ask for read permission on the current total.
    async fn request_total_access(
        &self,
        contract: Address,
        caller: Address,
        key: &ReactionKey,
    ) -> Result<TxHash, ReactionSyncError>;

    /// Await confirmation of a submitted transaction.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ReactionSyncError>;
}

/// Encryption provider - outbound port.
#[async_trait]
pub trait Encryptor: Send + Sync {
    /// Encrypt the builder's values, bound to its (contract, user).
    async fn encrypt(
        &self,
        input: EncryptedInputBuilder,
    ) -> Result<EncryptedInput, ReactionSyncError>;
}

/// Decryption provider - outbound port.
#[async_trait]
pub trait Decryptor: Send + Sync {
    /// Decrypt `requests` under `session`.
    async fn user_decrypt(
        &self,
        requests: &[DecryptRequest],
        session: &DecryptionSession,
    ) -> Result<HashMap<Handle, u64>, ReactionSyncError>;
}

/// A ready encryption-provider instance.
#[derive(Clone)]
pub struct FheInstance {
    /// Encryption side.
    pub encryptor: Arc<dyn Encryptor>,
    /// Decryption side.
    pub decryptor: Arc<dyn Decryptor>,
}

impl FheInstance {
    /// Instance backed by one object implementing both sides.
    pub fn from_shared<T>(provider: Arc<T>) -> Self
    where
        T: Encryptor + Decryptor + 'static,
    {
        Self {
            encryptor: provider.clone(),
            decryptor: provider,
        }
    }
}

/// Generic string key/value storage owned by the session provider.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value.
    async fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value.
    async fn set_item(&self, key: &str, value: String);

    /// Delete a value.
    async fn remove_item(&self, key: &str);

    /// All stored keys.
    async fn keys(&self) -> Vec<String>;
}

/// Authorization-signature provider - outbound port.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Return a cached session valid for `contracts`, or sign a fresh one
    /// valid for `duration_days`.
    ///
    /// `Ok(None)` means no session could be produced (e.g. the user declined).
    async fn load_or_sign(
        &self,
        contracts: &[Address],
        duration_days: u32,
        signer: Arc<dyn WalletSigner>,
        store: &dyn SessionStore,
    ) -> Result<Option<DecryptionSession>, ReactionSyncError>;

    /// Drop cached sessions of `user`, or every cached session when `None`.
    async fn clear_sessions(
        &self,
        user: Option<Address>,
        store: &dyn SessionStore,
    ) -> Result<usize, ReactionSyncError>;
}

/// Connected signer.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Signer address.
    fn address(&self) -> Address;

    /// Sign a decryption permit; returns `r || s || v`.
    async fn sign_permit(&self, permit: &DecryptionPermit) -> Result<Vec<u8>, ReactionSyncError>;
}

/// Wallet/network context.
///
/// Values are read on every call; implementations reflect the live wallet.
pub trait WalletContext: Send + Sync {
    /// Current network.
    fn chain_id(&self) -> Option<NetworkId>;

    /// Current signer.
    fn signer(&self) -> Option<Arc<dyn WalletSigner>>;

    /// Is `chain` still the current network?
    fn same_chain(&self, chain: Option<NetworkId>) -> bool {
        self.chain_id() == chain
    }

    /// Is `signer` still the current signer?
    fn same_signer(&self, signer: Option<Address>) -> bool {
        self.signer().map(|s| s.address()) == signer
    }
}
