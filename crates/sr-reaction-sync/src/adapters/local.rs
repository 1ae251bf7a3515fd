//! Local Deployment
//!
//! Wires the in-memory adapters into a single-chain deployment with one
//! connected user, plus helpers to act as other users on the same ledger.

use super::ledger::InMemoryReactionLedger;
use super::mock_fhe::MockFhe;
use super::session_provider::CachedSessionProvider;
use super::session_store::InMemorySessionStore;
use super::vault::CiphertextVault;
use super::wallet::{LocalSigner, LocalWallet};
use crate::algorithms::{keccak256, ContractRegistry, RegistryEntry};
use crate::application::{ReactionSyncService, SyncPorts};
use crate::config::ReactionSyncConfig;
use crate::domain::{
    create_encrypted_input, Address, Handle, NetworkId, ReactionKey, ReactionSyncError,
};
use crate::ports::{Encryptor, FheInstance, ReactionLedger};
use std::sync::Arc;

/// Network id of the local deployment.
pub const LOCAL_NETWORK: NetworkId = NetworkId(31337);

/// Chain name recorded in the local registry.
pub const LOCAL_CHAIN_NAME: &str = "hardhat";

/// A SecretReactions deployment plus one connected user.
pub struct LocalDeployment {
    /// Network the contract lives on.
    pub network: NetworkId,
    /// Contract address.
    pub contract: Address,
    /// Ciphertext table shared by ledger and provider.
    pub vault: Arc<CiphertextVault>,
    /// Ledger.
    pub ledger: Arc<InMemoryReactionLedger>,
    /// Encryption/decryption provider.
    pub fhe: Arc<MockFhe>,
    /// Primary user's signer.
    pub signer: Arc<LocalSigner>,
    /// Primary user's wallet.
    pub wallet: Arc<LocalWallet>,
    /// Primary user's session provider.
    pub sessions: Arc<CachedSessionProvider>,
    /// Primary user's session store.
    pub store: Arc<InMemorySessionStore>,
}

impl Default for LocalDeployment {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalDeployment {
    /// Deploy on `LOCAL_NETWORK` with a fresh primary user.
    pub fn new() -> Self {
        let hash = keccak256(b"SecretReactions");
        let mut contract = [0u8; 20];
        contract.copy_from_slice(&hash[12..]);
        let contract = Address::new(contract);

        let vault = Arc::new(CiphertextVault::new());
        let signer = Arc::new(LocalSigner::random());
        Self {
            network: LOCAL_NETWORK,
            contract,
            ledger: Arc::new(InMemoryReactionLedger::new(contract, vault.clone())),
            fhe: Arc::new(MockFhe::new(vault.clone())),
            vault,
            wallet: Arc::new(LocalWallet::new(Some(LOCAL_NETWORK), Some(signer.clone()))),
            signer,
            sessions: Arc::new(CachedSessionProvider::new()),
            store: Arc::new(InMemorySessionStore::new()),
        }
    }

    fn entry(&self) -> RegistryEntry {
        RegistryEntry {
            address: self.contract,
            chain_id: Some(self.network.0),
            chain_name: Some(LOCAL_CHAIN_NAME.to_string()),
        }
    }

    /// Registry containing only this deployment.
    pub fn registry(&self) -> ContractRegistry {
        ContractRegistry::new().with_entry(self.network, self.entry())
    }

    /// `base` with this deployment added to its registry.
    ///
    /// Entries for other networks are kept; an entry for the local network
    /// is replaced.
    pub fn config(&self, base: ReactionSyncConfig) -> ReactionSyncConfig {
        let registry = base.registry.clone().with_entry(self.network, self.entry());
        base.with_registry(registry)
    }

    /// Ports of the primary user.
    pub fn ports(&self) -> SyncPorts {
        SyncPorts {
            ledger: self.ledger.clone(),
            wallet: self.wallet.clone(),
            sessions: self.sessions.clone(),
            store: self.store.clone(),
        }
    }

    /// Provider instance for the service.
    pub fn fhe_instance(&self) -> FheInstance {
        FheInstance::from_shared(self.fhe.clone())
    }

    /// Service for the primary user, provider instance installed.
    pub fn service(&self, config: ReactionSyncConfig) -> ReactionSyncService {
        let service = ReactionSyncService::new(self.config(config), self.ports());
        service.set_fhe_instance(Some(self.fhe_instance()));
        service
    }

    /// Another user on the same ledger, with their own wallet and sessions.
    pub fn client(&self, config: ReactionSyncConfig) -> LocalClient {
        let signer = Arc::new(LocalSigner::random());
        let wallet = Arc::new(LocalWallet::new(Some(self.network), Some(signer.clone())));
        let sessions = Arc::new(CachedSessionProvider::new());
        let store = Arc::new(InMemorySessionStore::new());
        let ports = SyncPorts {
            ledger: self.ledger.clone(),
            wallet: wallet.clone(),
            sessions: sessions.clone(),
            store: store.clone(),
        };
        let service = ReactionSyncService::new(self.config(config), ports);
        service.set_fhe_instance(Some(self.fhe_instance()));
        LocalClient {
            signer,
            wallet,
            sessions,
            store,
            service,
        }
    }

    /// Have a throwaway user react `+amount` on `key`; returns the new total.
    pub async fn seed_reaction(
        &self,
        key: &ReactionKey,
        amount: u32,
    ) -> Result<Handle, ReactionSyncError> {
        let user = LocalSigner::random().address();
        let input = create_encrypted_input(self.contract, user).add32(amount);
        let encrypted = self.fhe.encrypt(input).await?;
        let ciphertext = encrypted.handles.first().copied().ok_or_else(|| {
            ReactionSyncError::EncryptionFailed("provider returned no handles".to_string())
        })?;

        let tx = self
            .ledger
            .react(self.contract, user, key, ciphertext, &encrypted.input_proof)
            .await?;
        self.ledger.wait_for_receipt(tx).await?.ensure_success()?;
        Ok(self.ledger.total_of(key))
    }

    /// Grant the primary user access to the current total of `key`.
    pub async fn grant_total_access(&self, key: &ReactionKey) -> Result<(), ReactionSyncError> {
        let tx = self
            .ledger
            .request_total_access(self.contract, self.signer.address(), key)
            .await?;
        self.ledger.wait_for_receipt(tx).await?.ensure_success()?;
        Ok(())
    }
}

/// A user sharing a `LocalDeployment`'s ledger.
pub struct LocalClient {
    /// Signer.
    pub signer: Arc<LocalSigner>,
    /// Wallet.
    pub wallet: Arc<LocalWallet>,
    /// Session provider.
    pub sessions: Arc<CachedSessionProvider>,
    /// Session store.
    pub store: Arc<InMemorySessionStore>,
    /// Service bound to this user.
    pub service: ReactionSyncService,
}
