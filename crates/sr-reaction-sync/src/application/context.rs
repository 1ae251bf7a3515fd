//! # Sync Context
//!
//! Shared state of one wallet session: ports, configuration, the encryption
//! provider instance and the per-key state table.

use crate::algorithms::resolve_contract;
use crate::config::ReactionSyncConfig;
use crate::domain::{Address, ContractBinding, IdentitySnapshot, ReactionKey, SyncState};
use crate::ports::{FheInstance, ReactionLedger, SessionProvider, SessionStore, WalletContext, WalletSigner};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Outbound collaborators.
#[derive(Clone)]
pub struct SyncPorts {
    /// Ledger contract access.
    pub ledger: Arc<dyn ReactionLedger>,
    /// Wallet/network context.
    pub wallet: Arc<dyn WalletContext>,
    /// Authorization-signature provider.
    pub sessions: Arc<dyn SessionProvider>,
    /// Storage handed to the signature provider.
    pub store: Arc<dyn SessionStore>,
}

/// Shared context of the synchronizer components.
///
/// The state table lock is never held across an `.await`.
pub struct SyncContext {
    config: ReactionSyncConfig,
    ports: SyncPorts,
    fhe: RwLock<Option<FheInstance>>,
    states: Mutex<HashMap<ReactionKey, SyncState>>,
    /// Bumped on every reset; in-flight work from an older epoch never commits.
    epoch: AtomicU64,
}

impl SyncContext {
    /// Create a context with no encryption-provider instance yet.
    pub fn new(config: ReactionSyncConfig, ports: SyncPorts) -> Self {
        Self {
            config,
            ports,
            fhe: RwLock::new(None),
            states: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Configuration.
    pub fn config(&self) -> &ReactionSyncConfig {
        &self.config
    }

    /// Outbound ports.
    pub fn ports(&self) -> &SyncPorts {
        &self.ports
    }

    /// Binding for the wallet's current network.
    pub fn binding(&self) -> ContractBinding {
        resolve_contract(&self.config.registry, self.ports.wallet.chain_id())
    }

    /// Deployed contract address on the current network.
    pub fn contract(&self) -> Option<Address> {
        self.binding().address.filter(|a| !a.is_zero())
    }

    /// Current signer.
    pub fn signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.ports.wallet.signer()
    }

    /// Encryption-provider instance, once ready.
    pub fn fhe(&self) -> Option<FheInstance> {
        self.fhe.read().clone()
    }

    /// Install or drop the encryption-provider instance.
    pub fn set_fhe(&self, instance: Option<FheInstance>) {
        *self.fhe.write() = instance;
    }

    /// Capture (contract, network, signer) now.
    pub fn snapshot(&self) -> IdentitySnapshot {
        IdentitySnapshot::new(
            self.contract(),
            self.ports.wallet.chain_id(),
            self.signer().map(|s| s.address()),
        )
    }

    /// Does `snapshot` still describe the current identity?
    pub fn is_current(&self, snapshot: &IdentitySnapshot) -> bool {
        self.contract() == snapshot.contract_address
            && self.ports.wallet.same_chain(snapshot.network_id)
            && self.ports.wallet.same_signer(snapshot.signer)
    }

    /// Current reset epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Mutate the state of `key`, creating it if needed.
    pub fn with_state<R>(&self, key: ReactionKey, f: impl FnOnce(&mut SyncState) -> R) -> R {
        let mut states = self.states.lock();
        f(states.entry(key).or_default())
    }

    /// Mutate the state of `key` only if no reset happened since `epoch`.
    pub fn update<R>(
        &self,
        key: ReactionKey,
        epoch: u64,
        f: impl FnOnce(&mut SyncState) -> R,
    ) -> Option<R> {
        let mut states = self.states.lock();
        if self.epoch() != epoch {
            return None;
        }
        Some(f(states.entry(key).or_default()))
    }

    /// Copy of the state of `key`.
    pub fn state(&self, key: &ReactionKey) -> SyncState {
        self.states.lock().get(key).cloned().unwrap_or_default()
    }

    /// Register `key` so context changes reach it.
    pub fn track(&self, key: ReactionKey) {
        self.states.lock().entry(key).or_default();
    }

    /// Every key seen so far.
    pub fn keys(&self) -> Vec<ReactionKey> {
        let mut keys: Vec<_> = self.states.lock().keys().copied().collect();
        keys.sort();
        keys
    }

    /// Reset every key to its initial state and start a new epoch.
    pub fn reset_all(&self) {
        let mut states = self.states.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        for state in states.values_mut() {
            *state = SyncState::default();
        }
    }
}
