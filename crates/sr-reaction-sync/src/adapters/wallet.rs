//! Local Wallet
//!
//! In-process `WalletContext` and `WalletSigner` backed by secp256k1 keys.

use crate::algorithms::{address_from_verifying_key, sign_digest};
use crate::domain::{Address, DecryptionPermit, NetworkId, ReactionSyncError};
use crate::ports::outbound::{WalletContext, WalletSigner};
use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Signer holding a private key in memory.
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
    reject: AtomicBool,
    prompt_delay: Mutex<Duration>,
}

impl LocalSigner {
    /// Signer over `key`.
    pub fn new(key: SigningKey) -> Self {
        let address = address_from_verifying_key(key.verifying_key());
        Self {
            key,
            address,
            reject: AtomicBool::new(false),
            prompt_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Signer with a fresh random key.
    pub fn random() -> Self {
        Self::new(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Signer address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Decline every signature request, like a user closing the prompt.
    pub fn reject_signing(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Time the user takes to answer a signature prompt.
    pub fn set_prompt_delay(&self, delay: Duration) {
        *self.prompt_delay.lock() = delay;
    }
}

#[async_trait]
impl WalletSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_permit(&self, permit: &DecryptionPermit) -> Result<Vec<u8>, ReactionSyncError> {
        let delay = *self.prompt_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(ReactionSyncError::SigningRejected(
                "user rejected the request".to_string(),
            ));
        }
        sign_digest(&self.key, &permit.digest())
    }
}

/// Wallet with a switchable network and signer.
#[derive(Default)]
pub struct LocalWallet {
    chain: RwLock<Option<NetworkId>>,
    signer: RwLock<Option<Arc<LocalSigner>>>,
}

impl LocalWallet {
    /// Wallet on `chain` with `signer` connected.
    pub fn new(chain: Option<NetworkId>, signer: Option<Arc<LocalSigner>>) -> Self {
        Self {
            chain: RwLock::new(chain),
            signer: RwLock::new(signer),
        }
    }

    /// Move to another network.
    pub fn switch_chain(&self, chain: Option<NetworkId>) {
        debug!("[sr-wallet] switching to chain {:?}", chain);
        *self.chain.write() = chain;
    }

    /// Connect (or replace) the signer.
    pub fn connect(&self, signer: Arc<LocalSigner>) {
        debug!("[sr-wallet] connected {}", signer.address());
        *self.signer.write() = Some(signer);
    }

    /// Drop the signer.
    pub fn disconnect(&self) {
        *self.signer.write() = None;
    }
}

impl WalletContext for LocalWallet {
    fn chain_id(&self) -> Option<NetworkId> {
        *self.chain.read()
    }

    fn signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.signer
            .read()
            .clone()
            .map(|s| s as Arc<dyn WalletSigner>)
    }
}
