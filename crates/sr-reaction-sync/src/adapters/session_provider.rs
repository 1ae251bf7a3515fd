//! Cached Session Provider
//!
//! `SessionProvider` that keeps signed decryption sessions in the session
//! store as JSON, keyed by user and sorted contract set.

use crate::algorithms::generate_session_keypair;
use crate::domain::{unix_now, Address, DecryptionPermit, DecryptionSession, ReactionSyncError};
use crate::ports::outbound::{SessionProvider, SessionStore, WalletSigner};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix of every key this provider writes.
pub const SESSION_KEY_PREFIX: &str = "sr.decryption-session";

/// Session provider with store-backed caching.
#[derive(Default)]
pub struct CachedSessionProvider {
    invocations: AtomicUsize,
    signatures: AtomicUsize,
}

impl CachedSessionProvider {
    /// Create a provider with empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// `load_or_sign` calls so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Permits actually signed so far.
    pub fn signatures(&self) -> usize {
        self.signatures.load(Ordering::SeqCst)
    }

    /// Store key for (user, contracts).
    pub fn storage_key(user: Address, contracts: &BTreeSet<Address>) -> String {
        let contracts: Vec<String> = contracts.iter().map(|c| c.to_string()).collect();
        format!("{}::{}::{}", SESSION_KEY_PREFIX, user, contracts.join(","))
    }

    async fn load_cached(
        &self,
        key: &str,
        user: Address,
        contracts: &[Address],
        store: &dyn SessionStore,
    ) -> Option<DecryptionSession> {
        let json = store.get_item(key).await?;
        match serde_json::from_str::<DecryptionSession>(&json) {
            Ok(session) if session.is_valid_at(unix_now()) && session.covers(user, contracts) => {
                Some(session)
            }
            Ok(_) => {
                debug!("[sr-session] cached session expired, re-signing");
                store.remove_item(key).await;
                None
            }
            Err(e) => {
                warn!("[sr-session] dropping unreadable cached session: {}", e);
                store.remove_item(key).await;
                None
            }
        }
    }
}

#[async_trait]
impl SessionProvider for CachedSessionProvider {
    async fn load_or_sign(
        &self,
        contracts: &[Address],
        duration_days: u32,
        signer: Arc<dyn WalletSigner>,
        store: &dyn SessionStore,
    ) -> Result<Option<DecryptionSession>, ReactionSyncError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        let user = signer.address();
        let contract_set: BTreeSet<Address> = contracts.iter().copied().collect();
        let key = Self::storage_key(user, &contract_set);

        if let Some(session) = self.load_cached(&key, user, contracts, store).await {
            return Ok(Some(session));
        }

        let (private_key, public_key) = generate_session_keypair();
        let permit = DecryptionPermit {
            public_key: public_key.clone(),
            contract_addresses: contract_set.iter().copied().collect(),
            start_timestamp: unix_now(),
            duration_days,
        };

        let signature = match signer.sign_permit(&permit).await {
            Ok(signature) => signature,
            Err(ReactionSyncError::SigningRejected(reason)) => {
                info!("[sr-session] permit signature declined: {}", reason);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.signatures.fetch_add(1, Ordering::SeqCst);

        let session = DecryptionSession {
            public_key,
            private_key,
            signature: format!("0x{}", hex::encode(signature)),
            authorized_contracts: contract_set,
            user_address: user,
            valid_from: permit.start_timestamp,
            valid_duration_days: permit.duration_days,
        };
        let json = serde_json::to_string(&session)
            .map_err(|e| ReactionSyncError::InvalidSession(e.to_string()))?;
        store.set_item(&key, json).await;

        debug!("[sr-session] new decryption session for {}", user);
        Ok(Some(session))
    }

    async fn clear_sessions(
        &self,
        user: Option<Address>,
        store: &dyn SessionStore,
    ) -> Result<usize, ReactionSyncError> {
        let prefix = match user {
            Some(user) => format!("{}::{}::", SESSION_KEY_PREFIX, user),
            None => format!("{}::", SESSION_KEY_PREFIX),
        };

        let mut removed = 0;
        for key in store.keys().await {
            if key.starts_with(&prefix) {
                store.remove_item(&key).await;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::session_store::InMemorySessionStore;
    use crate::adapters::wallet::LocalSigner;
    use crate::domain::SECONDS_PER_DAY;

    const CONTRACT: Address = Address::new([0xC0; 20]);
    const DAYS: u32 = 365;

    #[tokio::test]
    async fn test_session_reused_while_valid() {
        let provider = CachedSessionProvider::new();
        let store = InMemorySessionStore::new();
        let signer = Arc::new(LocalSigner::random());

        let first = provider
            .load_or_sign(&[CONTRACT], DAYS, signer.clone(), &store)
            .await
            .unwrap()
            .unwrap();
        let second = provider
            .load_or_sign(&[CONTRACT], DAYS, signer.clone(), &store)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.signatures(), 1);
        assert_eq!(provider.invocations(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_replaced() {
        let provider = CachedSessionProvider::new();
        let store = InMemorySessionStore::new();
        let signer = Arc::new(LocalSigner::random());

        let session = provider
            .load_or_sign(&[CONTRACT], 1, signer.clone(), &store)
            .await
            .unwrap()
            .unwrap();

        let mut expired = session.clone();
        expired.valid_from -= 2 * SECONDS_PER_DAY;
        let key = CachedSessionProvider::storage_key(signer.address(), &expired.authorized_contracts);
        store.set_item(&key, serde_json::to_string(&expired).unwrap()).await;

        let renewed = provider
            .load_or_sign(&[CONTRACT], 1, signer, &store)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(renewed.public_key, expired.public_key);
        assert_eq!(provider.signatures(), 2);
    }

    #[tokio::test]
    async fn test_contract_set_change_signs_new_session() {
        let provider = CachedSessionProvider::new();
        let store = InMemorySessionStore::new();
        let signer = Arc::new(LocalSigner::random());

        provider.load_or_sign(&[CONTRACT], DAYS, signer.clone(), &store).await.unwrap();
        provider
            .load_or_sign(&[CONTRACT, Address::new([0xDD; 20])], DAYS, signer, &store)
            .await
            .unwrap();
        assert_eq!(provider.signatures(), 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_declined_signature_yields_none() {
        let provider = CachedSessionProvider::new();
        let store = InMemorySessionStore::new();
        let signer = Arc::new(LocalSigner::random());
        signer.reject_signing(true);

        let session = provider.load_or_sign(&[CONTRACT], DAYS, signer, &store).await.unwrap();
        assert!(session.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clear_sessions_by_user() {
        let provider = CachedSessionProvider::new();
        let store = InMemorySessionStore::new();
        let alice = Arc::new(LocalSigner::random());
        let bob = Arc::new(LocalSigner::random());
        store.set_item("unrelated", "x".to_string()).await;

        provider.load_or_sign(&[CONTRACT], DAYS, alice.clone(), &store).await.unwrap();
        provider.load_or_sign(&[CONTRACT], DAYS, bob, &store).await.unwrap();

        assert_eq!(provider.clear_sessions(Some(alice.address()), &store).await.unwrap(), 1);
        assert_eq!(provider.clear_sessions(None, &store).await.unwrap(), 1);
        assert_eq!(store.keys().await, vec!["unrelated".to_string()]);
    }
}
