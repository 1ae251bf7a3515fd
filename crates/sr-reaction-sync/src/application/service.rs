//! # Reaction Sync Service
//!
//! Facade owning the shared context and the three components; implements
//! the inbound API for one wallet session across many keys.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use super::context::{SyncContext, SyncPorts};
use super::coordinator::{ActionCoordinator, ActionOutcome};
use super::decryption::{DecryptOutcome, DecryptionSessionManager};
use super::synchronizer::{HandleSynchronizer, RefreshOutcome};
use crate::config::ReactionSyncConfig;
use crate::domain::{ContractBinding, DecryptKind, Handle, ReactionKey, SyncState};
use crate::ports::{FheInstance, ReactionSyncApi};

/// Reaction Sync Service - orchestrates handle sync, decryption and actions.
pub struct ReactionSyncService {
    ctx: Arc<SyncContext>,
    synchronizer: Arc<HandleSynchronizer>,
    decryption: Arc<DecryptionSessionManager>,
    coordinator: ActionCoordinator,
}

impl ReactionSyncService {
    /// Create a new service.
    pub fn new(config: ReactionSyncConfig, ports: SyncPorts) -> Self {
        Self::from_context(Arc::new(SyncContext::new(config, ports)))
    }

    /// Create a service over an existing context.
    pub fn from_context(ctx: Arc<SyncContext>) -> Self {
        let synchronizer = Arc::new(HandleSynchronizer::new(ctx.clone()));
        let decryption = Arc::new(DecryptionSessionManager::new(
            ctx.clone(),
            synchronizer.clone(),
        ));
        let coordinator =
            ActionCoordinator::new(ctx.clone(), synchronizer.clone(), decryption.clone());
        Self {
            ctx,
            synchronizer,
            decryption,
            coordinator,
        }
    }

    /// Shared context.
    pub fn context(&self) -> &Arc<SyncContext> {
        &self.ctx
    }

    /// Install (or drop) the encryption-provider instance.
    pub fn set_fhe_instance(&self, instance: Option<FheInstance>) {
        self.ctx.set_fhe(instance);
    }

    /// Register keys so context changes refresh them.
    pub fn track(&self, keys: impl IntoIterator<Item = ReactionKey>) {
        for key in keys {
            self.ctx.track(key);
        }
    }

    /// Refresh `key`, reporting what happened.
    pub async fn refresh_key(&self, key: ReactionKey) -> RefreshOutcome {
        self.synchronizer.refresh(key).await
    }

    /// Decrypt `which` of `key`, reporting what happened.
    pub async fn decrypt_key(
        &self,
        key: ReactionKey,
        which: DecryptKind,
        handle: Option<Handle>,
    ) -> DecryptOutcome {
        self.decryption.decrypt(key, which, handle).await
    }

    /// React on `key`, reporting what happened.
    pub async fn react_key(&self, key: ReactionKey, amount: u32) -> ActionOutcome {
        self.coordinator.react(key, amount).await
    }

    /// Request total access on `key`, reporting what happened.
    pub async fn request_access_key(&self, key: ReactionKey) -> ActionOutcome {
        self.coordinator.request_total_access(key).await
    }

    /// Refresh every tracked key concurrently.
    pub async fn refresh_all(&self) -> Vec<RefreshOutcome> {
        join_all(self.ctx.keys().into_iter().map(|key| self.synchronizer.refresh(key))).await
    }
}

#[async_trait]
impl ReactionSyncApi for ReactionSyncService {
    async fn refresh(&self, key: ReactionKey) {
        self.refresh_key(key).await;
    }

    async fn decrypt_total(&self, key: ReactionKey) {
        self.decrypt_key(key, DecryptKind::Total, None).await;
    }

    async fn decrypt_mine(&self, key: ReactionKey) {
        self.decrypt_key(key, DecryptKind::Mine, None).await;
    }

    async fn decrypt_handle(&self, key: ReactionKey, which: DecryptKind, handle: Option<Handle>) {
        self.decrypt_key(key, which, handle).await;
    }

    async fn react(&self, key: ReactionKey, amount: u32) {
        self.react_key(key, amount).await;
    }

    async fn request_total_access(&self, key: ReactionKey) {
        self.request_access_key(key).await;
    }

    async fn on_context_changed(&self) {
        let binding = self.ctx.binding();
        info!(
            chain = ?binding.chain_id,
            deployed = binding.is_deployed(),
            "[sr-sync] wallet context changed"
        );
        if self.ctx.signer().is_some() && binding.is_deployed() {
            self.refresh_all().await;
        }
    }

    async fn disconnect(&self) {
        let ports = self.ctx.ports();
        let user = self.ctx.signer().map(|s| s.address());
        match ports.sessions.clear_sessions(user, ports.store.as_ref()).await {
            Ok(removed) => info!(removed, "[sr-sync] decryption sessions cleared"),
            Err(e) => warn!("[sr-sync] failed to clear sessions: {}", e),
        }
        self.ctx.reset_all();
    }

    fn state(&self, key: &ReactionKey) -> SyncState {
        self.ctx.state(key)
    }

    fn binding(&self) -> ContractBinding {
        self.ctx.binding()
    }

    fn is_deployed(&self) -> bool {
        self.ctx.binding().is_deployed()
    }

    fn can_interact(&self, key: &ReactionKey) -> bool {
        self.ctx.contract().is_some()
            && self.ctx.fhe().is_some()
            && self.ctx.signer().is_some()
            && !self.ctx.state(key).is_working()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{context, key};
    use crate::domain::NetworkId;
    use crate::ports::SessionStore;
    use std::time::Duration;

    #[tokio::test]
    async fn test_can_interact_requires_everything() {
        let (ctx, local) = context();
        let service = ReactionSyncService::from_context(ctx.clone());
        assert!(service.can_interact(&key()));

        service.set_fhe_instance(None);
        assert!(!service.can_interact(&key()));
        service.set_fhe_instance(Some(local.fhe_instance()));

        local.wallet.switch_chain(Some(NetworkId(1)));
        assert!(!service.is_deployed());
        assert!(!service.can_interact(&key()));
    }

    #[tokio::test]
    async fn test_context_change_refreshes_tracked_keys() {
        let (ctx, local) = context();
        let service = ReactionSyncService::from_context(ctx);
        let other = ReactionKey::from_slugs("cats-onchain", "heart");
        service.track([key(), other]);

        service.on_context_changed().await;
        assert!(service.state(&key()).total_handle.is_some());
        assert!(service.state(&other).total_handle.is_some());

        local.wallet.disconnect();
        local.ledger.fail_reads(true);
        service.on_context_changed().await;
        assert_eq!(service.state(&key()).last_message, "");
    }

    #[tokio::test]
    async fn test_disconnect_resets_state_and_sessions() {
        let (ctx, local) = context();
        let service = ReactionSyncService::from_context(ctx);

        service.react(key(), 1).await;
        assert_eq!(service.state(&key()).decrypted_mine, Some(1));
        assert!(!local.store.is_empty());

        service.disconnect().await;
        assert_eq!(service.state(&key()), SyncState::default());
        assert!(local.store.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_during_signature_prompt_leaves_no_session() {
        let (ctx, local) = context();
        let service = ReactionSyncService::from_context(ctx);
        local.seed_reaction(&key(), 2).await.unwrap();
        local.grant_total_access(&key()).await.unwrap();
        local.signer.set_prompt_delay(Duration::from_millis(30));

        let (outcome, _) = tokio::join!(
            service.decrypt_key(key(), DecryptKind::Total, None),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                service.disconnect().await;
            }
        );

        assert!(matches!(outcome, DecryptOutcome::Failed(_)));
        assert!(local.store.is_empty());
        assert_eq!(service.state(&key()), SyncState::default());
    }

    #[tokio::test]
    async fn test_sessions_use_configured_duration() {
        let config = ReactionSyncConfig {
            session_duration_days: 365,
            ..ReactionSyncConfig::for_testing()
        };
        let local = crate::adapters::LocalDeployment::new();
        let service = local.service(config);

        service.react(key(), 1).await;

        let stored = local.store.keys().await;
        assert_eq!(stored.len(), 1);
        let json = local.store.get_item(&stored[0]).await.unwrap();
        let session: crate::domain::DecryptionSession = serde_json::from_str(&json).unwrap();
        assert_eq!(session.valid_duration_days, 365);
    }
}
