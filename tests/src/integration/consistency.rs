//! # Consistency Under Concurrency
//!
//! Read results that arrive after the wallet context moved are dropped,
//! one workflow per key runs at a time, and disconnect wipes everything.

#[cfg(test)]
mod tests {
    use sr_reaction_sync::adapters::LocalSigner;
    use sr_reaction_sync::{
        ActionOutcome, LocalDeployment, NetworkId, ReactionKey, ReactionSyncApi,
        ReactionSyncConfig, RefreshOutcome, SyncState,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn key() -> ReactionKey {
        ReactionKey::from_slugs("cats-onchain", "fire")
    }

    fn config() -> ReactionSyncConfig {
        ReactionSyncConfig::for_testing()
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let deployment = LocalDeployment::new();
        deployment.seed_reaction(&key(), 4).await.unwrap();
        let service = deployment.service(config());

        assert_eq!(service.refresh_key(key()).await, RefreshOutcome::Committed);
        let first = service.state(&key());
        assert_eq!(service.refresh_key(key()).await, RefreshOutcome::Committed);
        let second = service.state(&key());

        assert_eq!(first.total_handle, second.total_handle);
        assert_eq!(first.my_handle, second.my_handle);
        assert_eq!(first.total_handle, Some(deployment.ledger.total_of(&key())));
    }

    #[tokio::test]
    async fn test_refresh_discarded_after_chain_switch() {
        let deployment = LocalDeployment::new();
        deployment.seed_reaction(&key(), 1).await.unwrap();
        let service = deployment.service(config());
        deployment.ledger.set_read_delay(Duration::from_millis(30));

        let (outcome, _) = tokio::join!(service.refresh_key(key()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            deployment.wallet.switch_chain(Some(NetworkId(1)));
        });

        assert_eq!(outcome, RefreshOutcome::Discarded);
        let state = service.state(&key());
        assert_eq!(state.total_handle, None);
        assert_eq!(state.my_handle, None);
        assert!(!state.is_refreshing());
    }

    #[tokio::test]
    async fn test_refresh_discarded_after_signer_switch() {
        let deployment = LocalDeployment::new();
        let service = deployment.service(config());
        deployment.ledger.set_read_delay(Duration::from_millis(30));

        let (outcome, _) = tokio::join!(service.refresh_key(key()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            deployment.wallet.connect(Arc::new(LocalSigner::random()));
        });

        assert_eq!(outcome, RefreshOutcome::Discarded);
        assert_eq!(service.state(&key()).total_handle, None);

        // the next refresh under the new signer commits
        deployment.ledger.set_read_delay(Duration::ZERO);
        assert_eq!(service.refresh_key(key()).await, RefreshOutcome::Committed);
    }

    #[tokio::test]
    async fn test_failed_read_keeps_handles_and_recovers() {
        let deployment = LocalDeployment::new();
        deployment.seed_reaction(&key(), 2).await.unwrap();
        let service = deployment.service(config());
        service.refresh(key()).await;
        let before = service.state(&key()).total_handle;

        deployment.ledger.fail_reads(true);
        assert!(matches!(
            service.refresh_key(key()).await,
            RefreshOutcome::Failed(_)
        ));
        let state = service.state(&key());
        assert_eq!(state.total_handle, before);
        assert!(state.last_message.starts_with("Read failed: "));

        deployment.ledger.fail_reads(false);
        assert_eq!(service.refresh_key(key()).await, RefreshOutcome::Committed);
    }

    #[tokio::test]
    async fn test_concurrent_reacts_submit_once() {
        let deployment = LocalDeployment::new();
        let service = deployment.service(config());
        deployment.ledger.set_confirm_delay(Duration::from_millis(20));

        let (first, second) = tokio::join!(service.react_key(key(), 1), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            service.react_key(key(), 1).await
        });

        assert_eq!(first, ActionOutcome::Completed);
        assert_eq!(second, ActionOutcome::Busy);
        assert_eq!(deployment.ledger.submitted(), 1);
        assert_eq!(service.state(&key()).decrypted_mine, Some(1));
    }

    #[tokio::test]
    async fn test_access_request_blocked_while_reacting() {
        let deployment = LocalDeployment::new();
        let service = deployment.service(config());
        deployment.ledger.set_confirm_delay(Duration::from_millis(20));

        let (react, access) = tokio::join!(service.react_key(key(), 2), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(!service.can_interact(&key()));
            service.request_access_key(key()).await
        });

        assert_eq!(react, ActionOutcome::Completed);
        assert_eq!(access, ActionOutcome::Busy);
        assert!(service.can_interact(&key()));
    }

    #[tokio::test]
    async fn test_other_keys_are_independent() {
        let deployment = LocalDeployment::new();
        let service = deployment.service(config());
        let other = ReactionKey::from_slugs("cats-onchain", "lol");
        deployment.ledger.set_confirm_delay(Duration::from_millis(20));

        let (a, b) = tokio::join!(service.react_key(key(), 1), service.react_key(other, 3));

        assert_eq!(a, ActionOutcome::Completed);
        assert_eq!(b, ActionOutcome::Completed);
        assert_eq!(deployment.ledger.submitted(), 2);
        assert_eq!(service.state(&other).decrypted_mine, Some(3));
    }

    #[tokio::test]
    async fn test_disconnect_mid_react_commits_nothing() {
        let deployment = LocalDeployment::new();
        let service = deployment.service(config());
        deployment.ledger.set_confirm_delay(Duration::from_millis(30));

        let (outcome, _) = tokio::join!(service.react_key(key(), 1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            service.disconnect().await;
        });

        assert!(matches!(outcome, ActionOutcome::Failed(_)));
        assert_eq!(service.state(&key()), SyncState::default());
        assert!(service.can_interact(&key()));
        assert!(deployment.store.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_clears_sessions_and_state() {
        let deployment = LocalDeployment::new();
        let service = deployment.service(config());

        service.react(key(), 1).await;
        assert_eq!(deployment.store.len(), 1);
        assert_eq!(service.state(&key()).decrypted_mine, Some(1));

        service.disconnect().await;

        assert!(deployment.store.is_empty());
        assert_eq!(service.state(&key()), SyncState::default());

        // a fresh decrypt has to sign again
        service.refresh(key()).await;
        service.decrypt_mine(key()).await;
        assert_eq!(service.state(&key()).decrypted_mine, Some(1));
        assert_eq!(deployment.sessions.signatures(), 2);
    }

    #[tokio::test]
    async fn test_context_change_back_to_local_refreshes_tracked_keys() {
        let deployment = LocalDeployment::new();
        deployment.seed_reaction(&key(), 1).await.unwrap();
        let service = deployment.service(config());
        service.track([key()]);

        deployment.wallet.switch_chain(Some(NetworkId(1)));
        service.on_context_changed().await;
        assert!(!service.is_deployed());
        assert_eq!(service.state(&key()).total_handle, None);

        deployment.wallet.switch_chain(Some(deployment.network));
        service.on_context_changed().await;
        assert_eq!(
            service.state(&key()).total_handle,
            Some(deployment.ledger.total_of(&key()))
        );
    }
}
