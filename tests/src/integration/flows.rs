//! # Reaction Flows
//!
//! Multi-user scenarios on one shared ledger:
//!
//! 1. **React then read own tally**: the reactor decrypts their tally, others cannot
//! 2. **Access grant**: a total unreadable before `request_total_access` decrypts after
//! 3. **Zero short circuit**: untouched counters decrypt to 0 without a session

#[cfg(test)]
mod tests {
    use sr_reaction_sync::{
        ActionOutcome, DecryptKind, DecryptOutcome, LocalDeployment, ReactionKey,
        ReactionSyncApi, ReactionSyncConfig, POSTS, REACTIONS,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn config() -> ReactionSyncConfig {
        ReactionSyncConfig::for_testing()
    }

    fn clap() -> ReactionKey {
        ReactionKey::from_slugs("hello-world", "clap")
    }

    fn heart() -> ReactionKey {
        ReactionKey::from_slugs("hello-world", "heart")
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_reactor_reads_own_tally_others_cannot() {
        let deployment = LocalDeployment::new();
        let alice = deployment.service(config());
        let bob = deployment.client(config());

        assert_eq!(alice.react_key(clap(), 1).await, ActionOutcome::Completed);

        let state = alice.state(&clap());
        assert_eq!(state.decrypted_mine, Some(1));
        assert_eq!(state.last_message, "mine = 1");
        let tally = state.my_handle.expect("tally handle after react");

        let outcome = bob
            .service
            .decrypt_key(clap(), DecryptKind::Mine, Some(tally))
            .await;
        assert!(matches!(outcome, DecryptOutcome::Failed(_)));

        let bob_state = bob.service.state(&clap());
        assert_eq!(bob_state.decrypted_mine, None);
        assert!(bob_state.last_message.starts_with("Decrypt mine failed: "));
    }

    #[tokio::test]
    async fn test_latest_reactor_can_decrypt_total() {
        let deployment = LocalDeployment::new();
        let alice = deployment.service(config());

        alice.react(clap(), 1).await;
        alice.decrypt_total(clap()).await;

        assert_eq!(alice.state(&clap()).decrypted_total, Some(1));
    }

    #[tokio::test]
    async fn test_access_grant_unlocks_total() {
        let deployment = LocalDeployment::new();
        let alice = deployment.service(config());
        let bob = deployment.client(config());

        assert_eq!(bob.service.react_key(heart(), 2).await, ActionOutcome::Completed);

        // Before the grant: the same handle is refused.
        alice.refresh(heart()).await;
        let total = alice.state(&heart()).total_handle.expect("total handle");
        let before = alice
            .decrypt_key(heart(), DecryptKind::Total, Some(total))
            .await;
        assert!(matches!(before, DecryptOutcome::Failed(_)));
        assert_eq!(alice.state(&heart()).decrypted_total, None);

        assert_eq!(
            alice.request_access_key(heart()).await,
            ActionOutcome::Completed
        );

        let after = alice.state(&heart());
        assert_eq!(after.total_handle, Some(total));
        assert_eq!(after.decrypted_total, Some(2));
        assert_eq!(after.last_message, "total = 2");
        assert!(!after.is_working());

        let again = alice
            .decrypt_key(heart(), DecryptKind::Total, Some(total))
            .await;
        assert_eq!(again, DecryptOutcome::Decrypted(2));
    }

    #[tokio::test]
    async fn test_new_reaction_supersedes_granted_total() {
        let deployment = LocalDeployment::new();
        let alice = deployment.service(config());
        let bob = deployment.client(config());

        bob.service.react(heart(), 2).await;
        alice.request_total_access(heart()).await;
        assert_eq!(alice.state(&heart()).decrypted_total, Some(2));

        bob.service.react(heart(), 3).await;
        alice.refresh(heart()).await;
        // new handle: cleartext of the old one no longer applies
        assert_eq!(alice.state(&heart()).decrypted_total, None);

        alice.decrypt_total(heart()).await;
        assert!(alice
            .state(&heart())
            .last_message
            .starts_with("Decrypt total failed: "));
    }

    #[tokio::test]
    async fn test_untouched_counters_decrypt_to_zero_without_session() {
        let deployment = LocalDeployment::new();
        let alice = deployment.service(config());

        for post in POSTS.iter() {
            for reaction in REACTIONS.iter() {
                let key = post.key(reaction);
                alice.decrypt_total(key).await;
                alice.refresh(key).await;
                alice.decrypt_mine(key).await;

                let state = alice.state(&key);
                assert_eq!(state.decrypted_total, Some(0));
                assert_eq!(state.decrypted_mine, Some(0));
                assert_eq!(state.last_message, "mine = 0");
            }
        }

        assert_eq!(deployment.sessions.invocations(), 0);
        assert!(deployment.store.is_empty());
    }

    #[tokio::test]
    async fn test_one_signature_serves_many_decrypts() {
        let deployment = LocalDeployment::new();
        let alice = deployment.service(config());

        for reaction in REACTIONS.iter() {
            let key = POSTS[1].key(reaction);
            assert_eq!(alice.react_key(key, 1).await, ActionOutcome::Completed);
            assert_eq!(alice.state(&key).decrypted_mine, Some(1));
        }

        assert_eq!(deployment.sessions.signatures(), 1);
        assert_eq!(deployment.sessions.invocations(), REACTIONS.len());
    }

    #[tokio::test]
    async fn test_declined_signature_is_retryable() {
        let deployment = LocalDeployment::new();
        let alice = deployment.service(config());

        deployment.signer.reject_signing(true);
        alice.react(clap(), 3).await;
        let state = alice.state(&clap());
        assert_eq!(state.decrypted_mine, None);
        assert_eq!(
            state.last_message,
            "Decrypt mine failed: Decryption signature unavailable"
        );

        deployment.signer.reject_signing(false);
        alice.decrypt_mine(clap()).await;
        assert_eq!(alice.state(&clap()).decrypted_mine, Some(3));
    }
}
