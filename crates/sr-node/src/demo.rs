//! Demo scenario over the built-in catalogue.

use anyhow::{bail, Result};
use sr_reaction_sync::domain::catalogue::reaction;
use sr_reaction_sync::{
    LocalDeployment, ReactionKey, ReactionSyncApi, ReactionSyncConfig, ReactionSyncService,
    POSTS, REACTIONS,
};
use sr_telemetry::{log_event, log_reaction_event};

/// Run the scenario: two users, one post, every reaction.
pub async fn run(config: ReactionSyncConfig) -> Result<()> {
    let deployment = LocalDeployment::new();
    let service = deployment.service(config.clone());
    let neighbour = deployment.client(config);

    let post = &POSTS[0];
    let keys: Vec<ReactionKey> = REACTIONS.iter().map(|r| post.key(r)).collect();
    service.track(keys.iter().copied());
    neighbour.service.track(keys.iter().copied());

    log_event!(
        info,
        "node",
        "Local deployment ready",
        contract = %deployment.contract,
        network = %deployment.network,
        deployed = service.is_deployed(),
        registry_entries = service.context().config().registry.len()
    );
    service.on_context_changed().await;

    let (Some(clap), Some(heart)) = (reaction("clap"), reaction("heart")) else {
        bail!("catalogue is missing built-in reactions");
    };

    // Someone else reacts first; their total is private to them.
    neighbour.service.react(post.key(heart), 2).await;
    report(&neighbour.service, "neighbour", post.key(heart));

    // Our own reaction, then our tally.
    service.react(post.key(clap), 1).await;
    report(&service, "primary", post.key(clap));

    // Ask to see the heart total.
    service.decrypt_total(post.key(heart)).await;
    report(&service, "primary", post.key(heart));
    service.request_total_access(post.key(heart)).await;
    report(&service, "primary", post.key(heart));

    service.refresh_all().await;
    for key in &keys {
        report(&service, "primary", *key);
    }

    service.disconnect().await;
    log_event!(info, "node", "Disconnected", sessions_left = deployment.store.len());
    Ok(())
}

fn report(service: &ReactionSyncService, user: &str, key: ReactionKey) {
    let state = service.state(&key);
    log_reaction_event!(
        info,
        "node",
        "Reaction state",
        key.post,
        key.reaction,
        user = user,
        total = ?state.decrypted_total,
        mine = ?state.decrypted_mine,
        status = %state.last_message
    );
}
