//! # Inbound Ports
//!
//! API trait defining what the reaction synchronizer can do.
//!
//! Every operation is side-effecting on the per-key state and never returns
//! an error: failures end up in `SyncState::last_message`.

use crate::domain::{ContractBinding, DecryptKind, Handle, ReactionKey, SyncState};
use async_trait::async_trait;

/// Reaction sync API - inbound port.
#[async_trait]
pub trait ReactionSyncApi: Send + Sync {
    /// Re-read both handles of `key`. No-op while a refresh is in flight.
    async fn refresh(&self, key: ReactionKey);

    /// Decrypt the aggregate total (refreshes first).
    async fn decrypt_total(&self, key: ReactionKey);

    /// Decrypt the caller's own tally.
    async fn decrypt_mine(&self, key: ReactionKey);

    /// Decrypt `handle` (or the stored handle when `None`) into `which`.
    async fn decrypt_handle(&self, key: ReactionKey, which: DecryptKind, handle: Option<Handle>);

    /// Submit an encrypted `+amount`.
    async fn react(&self, key: ReactionKey, amount: u32);

    /// Ask the ledger for permission to decrypt the total.
    async fn request_total_access(&self, key: ReactionKey);

    /// Chain or signer changed.
    async fn on_context_changed(&self);

    /// Wallet disconnected: drop cached sessions and reset every key.
    async fn disconnect(&self);

    /// Snapshot of the state of `key`.
    fn state(&self, key: &ReactionKey) -> SyncState;

    /// Binding for the current network.
    fn binding(&self) -> ContractBinding;

    /// Is the contract deployed on the current network?
    fn is_deployed(&self) -> bool;

    /// Can the user start an action on `key` right now?
    fn can_interact(&self, key: &ReactionKey) -> bool;
}
