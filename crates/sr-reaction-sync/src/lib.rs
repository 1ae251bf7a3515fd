//! # SR Reaction Sync
//!
//! Client-side synchronization of encrypted reaction counters.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Keep a consistent local view of per-post, per-reaction counters that live
//! encrypted on a remote ledger, and mediate the workflows around them:
//! - reading the opaque handles of the aggregate total and the caller's tally
//! - submitting encrypted increments and access requests, single-flight
//! - decrypting handles off-chain under a time-bounded, signed session
//!
//! ## Consistency Rules
//!
//! | Rule | Mechanism |
//! |------|-----------|
//! | One refresh per key | `ActivityState` refresh lane |
//! | One action per key | `ActivityState` working lane |
//! | No stale commits | `run_guarded` identity snapshot check |
//! | Zero needs no key | `Handle::ZERO` short circuit |
//!
//! ## Module Structure
//!
//! ```text
//! sr-reaction-sync/
//! ├── domain/          # Handles, sessions, SyncState, state machines, errors
//! ├── algorithms/      # Content ids, contract resolver, staleness guard, permits
//! ├── ports/           # API trait (inbound) + collaborator traits (outbound)
//! ├── application/     # Synchronizer, decryption manager, coordinator, service
//! ├── adapters/        # In-memory ledger, mock FHE, session cache, local wallet
//! └── config.rs        # ReactionSyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{LocalClient, LocalDeployment, LOCAL_NETWORK};
pub use algorithms::{
    id_from_slug, keccak256, resolve_contract, run_guarded, ContractRegistry, GuardOutcome,
    RegistryEntry,
};
pub use application::{
    ActionOutcome, DecryptOutcome, ReactionSyncService, RefreshOutcome, SyncContext, SyncPorts,
};
pub use config::ReactionSyncConfig;
pub use domain::{
    ActivityState, Address, ContentId, ContractBinding, DecryptKind, DecryptionSession, Handle,
    IdentitySnapshot, NetworkId, Post, Reaction, ReactionKey, ReactionSyncError, SyncState,
    WorkKind, WorkflowStage, POSTS, REACTIONS,
};
pub use ports::{
    Decryptor, Encryptor, FheInstance, ReactionLedger, ReactionSyncApi, SessionProvider,
    SessionStore, WalletContext, WalletSigner,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
