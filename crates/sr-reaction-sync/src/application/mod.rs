//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod context;
pub mod coordinator;
pub mod decryption;
pub mod lease;
pub mod service;
pub mod synchronizer;

pub use context::{SyncContext, SyncPorts};
pub use coordinator::{ActionCoordinator, ActionOutcome, ACCESS_GRANTED_MESSAGE, REACT_FAILED_MESSAGE};
pub use decryption::{DecryptOutcome, DecryptionSessionManager};
pub use lease::{RefreshLease, WorkLease};
pub use service::ReactionSyncService;
pub use synchronizer::{HandleSynchronizer, RefreshOutcome};
