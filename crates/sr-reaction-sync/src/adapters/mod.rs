//! # Adapters Module
//!
//! In-memory implementations of the outbound ports.

pub mod ledger;
pub mod local;
pub mod mock_fhe;
pub mod session_provider;
pub mod session_store;
pub mod vault;
pub mod wallet;

pub use ledger::InMemoryReactionLedger;
pub use local::{LocalClient, LocalDeployment, LOCAL_CHAIN_NAME, LOCAL_NETWORK};
pub use mock_fhe::MockFhe;
pub use session_provider::{CachedSessionProvider, SESSION_KEY_PREFIX};
pub use session_store::InMemorySessionStore;
pub use vault::CiphertextVault;
pub use wallet::{LocalSigner, LocalWallet};
