//! # Algorithms Module
//!
//! Pure functions: content ids, contract resolution, the staleness guard and
//! permit signatures.

pub mod content_id;
pub mod contract_resolver;
pub mod permit_signature;
pub mod staleness_guard;

pub use content_id::{id_from_slug, keccak256};
pub use contract_resolver::{resolve_contract, ContractRegistry, RegistryEntry};
pub use permit_signature::{
    address_from_verifying_key, generate_session_keypair, recover_signer, sign_digest,
};
pub use staleness_guard::{run_guarded, GuardOutcome};
