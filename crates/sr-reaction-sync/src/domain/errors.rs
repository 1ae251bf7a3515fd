//! # Domain Errors
//!
//! Error types for reaction synchronization.
//!
//! Every variant ends up as a status string at the workflow boundary; none of
//! them is fatal to the process.

use super::value_objects::{Handle, TxHash};
use thiserror::Error;

/// Reaction sync error types.
#[derive(Debug, Error)]
pub enum ReactionSyncError {
    /// Transient network/RPC failure while talking to the ledger.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Transaction was mined but reverted.
    #[error("Transaction {tx_hash} reverted: {reason}")]
    TransactionReverted {
        /// Reverted transaction
        tx_hash: TxHash,
        /// Revert reason reported by the ledger
        reason: String,
    },

    /// Unknown transaction hash.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TxHash),

    /// Encryption provider failed to produce a ciphertext.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Input proof does not bind the ciphertext to (contract, caller).
    #[error("Invalid input proof for {0}")]
    InvalidInputProof(Handle),

    /// Decryption provider failed.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Caller lacks on-chain permission for the handle.
    #[error("Not authorized to decrypt {0}")]
    NotAuthorized(Handle),

    /// Signature provider could not produce a session.
    #[error("Decryption signature unavailable")]
    SignatureUnavailable,

    /// The signer refused to sign.
    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    /// Session exists but is not usable for the request.
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// Activity or workflow transition rejected.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Attempted state
        to: String,
    },

    /// Wallet context was reset while the operation was in flight.
    #[error("Wallet context was reset")]
    ContextReset,

    /// Malformed hex address/handle.
    #[error("Invalid hex value: {0}")]
    InvalidHex(String),

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
