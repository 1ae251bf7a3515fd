//! # Domain Invariants
//!
//! Rules checked before and during decryption.

use super::entities::DecryptionSession;
use super::errors::ReactionSyncError;
use super::value_objects::{Address, Handle};

/// Invariant: the zero sentinel never reaches a decryption path.
///
/// Exact byte equality, no normalization.
pub fn invariant_requires_decryption(handle: &Handle) -> bool {
    !handle.is_zero()
}

/// Invariant: a session may decrypt for `contract` on behalf of `user` at `now`.
pub fn invariant_session_authorizes(
    session: &DecryptionSession,
    user: Address,
    contract: Address,
    now: u64,
) -> Result<(), ReactionSyncError> {
    if !session.is_valid_at(now) {
        return Err(ReactionSyncError::InvalidSession(format!(
            "outside validity window ({}..{})",
            session.valid_from,
            session.expires_at()
        )));
    }
    if !session.covers(user, &[contract]) {
        return Err(ReactionSyncError::InvalidSession(format!(
            "not issued for {} on {}",
            user, contract
        )));
    }
    Ok(())
}
