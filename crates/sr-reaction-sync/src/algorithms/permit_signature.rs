//! # Permit Signatures
//!
//! secp256k1 recoverable signatures over decryption-permit digests, and the
//! session key pair carried by a decryption session.

use crate::algorithms::keccak256;
use crate::domain::{Address, ReactionSyncError};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

/// Derive an address from a public key (last 20 bytes of keccak256(x || y)).
pub fn address_from_verifying_key(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    let pubkey_slice = pubkey_bytes.as_bytes();

    // Skip the 0x04 prefix
    let hash = keccak256(&pubkey_slice[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address::new(address)
}

/// Sign a 32-byte digest; returns `r || s || v` with `v` in {27, 28}.
pub fn sign_digest(key: &SigningKey, digest: &[u8; 32]) -> Result<Vec<u8>, ReactionSyncError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| ReactionSyncError::SigningRejected(e.to_string()))?;

    let mut out = Vec::with_capacity(65);
    out.extend_from_slice(&sig.to_bytes());
    out.push(recid.to_byte() + 27);
    Ok(out)
}

/// Recover the signer address of a `r || s || v` signature.
pub fn recover_signer(digest: &[u8; 32], signature: &[u8]) -> Result<Address, ReactionSyncError> {
    if signature.len() != 65 {
        return Err(ReactionSyncError::InvalidSession(format!(
            "signature must be 65 bytes, got {}",
            signature.len()
        )));
    }

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|_| ReactionSyncError::InvalidSession("malformed signature".to_string()))?;
    let v = signature[64];
    let recovery_id = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v })
        .ok_or_else(|| ReactionSyncError::InvalidSession(format!("bad recovery id {}", v)))?;

    let recovered = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| ReactionSyncError::InvalidSession("signer recovery failed".to_string()))?;

    Ok(address_from_verifying_key(&recovered))
}

/// Fresh session key pair as `(private_hex, public_hex)`.
pub fn generate_session_keypair() -> (String, String) {
    let key = SigningKey::random(&mut rand::thread_rng());
    let public = key.verifying_key().to_encoded_point(true);
    (
        format!("0x{}", hex::encode(key.to_bytes())),
        format!("0x{}", hex::encode(public.as_bytes())),
    )
}
