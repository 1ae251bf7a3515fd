//! Ciphertext Vault
//!
//! Shared backing table for the in-memory ledger and the mock encryption
//! provider: handle values, the access list, and pending input bindings.

use crate::algorithms::keccak256;
use crate::domain::{Address, Handle, ReactionSyncError};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InputBinding {
    contract: Address,
    user: Address,
}

#[derive(Default)]
struct VaultState {
    values: HashMap<Handle, u64>,
    acl: HashMap<Handle, HashSet<Address>>,
    inputs: HashMap<Handle, (InputBinding, Vec<u8>)>,
    minted: u64,
}

impl VaultState {
    fn next_handle(&mut self) -> Handle {
        self.minted += 1;
        let mut seed = b"sr.vault.handle".to_vec();
        seed.extend_from_slice(&self.minted.to_be_bytes());
        Handle::new(keccak256(&seed))
    }
}

/// Plaintext store behind opaque handles.
#[derive(Default)]
pub struct CiphertextVault {
    state: Mutex<VaultState>,
}

impl CiphertextVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under a fresh handle.
    pub fn mint(&self, value: u64) -> Handle {
        let mut state = self.state.lock();
        let handle = state.next_handle();
        state.values.insert(handle, value);
        handle
    }

    /// Store fresh input ciphertexts bound to (contract, user); returns the
    /// handles and the proof covering them.
    pub fn register_inputs(
        &self,
        values: &[u32],
        contract: Address,
        user: Address,
    ) -> (Vec<Handle>, Vec<u8>) {
        let mut state = self.state.lock();
        let handles: Vec<Handle> = values
            .iter()
            .map(|v| {
                let handle = state.next_handle();
                state.values.insert(handle, u64::from(*v));
                handle
            })
            .collect();

        let proof = input_proof(&handles, contract, user);
        let binding = InputBinding { contract, user };
        for handle in &handles {
            state.inputs.insert(*handle, (binding, proof.clone()));
        }
        (handles, proof)
    }

    /// Consume an input ciphertext; the proof must bind it to (contract, user).
    pub fn consume_input(
        &self,
        handle: Handle,
        proof: &[u8],
        contract: Address,
        user: Address,
    ) -> Result<u32, ReactionSyncError> {
        let mut state = self.state.lock();
        match state.inputs.get(&handle) {
            Some((binding, expected))
                if *binding == (InputBinding { contract, user }) && expected == proof => {}
            _ => return Err(ReactionSyncError::InvalidInputProof(handle)),
        }
        state.inputs.remove(&handle);
        state
            .values
            .get(&handle)
            .and_then(|v| u32::try_from(*v).ok())
            .ok_or(ReactionSyncError::InvalidInputProof(handle))
    }

    /// New handle holding `value(base) + delta` as 32-bit counter arithmetic,
    /// wrapping modulo 2^32. The zero handle counts as 0.
    pub fn add(&self, base: Handle, delta: u32) -> Result<Handle, ReactionSyncError> {
        let current = if base.is_zero() {
            0
        } else {
            self.value(base).ok_or_else(|| {
                ReactionSyncError::DecryptionFailed(format!("unknown handle {}", base))
            })?
        };
        // euint32 addition wraps
        let sum = (current as u32).wrapping_add(delta);
        Ok(self.mint(u64::from(sum)))
    }

    /// Grant `user` decryption rights on `handle`.
    pub fn allow(&self, handle: Handle, user: Address) {
        self.state.lock().acl.entry(handle).or_default().insert(user);
    }

    /// May `user` decrypt `handle`?
    pub fn is_allowed(&self, handle: Handle, user: Address) -> bool {
        self.state
            .lock()
            .acl
            .get(&handle)
            .is_some_and(|users| users.contains(&user))
    }

    /// Plaintext behind `handle`.
    pub fn value(&self, handle: Handle) -> Option<u64> {
        self.state.lock().values.get(&handle).copied()
    }
}

fn input_proof(handles: &[Handle], contract: Address, user: Address) -> Vec<u8> {
    let mut data = b"sr.vault.input".to_vec();
    for handle in handles {
        data.extend_from_slice(handle.as_bytes());
    }
    data.extend_from_slice(contract.as_bytes());
    data.extend_from_slice(user.as_bytes());
    keccak256(&data).to_vec()
}
