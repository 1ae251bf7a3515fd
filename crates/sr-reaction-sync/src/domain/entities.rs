//! # Domain Entities
//!
//! Contract bindings, identity snapshots, decryption sessions and the per-key
//! view model.

use super::errors::ReactionSyncError;
use super::value_objects::{
    ActivityState, Address, ContentId, DecryptKind, Handle, NetworkId, TxHash, WorkKind,
    WorkflowStage,
};
use crate::algorithms::keccak256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Seconds per day, used for session validity windows.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Description of the ledger contract's interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    /// Contract name.
    pub contract_name: &'static str,
    /// Exposed function names.
    pub functions: &'static [&'static str],
}

/// The SecretReactions contract interface.
pub const SECRET_REACTIONS_INTERFACE: InterfaceDescriptor = InterfaceDescriptor {
    contract_name: "SecretReactions",
    functions: &[
        "getReactionTotal",
        "getMyReaction",
        "protocolId",
        "react",
        "unlockView",
    ],
};

/// Contract binding for the current network.
///
/// Value object: recomputed on network change, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractBinding {
    /// Deployed address, if any.
    pub address: Option<Address>,
    /// Network the binding was resolved for.
    pub chain_id: Option<NetworkId>,
    /// Human-readable network name from the registry.
    pub chain_name: Option<String>,
    /// Contract interface.
    pub interface: InterfaceDescriptor,
}

impl ContractBinding {
    /// Binding with no network at all.
    pub fn unresolved() -> Self {
        Self {
            address: None,
            chain_id: None,
            chain_name: None,
            interface: SECRET_REACTIONS_INTERFACE,
        }
    }

    /// Binding for a network the contract is not deployed on.
    pub fn not_deployed(chain_id: NetworkId) -> Self {
        Self {
            chain_id: Some(chain_id),
            ..Self::unresolved()
        }
    }

    /// Is there a usable contract on this network?
    pub fn is_deployed(&self) -> bool {
        self.address.is_some_and(|a| !a.is_zero())
    }
}

/// (network, signer, contract) captured when an async read starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentitySnapshot {
    /// Contract address at start.
    pub contract_address: Option<Address>,
    /// Network id at start.
    pub network_id: Option<NetworkId>,
    /// Signer identity at start.
    pub signer: Option<Address>,
}

impl IdentitySnapshot {
    /// Capture a snapshot.
    pub fn new(
        contract_address: Option<Address>,
        network_id: Option<NetworkId>,
        signer: Option<Address>,
    ) -> Self {
        Self {
            contract_address,
            network_id,
            signer,
        }
    }
}

/// Logical key of one encrypted counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReactionKey {
    /// Post id.
    pub post: ContentId,
    /// Reaction id.
    pub reaction: ContentId,
}

impl ReactionKey {
    /// Create a key from ids.
    pub fn new(post: ContentId, reaction: ContentId) -> Self {
        Self { post, reaction }
    }

    /// Create a key from human-readable slugs.
    pub fn from_slugs(post: &str, reaction: &str) -> Self {
        Self::new(ContentId::from_slug(post), ContentId::from_slug(reaction))
    }
}

/// The message a signer approves to authorize off-chain decryption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionPermit {
    /// Hex-encoded session public key.
    pub public_key: String,
    /// Contracts the session may decrypt for.
    pub contract_addresses: Vec<Address>,
    /// Start of validity (unix seconds).
    pub start_timestamp: u64,
    /// Validity length in days.
    pub duration_days: u32,
}

impl DecryptionPermit {
    /// Digest the signer signs over.
    pub fn digest(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(64 + self.contract_addresses.len() * 20);
        data.extend_from_slice(b"SecretReactions.DecryptionPermit");
        data.extend_from_slice(self.public_key.as_bytes());
        for contract in &self.contract_addresses {
            data.extend_from_slice(contract.as_bytes());
        }
        data.extend_from_slice(&self.start_timestamp.to_be_bytes());
        data.extend_from_slice(&self.duration_days.to_be_bytes());
        keccak256(&data)
    }
}

/// Time-bounded, signature-authorized decryption key material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionSession {
    /// Hex-encoded session public key.
    pub public_key: String,
    /// Hex-encoded session private key.
    pub private_key: String,
    /// Hex-encoded permit signature.
    pub signature: String,
    /// Contracts this session may decrypt for.
    pub authorized_contracts: BTreeSet<Address>,
    /// User that signed the permit.
    pub user_address: Address,
    /// Start of validity (unix seconds).
    pub valid_from: u64,
    /// Validity length in days.
    pub valid_duration_days: u32,
}

impl DecryptionSession {
    /// End of validity (unix seconds, exclusive).
    pub fn expires_at(&self) -> u64 {
        self.valid_from
            .saturating_add(u64::from(self.valid_duration_days) * SECONDS_PER_DAY)
    }

    /// Is the session inside its validity window at `now`?
    pub fn is_valid_at(&self, now: u64) -> bool {
        now >= self.valid_from && now < self.expires_at()
    }

    /// Does the session belong to `user` and cover every contract?
    pub fn covers(&self, user: Address, contracts: &[Address]) -> bool {
        self.user_address == user
            && contracts
                .iter()
                .all(|c| self.authorized_contracts.contains(c))
    }

    /// Permit this session was signed over.
    pub fn permit(&self) -> DecryptionPermit {
        DecryptionPermit {
            public_key: self.public_key.clone(),
            contract_addresses: self.authorized_contracts.iter().copied().collect(),
            start_timestamp: self.valid_from,
            duration_days: self.valid_duration_days,
        }
    }

    /// Decoded signature bytes.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, ReactionSyncError> {
        let digits = self.signature.strip_prefix("0x").unwrap_or(&self.signature);
        hex::decode(digits).map_err(|_| ReactionSyncError::InvalidHex(self.signature.clone()))
    }
}

/// Builder for an encrypted input bound to (contract, user).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedInputBuilder {
    /// Contract the ciphertext will be consumed by.
    pub contract: Address,
    /// User submitting the ciphertext.
    pub user: Address,
    /// 32-bit addends, in order.
    pub values: Vec<u32>,
}

/// Start an encrypted input bound to (contract, user).
pub fn create_encrypted_input(contract: Address, user: Address) -> EncryptedInputBuilder {
    EncryptedInputBuilder {
        contract,
        user,
        values: Vec::new(),
    }
}

impl EncryptedInputBuilder {
    /// Append a 32-bit unsigned value.
    pub fn add32(mut self, value: u32) -> Self {
        self.values.push(value);
        self
    }
}

/// Ciphertext handles plus the proof binding them to (contract, user).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedInput {
    /// One handle per added value.
    pub handles: Vec<Handle>,
    /// Validity proof.
    pub input_proof: Vec<u8>,
}

/// One entry of a batch decrypt request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecryptRequest {
    /// Handle to decrypt.
    pub handle: Handle,
    /// Contract that owns the handle.
    pub contract_address: Address,
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Executed successfully.
    Success,
    /// Reverted with a reason.
    Reverted(String),
}

/// Transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Execution status.
    pub status: TxStatus,
}

impl TxReceipt {
    /// Turn a reverted receipt into an error.
    pub fn ensure_success(self) -> Result<Self, ReactionSyncError> {
        match &self.status {
            TxStatus::Success => Ok(self),
            TxStatus::Reverted(reason) => Err(ReactionSyncError::TransactionReverted {
                tx_hash: self.tx_hash,
                reason: reason.clone(),
            }),
        }
    }
}

/// Per-(post, reaction) view model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Handle of the aggregate total.
    pub total_handle: Option<Handle>,
    /// Handle of the caller's tally.
    pub my_handle: Option<Handle>,
    /// Cleartext of `total_handle`.
    pub decrypted_total: Option<u64>,
    /// Cleartext of `my_handle`.
    pub decrypted_mine: Option<u64>,
    /// Refresh/working lanes.
    pub activity: ActivityState,
    /// Stage of the action holding the working lane.
    pub stage: WorkflowStage,
    /// Last human-readable status.
    pub last_message: String,
}

impl SyncState {
    /// Is a refresh in flight?
    pub fn is_refreshing(&self) -> bool {
        self.activity.is_refreshing()
    }

    /// Is a user-triggered action in flight?
    pub fn is_working(&self) -> bool {
        self.activity.is_working()
    }

    /// Handle for a decrypt kind.
    pub fn handle(&self, kind: DecryptKind) -> Option<Handle> {
        match kind {
            DecryptKind::Total => self.total_handle,
            DecryptKind::Mine => self.my_handle,
        }
    }

    /// Decrypted value for a decrypt kind.
    pub fn decrypted(&self, kind: DecryptKind) -> Option<u64> {
        match kind {
            DecryptKind::Total => self.decrypted_total,
            DecryptKind::Mine => self.decrypted_mine,
        }
    }

    /// Store the total handle; a different handle supersedes the cleartext.
    pub fn set_total_handle(&mut self, handle: Option<Handle>) {
        if self.total_handle != handle {
            self.decrypted_total = None;
        }
        self.total_handle = handle;
    }

    /// Store the caller's handle; a different handle supersedes the cleartext.
    pub fn set_my_handle(&mut self, handle: Option<Handle>) {
        if self.my_handle != handle {
            self.decrypted_mine = None;
        }
        self.my_handle = handle;
    }

    /// Store a cleartext for a decrypt kind.
    pub fn set_decrypted(&mut self, kind: DecryptKind, value: u64) {
        match kind {
            DecryptKind::Total => self.decrypted_total = Some(value),
            DecryptKind::Mine => self.decrypted_mine = Some(value),
        }
    }

    /// Record a status message.
    pub fn record(&mut self, message: impl Into<String>) {
        self.last_message = message.into();
    }

    /// Enter the refresh lane.
    pub fn begin_refresh(&mut self) -> Result<(), ReactionSyncError> {
        self.activity = self.activity.begin_refresh()?;
        Ok(())
    }

    /// Leave the refresh lane.
    pub fn end_refresh(&mut self) -> Result<(), ReactionSyncError> {
        self.activity = self.activity.end_refresh()?;
        Ok(())
    }

    /// Enter the working lane.
    pub fn begin_work(&mut self, kind: WorkKind) -> Result<(), ReactionSyncError> {
        self.activity = self.activity.begin_work(kind)?;
        self.stage = WorkflowStage::Idle;
        Ok(())
    }

    /// Leave the working lane.
    pub fn end_work(&mut self) -> Result<(), ReactionSyncError> {
        self.activity = self.activity.end_work()?;
        self.stage = WorkflowStage::Idle;
        Ok(())
    }

    /// Advance the running workflow to `next`.
    pub fn advance(&mut self, next: WorkflowStage) -> Result<(), ReactionSyncError> {
        let allowed = self
            .activity
            .work_kind()
            .is_some_and(|work| self.stage.can_transition_to(next, work));
        if !allowed {
            return Err(ReactionSyncError::InvalidTransition {
                from: format!("{:?}", self.stage),
                to: format!("{:?}", next),
            });
        }
        self.stage = next;
        Ok(())
    }
}
