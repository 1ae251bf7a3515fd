//! # Domain Value Objects
//!
//! Immutable value types: addresses, handles, content ids, and the two state
//! machines (per-key activity and workflow stage).

use super::errors::ReactionSyncError;
use crate::algorithms::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-width byte newtype rendered as `0x`-prefixed lowercase hex.
macro_rules! hex_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            /// All-zero value.
            pub const ZERO: Self = Self([0u8; $len]);

            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Check for the all-zero value.
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ReactionSyncError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                let bytes =
                    hex::decode(digits).map_err(|_| ReactionSyncError::InvalidHex(s.to_string()))?;
                let bytes: [u8; $len] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ReactionSyncError::InvalidHex(s.to_string()))?;
                Ok(Self(bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_newtype!(
    /// 20-byte account or contract address. `Address::ZERO` is the null address.
    Address,
    20
);

hex_newtype!(
    /// Opaque reference to an encrypted value held by the ledger.
    ///
    /// `Handle::ZERO` means "known to be zero, nothing to decrypt". Equality is
    /// identity of reference, never equality of plaintext.
    Handle,
    32
);

hex_newtype!(
    /// Transaction hash.
    TxHash,
    32
);

hex_newtype!(
    /// Content-addressed 32-byte identifier for posts and reactions.
    ContentId,
    32
);

impl ContentId {
    /// Derive the id of a human-readable key: keccak256 of its UTF-8 bytes.
    pub fn from_slug(slug: &str) -> Self {
        Self(keccak256(slug.as_bytes()))
    }
}

/// Network (chain) identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u64);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two per-key handles a decrypt targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecryptKind {
    /// Aggregate total of the (post, reaction) pair.
    Total,
    /// Caller's own tally.
    Mine,
}

impl fmt::Display for DecryptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptKind::Total => write!(f, "total"),
            DecryptKind::Mine => write!(f, "mine"),
        }
    }
}

/// User-triggered operation occupying the working lane of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkKind {
    /// `react(amount)` workflow.
    React,
    /// `request_total_access()` workflow.
    RequestAccess,
    /// Direct decrypt request.
    Decrypt(DecryptKind),
}

/// Per-key activity state machine.
///
/// The refresh lane and the working lane are tracked in one value so that a
/// refresh issued from inside a workflow is still single-flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivityState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A handle refresh is in flight.
    Refreshing,
    /// A user-triggered action is in flight.
    Working(WorkKind),
    /// A user-triggered action is in flight and has a refresh outstanding.
    WorkingRefreshing(WorkKind),
}

impl ActivityState {
    /// Start a refresh. Rejected if one is already in flight.
    pub fn begin_refresh(self) -> Result<Self, ReactionSyncError> {
        match self {
            Self::Idle => Ok(Self::Refreshing),
            Self::Working(kind) => Ok(Self::WorkingRefreshing(kind)),
            other => Err(other.rejected("Refreshing")),
        }
    }

    /// Finish a refresh.
    pub fn end_refresh(self) -> Result<Self, ReactionSyncError> {
        match self {
            Self::Refreshing => Ok(Self::Idle),
            Self::WorkingRefreshing(kind) => Ok(Self::Working(kind)),
            other => Err(other.rejected("end of refresh")),
        }
    }

    /// Start a user-triggered action. Rejected if one is already working.
    pub fn begin_work(self, kind: WorkKind) -> Result<Self, ReactionSyncError> {
        match self {
            Self::Idle => Ok(Self::Working(kind)),
            Self::Refreshing => Ok(Self::WorkingRefreshing(kind)),
            other => Err(other.rejected(&format!("Working({:?})", kind))),
        }
    }

    /// Finish the user-triggered action.
    pub fn end_work(self) -> Result<Self, ReactionSyncError> {
        match self {
            Self::Working(_) => Ok(Self::Idle),
            Self::WorkingRefreshing(_) => Ok(Self::Refreshing),
            other => Err(other.rejected("end of work")),
        }
    }

    /// Is a refresh in flight?
    pub fn is_refreshing(&self) -> bool {
        matches!(self, Self::Refreshing | Self::WorkingRefreshing(_))
    }

    /// Is a user-triggered action in flight?
    pub fn is_working(&self) -> bool {
        self.work_kind().is_some()
    }

    /// The action currently holding the working lane.
    pub fn work_kind(&self) -> Option<WorkKind> {
        match self {
            Self::Working(kind) | Self::WorkingRefreshing(kind) => Some(*kind),
            _ => None,
        }
    }

    fn rejected(self, to: &str) -> ReactionSyncError {
        ReactionSyncError::InvalidTransition {
            from: format!("{:?}", self),
            to: to.to_string(),
        }
    }
}

/// Stage of the action holding the working lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStage {
    /// No workflow running.
    #[default]
    Idle,
    /// Producing ciphertext and proof.
    Encrypting,
    /// Sending the transaction.
    Submitting,
    /// Awaiting the receipt.
    Confirming,
    /// Re-reading handles.
    Syncing,
    /// Decrypting the caller's tally.
    DecryptingMine,
    /// Decrypting the aggregate total.
    DecryptingTotal,
}

impl WorkflowStage {
    /// Check if transition is valid for the given workflow.
    ///
    /// Staying in place and aborting to `Idle` are always allowed.
    pub fn can_transition_to(&self, next: WorkflowStage, work: WorkKind) -> bool {
        use WorkflowStage::*;

        if *self == next || next == Idle {
            return true;
        }
        matches!(
            (work, *self, next),
            (WorkKind::React, Idle, Encrypting)
                | (WorkKind::React, Encrypting, Submitting)
                | (WorkKind::React, Submitting, Confirming)
                | (WorkKind::React, Confirming, Syncing)
                | (WorkKind::React, Syncing, DecryptingMine)
                | (WorkKind::RequestAccess, Idle, Submitting)
                | (WorkKind::RequestAccess, Submitting, Confirming)
                | (WorkKind::RequestAccess, Confirming, Syncing)
                | (WorkKind::RequestAccess, Syncing, DecryptingTotal)
                | (WorkKind::Decrypt(DecryptKind::Total), Idle, Syncing)
                | (WorkKind::Decrypt(DecryptKind::Total), Syncing, DecryptingTotal)
                | (WorkKind::Decrypt(DecryptKind::Total), Idle, DecryptingTotal)
                | (WorkKind::Decrypt(DecryptKind::Mine), Idle, DecryptingMine)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr: Address = "0x00000000000000000000000000000000000000aB".parse().unwrap();
        assert_eq!(addr.as_bytes()[19], 0xAB);
        assert_eq!(addr.to_string(), "0x00000000000000000000000000000000000000ab");
    }

    #[test]
    fn test_address_wrong_length_rejected() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("not-hex".parse::<Handle>().is_err());
    }

    #[test]
    fn test_zero_handle() {
        assert!(Handle::ZERO.is_zero());
        assert!(!Handle::new([1u8; 32]).is_zero());
    }

    #[test]
    fn test_content_id_from_slug() {
        // keccak256("") is the well-known empty hash
        assert_eq!(
            ContentId::from_slug("").to_string(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(ContentId::from_slug("clap"), ContentId::from_slug("clap"));
        assert_ne!(ContentId::from_slug("clap"), ContentId::from_slug("heart"));
    }

    #[test]
    fn test_handle_serde_as_hex_string() {
        let handle = Handle::new([0x11; 32]);
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, format!("\"{}\"", handle));
        let back: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn test_activity_refresh_is_single_flight() {
        let state = ActivityState::Idle.begin_refresh().unwrap();
        assert!(state.is_refreshing());
        assert!(state.begin_refresh().is_err());
        assert_eq!(state.end_refresh().unwrap(), ActivityState::Idle);
    }

    #[test]
    fn test_activity_work_is_single_flight() {
        let state = ActivityState::Idle.begin_work(WorkKind::React).unwrap();
        assert!(state.is_working());
        assert!(state.begin_work(WorkKind::RequestAccess).is_err());
    }

    #[test]
    fn test_activity_refresh_inside_work() {
        let state = ActivityState::Working(WorkKind::React);
        let refreshing = state.begin_refresh().unwrap();
        assert_eq!(refreshing, ActivityState::WorkingRefreshing(WorkKind::React));
        assert!(refreshing.is_refreshing() && refreshing.is_working());
        assert_eq!(refreshing.end_work().unwrap(), ActivityState::Refreshing);
    }

    #[test]
    fn test_activity_end_without_begin_rejected() {
        assert!(ActivityState::Idle.end_refresh().is_err());
        assert!(ActivityState::Idle.end_work().is_err());
        assert!(ActivityState::Refreshing.end_work().is_err());
    }

    #[test]
    fn test_react_stage_sequence() {
        use WorkflowStage::*;
        let path = [Idle, Encrypting, Submitting, Confirming, Syncing, DecryptingMine, Idle];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1], WorkKind::React));
        }
    }

    #[test]
    fn test_access_stage_sequence() {
        use WorkflowStage::*;
        let path = [Idle, Submitting, Confirming, Syncing, DecryptingTotal, Idle];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1], WorkKind::RequestAccess));
        }
        assert!(!Idle.can_transition_to(Encrypting, WorkKind::RequestAccess));
    }

    #[test]
    fn test_stage_skip_rejected() {
        use WorkflowStage::*;
        assert!(!Idle.can_transition_to(Confirming, WorkKind::React));
        assert!(!Encrypting.can_transition_to(Syncing, WorkKind::React));
        assert!(!Syncing.can_transition_to(DecryptingTotal, WorkKind::React));
    }

    #[test]
    fn test_stage_abort_always_allowed() {
        use WorkflowStage::*;
        assert!(Confirming.can_transition_to(Idle, WorkKind::React));
        assert!(Submitting.can_transition_to(Idle, WorkKind::RequestAccess));
    }
}
