//! # Reaction Sync Configuration
//!
//! Configuration for the reaction sync service.

use crate::algorithms::ContractRegistry;
use crate::domain::ReactionSyncError;
use serde::{Deserialize, Serialize};

/// Default validity of a freshly signed decryption session.
pub const DEFAULT_SESSION_DURATION_DAYS: u32 = 365;

/// Default pause before encrypting a reaction.
pub const DEFAULT_REACT_SETTLE_DELAY_MS: u64 = 60;

/// Reaction sync configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionSyncConfig {
    /// Validity of newly signed decryption sessions, in days.
    pub session_duration_days: u32,

    /// Pause before encrypting a reaction, in milliseconds. Zero disables it.
    pub react_settle_delay_ms: u64,

    /// Show the failure detail in the react status message.
    ///
    /// Off by default; the detail is always logged.
    pub surface_react_errors: bool,

    /// Contract deployments per network.
    pub registry: ContractRegistry,
}

impl Default for ReactionSyncConfig {
    fn default() -> Self {
        Self {
            session_duration_days: DEFAULT_SESSION_DURATION_DAYS,
            react_settle_delay_ms: DEFAULT_REACT_SETTLE_DELAY_MS,
            surface_react_errors: false,
            registry: ContractRegistry::new(),
        }
    }
}

impl ReactionSyncConfig {
    /// Create a config for testing (no settle delay, detailed errors).
    pub fn for_testing() -> Self {
        Self {
            session_duration_days: 1,
            react_settle_delay_ms: 0,
            surface_react_errors: true,
            registry: ContractRegistry::new(),
        }
    }

    /// Parse a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ReactionSyncError> {
        serde_json::from_str(json).map_err(|e| ReactionSyncError::Config(e.to_string()))
    }

    /// Replace the registry.
    pub fn with_registry(mut self, registry: ContractRegistry) -> Self {
        self.registry = registry;
        self
    }
}
