//! # Contract Resolver
//!
//! Maps a network id to the SecretReactions binding on that network.

use crate::domain::{Address, ContractBinding, NetworkId, ReactionSyncError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One deployment entry, as written by the deploy step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    /// Deployed address; the null address means "not deployed".
    pub address: Address,
    /// Chain id recorded at deployment.
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Chain name recorded at deployment.
    #[serde(default)]
    pub chain_name: Option<String>,
}

impl RegistryEntry {
    /// Entry with just an address.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            chain_id: None,
            chain_name: None,
        }
    }

    /// Set the chain name.
    pub fn named(mut self, chain_name: &str) -> Self {
        self.chain_name = Some(chain_name.to_string());
        self
    }
}

/// Deployments keyed by network id.
///
/// Serialized as `{"<chainId>": {"address": "0x..", "chainId": n, "chainName": ".."}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl ContractRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON address file.
    pub fn from_json(json: &str) -> Result<Self, ReactionSyncError> {
        serde_json::from_str(json).map_err(|e| ReactionSyncError::Config(e.to_string()))
    }

    /// Register a deployment.
    pub fn insert(&mut self, network: NetworkId, entry: RegistryEntry) {
        self.entries.insert(network.to_string(), entry);
    }

    /// Builder-style insert.
    pub fn with_entry(mut self, network: NetworkId, entry: RegistryEntry) -> Self {
        self.insert(network, entry);
        self
    }

    /// Look up a deployment.
    pub fn get(&self, network: NetworkId) -> Option<&RegistryEntry> {
        self.entries.get(&network.to_string())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve the binding for `network`.
///
/// - no network: interface only
/// - no entry or null address: `chain_id` set, no address
/// - otherwise fully populated
pub fn resolve_contract(registry: &ContractRegistry, network: Option<NetworkId>) -> ContractBinding {
    let Some(network) = network else {
        return ContractBinding::unresolved();
    };

    match registry.get(network) {
        Some(entry) if !entry.address.is_zero() => ContractBinding {
            address: Some(entry.address),
            chain_id: Some(entry.chain_id.map(NetworkId).unwrap_or(network)),
            chain_name: entry.chain_name.clone(),
            ..ContractBinding::unresolved()
        },
        _ => ContractBinding::not_deployed(network),
    }
}
