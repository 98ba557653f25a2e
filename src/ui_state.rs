//! Last-known wallet status as seen by the UI
//!
//! Owned by whichever layer drives the UI and updated only from relay responses.

use crate::api::DEFAULT_NETWORK;
use crate::relay::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub synced: bool,
    pub syncing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChiaState {
    pub active_fingerprint: Option<u32>,
    pub sync_status: Option<SyncStatus>,
    pub network_name: Option<String>,
}

impl ChiaState {
    /// Apply a `get_sync_status` response
    pub fn apply_sync_status(&mut self, response: &Payload) {
        let flag = |key: &str| response.get(key).and_then(Value::as_bool).unwrap_or(false);
        self.sync_status = Some(SyncStatus {
            synced: flag("synced"),
            syncing: flag("syncing"),
        });

        if let Some(name) = response.get("network_name").and_then(Value::as_str) {
            self.network_name = Some(name.to_string());
        }
    }

    /// Apply a `get_public_keys` response; a null fingerprint clears the active key
    pub fn apply_public_keys(&mut self, response: &Payload) {
        self.active_fingerprint = response
            .get("fingerprint")
            .and_then(Value::as_u64)
            .and_then(|f| u32::try_from(f).ok());
    }

    pub fn apply_log_in(&mut self, fingerprint: u32) {
        self.active_fingerprint = Some(fingerprint);
        // Sync state belongs to the previous key
        self.sync_status = None;
    }

    /// Network name to use for marketplace queries
    pub fn network(&self) -> &str {
        self.network_name.as_deref().unwrap_or(DEFAULT_NETWORK)
    }

    pub fn is_testnet(&self) -> bool {
        self.network() != "mainnet"
    }

    pub fn is_synced(&self) -> bool {
        self.sync_status.map(|s| s.synced).unwrap_or(false)
    }
}
