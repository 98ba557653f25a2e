//! Typed renderer-side facade over the relay
//!
//! Each method issues one request and decodes its response. Responses that carry
//! wallet status are folded into the [`ChiaState`] held by the client.

use crate::api::{
    channels, DidInfo, FetchLicenseRequest, MintNftRequest, MintStatusRequest, MintedNft,
    NftsForDidRequest, OpenExternalRequest, UploadAssetsRequest,
};
use crate::relay::envelope::into_payload;
use crate::relay::{Payload, RelayClient, RelayError};
use crate::services::nft_storage::UploadResult;
use crate::store::Collection;
use crate::ui_state::{ChiaState, SyncStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub struct MinterClient {
    relay: RelayClient,
    state: Arc<Mutex<ChiaState>>,
}

impl MinterClient {
    pub fn new(relay: RelayClient) -> Self {
        Self {
            relay,
            state: Arc::new(Mutex::new(ChiaState::default())),
        }
    }

    /// Snapshot of the last-known wallet status
    pub fn state(&self) -> ChiaState {
        self.state.lock().unwrap().clone()
    }

    /// Send a raw request on any channel
    pub async fn call(&self, channel: &str, payload: Payload) -> Result<Payload, RelayError> {
        self.relay.request(channel, payload).await
    }

    /// Check the wallet node is reachable
    pub async fn connect(&self) -> Result<(), RelayError> {
        self.call(channels::CONNECT, Payload::new()).await.map(|_| ())
    }

    pub async fn refresh_sync_status(&self) -> Result<SyncStatus, RelayError> {
        let response = self.call(channels::GET_SYNC_STATUS, Payload::new()).await?;
        let mut state = self.state.lock().unwrap();
        state.apply_sync_status(&response);
        Ok(state.sync_status.unwrap_or_default())
    }

    pub async fn chia_root(&self) -> Result<String, RelayError> {
        let response = self.call(channels::GET_CHIA_ROOT, Payload::new()).await?;
        field(response, "chiaRoot")
    }

    pub async fn set_chia_root(&self, root: &str) -> Result<(), RelayError> {
        self.call(channels::SET_CHIA_ROOT, into_payload(json!({ "chiaRoot": root })))
            .await
            .map(|_| ())
    }

    /// Fingerprints of all keys; also records the active one
    pub async fn load_public_keys(&self) -> Result<Vec<u32>, RelayError> {
        let response = self.call(channels::GET_PUBLIC_KEYS, Payload::new()).await?;
        self.state.lock().unwrap().apply_public_keys(&response);
        field(response, "fingerprints")
    }

    pub async fn log_in(&self, fingerprint: u32) -> Result<(), RelayError> {
        self.call(channels::LOG_IN, into_payload(json!({ "fingerprint": fingerprint })))
            .await?;
        self.state.lock().unwrap().apply_log_in(fingerprint);
        Ok(())
    }

    pub async fn wallet_balance(&self) -> Result<Payload, RelayError> {
        self.call(channels::GET_WALLET_BALANCE, Payload::new()).await
    }

    pub async fn dids(&self) -> Result<Vec<DidInfo>, RelayError> {
        let response = self.call(channels::GET_DIDS, Payload::new()).await?;
        field(response, "dids")
    }

    /// NFTs created by `did` on the network the wallet last reported
    pub async fn nfts_for_did(&self, did: &str) -> Result<Vec<Value>, RelayError> {
        let request = NftsForDidRequest {
            did: did.to_string(),
            network: Some(self.state().network().to_string()),
        };
        let response = self.call(channels::GET_NFTS_FOR_DID, to_payload(&request)?).await?;
        field(response, "nfts")
    }

    /// Mint an NFT; `None` when the wallet accepted the mint but no launcher was found
    pub async fn mint_nft(&self, request: &MintNftRequest) -> Result<Option<MintedNft>, RelayError> {
        let response = self.call(channels::MINT_NFT, to_payload(request)?).await?;
        if response.is_empty() {
            return Ok(None);
        }
        decode(Value::Object(response)).map(Some)
    }

    /// The transaction that created `nft_id`, once it shows up in the wallet
    pub async fn nft_mint_status(&self, nft_id: &str) -> Result<Option<Value>, RelayError> {
        let request = MintStatusRequest {
            nft_id: nft_id.to_string(),
        };
        let response = self.call(channels::GET_NFT_MINT_STATUS, to_payload(&request)?).await?;
        Ok(response.get("transaction").filter(|t| !t.is_null()).cloned())
    }

    pub async fn license_hash(&self, license_url: &str) -> Result<String, RelayError> {
        let request = FetchLicenseRequest {
            license_url: license_url.to_string(),
        };
        let response = self.call(channels::FETCH_LICENSE, to_payload(&request)?).await?;
        field(response, "licenseHash")
    }

    pub async fn upload_assets(&self, request: &UploadAssetsRequest) -> Result<UploadResult, RelayError> {
        let response = self.call(channels::UPLOAD_NFT_ASSETS, to_payload(request)?).await?;
        decode(Value::Object(response))
    }

    pub async fn collections(&self) -> Result<BTreeMap<String, Collection>, RelayError> {
        let response = self.call(channels::GET_COLLECTIONS, Payload::new()).await?;
        field(response, "collections")
    }

    pub async fn save_collection(&self, collection: &Collection) -> Result<Collection, RelayError> {
        let payload = into_payload(json!({ "collection": collection }));
        let response = self.call(channels::SAVE_COLLECTION, payload).await?;
        field(response, "collection")
    }

    /// Returns whether the collection existed
    pub async fn delete_collection(&self, id: &str) -> Result<bool, RelayError> {
        let response = self
            .call(channels::DELETE_COLLECTION, into_payload(json!({ "id": id })))
            .await?;
        field(response, "deleted")
    }

    pub async fn open_window(&self, route: &str) -> Result<(), RelayError> {
        self.call(channels::OPEN_WIN, into_payload(json!({ "route": route })))
            .await
            .map(|_| ())
    }

    /// Open an NFT (or the NFT index) on the marketplace website; returns the URL
    pub async fn open_on_marketplace(&self, encoded_id: Option<&str>) -> Result<String, RelayError> {
        let request = OpenExternalRequest {
            nft: encoded_id.map(|id| json!({ "encodedId": id })),
            network: Some(self.state().network().to_string()),
        };
        let response = self.call(channels::OPEN_EXTERNAL, to_payload(&request)?).await?;
        field(response, "url")
    }
}

fn to_payload<T: Serialize>(value: &T) -> Result<Payload, RelayError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RelayError::Malformed(format!("expected an object, got {}", other))),
        Err(e) => Err(RelayError::Malformed(e.to_string())),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RelayError> {
    serde_json::from_value(value).map_err(|e| RelayError::Malformed(e.to_string()))
}

fn field<T: DeserializeOwned>(mut response: Payload, key: &str) -> Result<T, RelayError> {
    let value = response
        .remove(key)
        .ok_or_else(|| RelayError::Malformed(format!("response has no '{}'", key)))?;
    decode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UploadFileSpec;
    use crate::relay::RelayClient;
    use crate::store::CollectionAttribute;
    use crate::testing::{client_for, test_context, ScriptedWallet};
    use tempfile::TempDir;

    fn minter(dir: &TempDir, wallet: std::sync::Arc<ScriptedWallet>) -> MinterClient {
        MinterClient::new(client_for(test_context(dir, wallet)))
    }

    #[tokio::test]
    async fn test_status_flow_updates_state() {
        let wallet = ScriptedWallet::new();
        wallet.on("healthz", json!({ "success": true }));
        wallet.on("get_public_keys", json!({ "public_key_fingerprints": [3735928559u32, 42] }));
        wallet.on("get_logged_in_fingerprint", json!({ "fingerprint": 42 }));
        wallet.on("get_sync_status", json!({ "synced": false, "syncing": true }));
        wallet.on("get_network_info", json!({ "network_name": "mainnet" }));
        wallet.on("log_in", json!({ "fingerprint": 3735928559u32, "success": true }));
        let dir = TempDir::new().unwrap();
        let client = minter(&dir, wallet);

        client.connect().await.unwrap();
        let keys = client.load_public_keys().await.unwrap();
        assert_eq!(keys, vec![3735928559, 42]);
        assert_eq!(client.state().active_fingerprint, Some(42));

        let status = client.refresh_sync_status().await.unwrap();
        assert!(status.syncing);
        assert_eq!(client.state().network(), "mainnet");

        client.log_in(3735928559).await.unwrap();
        let state = client.state();
        assert_eq!(state.active_fingerprint, Some(3735928559));
        assert_eq!(state.sync_status, None);
        assert_eq!(state.network(), "mainnet");
    }

    #[tokio::test]
    async fn test_failed_log_in_keeps_state() {
        let wallet = ScriptedWallet::new();
        wallet.fail("log_in", "no such key");
        let dir = TempDir::new().unwrap();
        let client = minter(&dir, wallet);

        assert!(client.log_in(7).await.is_err());
        assert_eq!(client.state().active_fingerprint, None);
    }

    #[tokio::test]
    async fn test_mint_and_status() {
        let wallet = ScriptedWallet::new();
        wallet.on("create_new_wallet", json!({ "wallet_id": 3 }));
        wallet.on("nft_mint_nft", json!({ "spend_bundle": { "coin_spends": [] } }));
        wallet.on("get_transactions", json!({ "transactions": [] }));
        let dir = TempDir::new().unwrap();
        let client = minter(&dir, wallet);

        let request = MintNftRequest {
            did: DidInfo {
                name: None,
                did_id: "did:chia:1artist".to_string(),
                coin_id: None,
            },
            data_uris: vec!["ipfs://cid/a.png".to_string()],
            data_hash: "aa".to_string(),
            metadata_uris: vec!["ipfs://cid/metadata.json".to_string()],
            metadata_hash: "bb".to_string(),
            license_url: None,
            license_hash: None,
            royalty_percentage: 2.5,
            fee_in_xch: 0.0,
        };
        assert_eq!(client.mint_nft(&request).await.unwrap(), None);
        assert_eq!(client.nft_mint_status("0xabc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_collections_and_root() {
        let dir = TempDir::new().unwrap();
        let client = minter(&dir, ScriptedWallet::new());

        let collection = Collection {
            id: "birds".to_string(),
            name: "Birds".to_string(),
            attributes: vec![CollectionAttribute {
                trait_type: "Colour".to_string(),
            }],
            ..Collection::default()
        };
        assert_eq!(client.save_collection(&collection).await.unwrap(), collection);
        assert_eq!(client.collections().await.unwrap()["birds"], collection);
        assert!(client.delete_collection("birds").await.unwrap());
        assert!(!client.delete_collection("birds").await.unwrap());

        client.set_chia_root("/srv/chia").await.unwrap();
        assert_eq!(client.chia_root().await.unwrap(), "/srv/chia");

        let url = client.open_on_marketplace(Some("nft1xyz")).await.unwrap();
        assert_eq!(url, "https://testnet.mintgarden.io/nfts/nft1xyz");
    }

    #[tokio::test]
    async fn test_upload_without_token_is_rejected() {
        let dir = TempDir::new().unwrap();
        let art = dir.path().join("a.png");
        std::fs::write(&art, b"x").unwrap();
        let client = minter(&dir, ScriptedWallet::new());

        let request = UploadAssetsRequest {
            file: UploadFileSpec {
                path: art.to_string_lossy().to_string(),
                name: None,
                content_type: None,
            },
            metadata: json!({}),
        };
        let err = client.upload_assets(&request).await.unwrap_err();
        assert_eq!(err.rejection().unwrap(), &json!("NFT_STORAGE_TOKEN is not set"));
    }

    #[tokio::test]
    async fn test_detached_client_fails_immediately() {
        let client = MinterClient::new(RelayClient::detached());
        assert!(matches!(client.connect().await, Err(RelayError::TransportUnavailable)));
    }
}
