//! Channel names and the typed request/response bodies exchanged on them

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Names of the relay channels
pub mod channels {
    pub const CONNECT: &str = "connect";
    pub const GET_SYNC_STATUS: &str = "get_sync_status";
    pub const SET_CHIA_ROOT: &str = "set_chia_root";
    pub const GET_CHIA_ROOT: &str = "get_chia_root";
    pub const GET_PUBLIC_KEYS: &str = "get_public_keys";
    pub const LOG_IN: &str = "log_in";
    pub const GET_WALLET_BALANCE: &str = "get_wallet_balance";
    pub const GET_DIDS: &str = "get_dids";
    pub const GET_NFTS_FOR_DID: &str = "get_nfts_for_did";
    pub const MINT_NFT: &str = "mint_nft";
    pub const GET_NFT_MINT_STATUS: &str = "get_nft_mint_status";
    pub const FETCH_LICENSE: &str = "fetch_license";
    pub const UPLOAD_NFT_ASSETS: &str = "upload_nft_assets";
    pub const GET_COLLECTIONS: &str = "get_collections";
    pub const SAVE_COLLECTION: &str = "save_collection";
    pub const DELETE_COLLECTION: &str = "delete_collection";
    pub const OPEN_WIN: &str = "open_win";
    pub const OPEN_EXTERNAL: &str = "open_external";
}

/// Network assumed when a request does not name one
pub const DEFAULT_NETWORK: &str = "testnet10";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChiaRootRequest {
    pub chia_root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInRequest {
    pub fingerprint: u32,
}

/// A DID wallet as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub did_id: String,
    #[serde(default)]
    pub coin_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftsForDidRequest {
    pub did: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintNftRequest {
    pub did: DidInfo,
    pub data_uris: Vec<String>,
    pub data_hash: String,
    pub metadata_uris: Vec<String>,
    pub metadata_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_hash: Option<String>,
    /// Percent of each resale paid to the creator (2.5 means 2.5%)
    #[serde(default)]
    pub royalty_percentage: f64,
    #[serde(default)]
    pub fee_in_xch: f64,
}

/// Mojos per XCH
pub const MOJO_PER_XCH: f64 = 1e12;

impl MintNftRequest {
    /// Royalty in basis points as the wallet expects it
    pub fn royalty_basis_points(&self) -> Option<u64> {
        to_whole(self.royalty_percentage * 100.0)
    }

    pub fn fee_mojos(&self) -> Option<u64> {
        to_whole(self.fee_in_xch * MOJO_PER_XCH)
    }
}

fn to_whole(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

/// Launcher id of a freshly minted NFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedNft {
    pub id: String,
    pub encoded_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintStatusRequest {
    pub nft_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchLicenseRequest {
    pub license_url: String,
}

/// File reference for an upload; content is read from `path`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileSpec {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadAssetsRequest {
    pub file: UploadFileSpec,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCollectionRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenWinRequest {
    pub route: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenExternalRequest {
    /// NFT record; its `encoded_id` / `encodedId` selects the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nft: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl OpenExternalRequest {
    pub fn encoded_id(&self) -> Option<&str> {
        let nft = self.nft.as_ref()?;
        nft.get("encoded_id")
            .or_else(|| nft.get("encodedId"))
            .and_then(Value::as_str)
    }
}
