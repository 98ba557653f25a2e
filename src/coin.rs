//! Coin ids and NFT identifiers
//!
//! A coin id is `sha256(parent_coin_info || puzzle_hash || amount)` where the
//! amount uses the CLVM integer encoding (minimal big-endian, sign-safe). An NFT is
//! identified by the id of its singleton launcher coin, shown to users as a
//! bech32m string with the `nft` prefix.

use bech32::{Bech32m, Hrp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Human-readable prefix of encoded NFT ids
pub const NFT_HRP: &str = "nft";

/// Puzzle hash of the singleton launcher
pub const SINGLETON_LAUNCHER_HASH: &str =
    "eff07522495060c066f66f32acc2a77e3a3e737aca8baea4d1a64ea4cdc13da9";

#[derive(Debug, Error)]
pub enum CoinError {
    #[error("invalid hex in {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    #[error("{field} must be 32 bytes, got {len}")]
    InvalidLength { field: &'static str, len: usize },

    #[error("malformed coin record: {0}")]
    Malformed(String),

    #[error("bech32m encoding failed: {0}")]
    Encode(String),
}

/// Coin as returned by the wallet RPC (hex fields may carry a `0x` prefix)
#[derive(Debug, Clone, Deserialize)]
struct CoinRecord {
    parent_coin_info: String,
    puzzle_hash: String,
    amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub parent_coin_info: [u8; 32],
    pub puzzle_hash: [u8; 32],
    pub amount: u64,
}

impl Coin {
    /// Parse a coin from its RPC JSON form
    pub fn from_json(value: &Value) -> Result<Self, CoinError> {
        let record: CoinRecord = serde_json::from_value(value.clone())
            .map_err(|e| CoinError::Malformed(e.to_string()))?;

        Ok(Self {
            parent_coin_info: parse_bytes32("parent_coin_info", &record.parent_coin_info)?,
            puzzle_hash: parse_bytes32("puzzle_hash", &record.puzzle_hash)?,
            amount: record.amount,
        })
    }

    pub fn coin_id(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.parent_coin_info);
        hasher.update(self.puzzle_hash);
        hasher.update(amount_bytes(self.amount));

        let mut id = [0u8; 32];
        id.copy_from_slice(&hasher.finalize());
        id
    }

    /// Coin id as lowercase hex without prefix
    pub fn coin_id_hex(&self) -> String {
        hex::encode(self.coin_id())
    }
}

/// Launcher id in both raw and user-facing form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftId {
    pub id: String,
    pub encoded_id: String,
}

impl NftId {
    pub fn from_launcher(launcher: &Coin) -> Result<Self, CoinError> {
        let id = launcher.coin_id();
        Ok(Self {
            id: hex::encode(id),
            encoded_id: encode_nft_id(&id)?,
        })
    }
}

/// bech32m-encode a launcher id with the `nft` prefix
pub fn encode_nft_id(id: &[u8; 32]) -> Result<String, CoinError> {
    let hrp = Hrp::parse(NFT_HRP).map_err(|e| CoinError::Encode(e.to_string()))?;
    bech32::encode::<Bech32m>(hrp, id).map_err(|e| CoinError::Encode(e.to_string()))
}

/// CLVM integer encoding of a non-negative amount
fn amount_bytes(amount: u64) -> Vec<u8> {
    if amount == 0 {
        return Vec::new();
    }

    let bytes = amount.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let mut out = Vec::with_capacity(9);
    // High bit set would read as negative
    if bytes[first] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[first..]);
    out
}

pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

fn parse_bytes32(field: &'static str, s: &str) -> Result<[u8; 32], CoinError> {
    let bytes = hex::decode(strip_hex_prefix(s)).map_err(|e| CoinError::InvalidHex {
        field,
        reason: e.to_string(),
    })?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CoinError::InvalidLength { field, len })
}

/// Find the launcher coin among the coin spends of a spend bundle
pub fn find_launcher_coin(spend_bundle: &Value) -> Option<&Value> {
    let spends = spend_bundle
        .get("coin_solutions")
        .or_else(|| spend_bundle.get("coin_spends"))?
        .as_array()?;

    spends
        .iter()
        .filter_map(|spend| spend.get("coin"))
        .find(|coin| {
            coin.get("puzzle_hash")
                .and_then(Value::as_str)
                .map(|ph| strip_hex_prefix(ph).eq_ignore_ascii_case(SINGLETON_LAUNCHER_HASH))
                .unwrap_or(false)
        })
}
