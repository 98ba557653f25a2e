//! Channels backed by the wallet node

use super::{parse, AppContext, HandlerError};
use crate::api::{DidInfo, LogInRequest, MintNftRequest, MintStatusRequest, MintedNft};
use crate::coin::{find_launcher_coin, strip_hex_prefix, Coin, NftId};
use crate::relay::envelope::into_payload;
use crate::relay::Payload;
use crate::wallet::{WalletError, DID_WALLET_TYPE, STANDARD_WALLET_ID};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Number of recent transactions searched for a mint
const MINT_STATUS_LOOKBACK: u32 = 10;

pub async fn connect(ctx: Arc<AppContext>, _payload: Payload) -> Result<Payload, HandlerError> {
    let outcome: Result<Value, HandlerError> = async {
        let rpc = ctx.wallet_rpc()?;
        Ok(rpc.call("healthz", json!({})).await?)
    }
    .await;

    match outcome {
        Ok(_) => Ok(into_payload(json!({ "success": true }))),
        Err(e) => {
            log::warn!("Wallet connection failed: {}", e);
            // The renderer offers to change the root, so report the one in use
            Ok(into_payload(json!({
                "error": e.to_string(),
                "chiaRoot": ctx.chia_root(),
            })))
        }
    }
}

pub async fn get_sync_status(ctx: Arc<AppContext>, _payload: Payload) -> Result<Payload, HandlerError> {
    let rpc = ctx.wallet_rpc()?;
    let sync_status = rpc.call("get_sync_status", json!({})).await?;
    let network_info = rpc.call("get_network_info", json!({})).await?;

    let mut merged = into_payload(sync_status);
    merged.extend(into_payload(network_info));
    Ok(merged)
}

pub async fn get_public_keys(ctx: Arc<AppContext>, _payload: Payload) -> Result<Payload, HandlerError> {
    let rpc = ctx.wallet_rpc()?;
    let keys = rpc.call("get_public_keys", json!({})).await?;
    let logged_in = rpc.call("get_logged_in_fingerprint", json!({})).await?;

    Ok(into_payload(json!({
        "fingerprints": keys.get("public_key_fingerprints").cloned().unwrap_or_else(|| json!([])),
        "fingerprint": logged_in.get("fingerprint").cloned().unwrap_or(Value::Null),
    })))
}

pub async fn log_in(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: LogInRequest = parse(payload)?;
    let rpc = ctx.wallet_rpc()?;
    let response = rpc
        .call("log_in", json!({ "fingerprint": request.fingerprint }))
        .await?;
    log::info!("Logged in with fingerprint {}", request.fingerprint);
    Ok(into_payload(response))
}

pub async fn get_wallet_balance(ctx: Arc<AppContext>, _payload: Payload) -> Result<Payload, HandlerError> {
    let rpc = ctx.wallet_rpc()?;
    let response = rpc
        .call("get_wallet_balance", json!({ "wallet_id": STANDARD_WALLET_ID }))
        .await?;
    Ok(into_payload(response))
}

pub async fn get_dids(ctx: Arc<AppContext>, _payload: Payload) -> Result<Payload, HandlerError> {
    let rpc = ctx.wallet_rpc()?;
    let response = rpc
        .call("get_wallets", json!({ "type": DID_WALLET_TYPE }))
        .await?;

    let wallets = response
        .get("wallets")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut dids = Vec::with_capacity(wallets.len());
    for wallet in wallets {
        let wallet_id = required_id(&wallet, "get_wallets", "id")?;
        let did = rpc
            .call("did_get_did", json!({ "wallet_id": wallet_id }))
            .await?;

        dids.push(DidInfo {
            name: wallet.get("name").and_then(Value::as_str).map(str::to_string),
            did_id: did
                .get("my_did")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            coin_id: did.get("coin_id").and_then(Value::as_str).map(str::to_string),
        });
    }

    Ok(into_payload(json!({ "dids": dids })))
}

pub async fn mint_nft(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: MintNftRequest = parse(payload)?;
    let royalty = request
        .royalty_basis_points()
        .ok_or_else(|| HandlerError::InvalidRequest("royaltyPercentage must be >= 0".to_string()))?;
    let fee = request
        .fee_mojos()
        .ok_or_else(|| HandlerError::InvalidRequest("feeInXch must be >= 0".to_string()))?;

    let rpc = ctx.wallet_rpc()?;
    let wallet = rpc
        .call(
            "create_new_wallet",
            json!({ "wallet_type": "nft_wallet", "did_id": request.did.did_id }),
        )
        .await?;
    let wallet_id = required_id(&wallet, "create_new_wallet", "wallet_id")?;

    let mut params = Map::new();
    params.insert("wallet_id".into(), wallet_id);
    params.insert("uris".into(), json!(request.data_uris));
    params.insert("hash".into(), json!(request.data_hash));
    params.insert("meta_uris".into(), json!(request.metadata_uris));
    params.insert("meta_hash".into(), json!(request.metadata_hash));
    if let Some(url) = &request.license_url {
        params.insert("license_uris".into(), json!([url]));
    }
    if let Some(hash) = &request.license_hash {
        params.insert("license_hash".into(), json!(hash));
    }
    params.insert("did_id".into(), json!(request.did.did_id));
    params.insert("royalty_percentage".into(), json!(royalty));
    params.insert("fee".into(), json!(fee));

    let response = rpc.call("nft_mint_nft", Value::Object(params)).await?;

    let launcher = response
        .get("spend_bundle")
        .and_then(find_launcher_coin)
        .map(Coin::from_json)
        .transpose()?;

    match launcher {
        Some(coin) => {
            let nft = NftId::from_launcher(&coin)?;
            log::info!("Minted NFT {}", nft.encoded_id);
            let minted = MintedNft {
                id: nft.id,
                encoded_id: nft.encoded_id,
            };
            Ok(into_payload(json!(minted)))
        }
        None => {
            log::warn!("Mint submitted but no launcher coin found in the spend bundle");
            Ok(Payload::new())
        }
    }
}

pub async fn get_nft_mint_status(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: MintStatusRequest = parse(payload)?;
    let wanted = strip_hex_prefix(&request.nft_id).to_lowercase();

    let rpc = ctx.wallet_rpc()?;
    let response = rpc
        .call(
            "get_transactions",
            json!({ "wallet_id": STANDARD_WALLET_ID, "end": MINT_STATUS_LOOKBACK, "reverse": true }),
        )
        .await?;

    let transactions = response
        .get("transactions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for transaction in transactions {
        let additions = transaction
            .get("additions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let minted = additions.iter().any(|addition| match Coin::from_json(addition) {
            Ok(coin) => coin.coin_id_hex() == wanted,
            Err(e) => {
                log::debug!("Skipping unreadable addition: {}", e);
                false
            }
        });

        if minted {
            return Ok(into_payload(json!({ "transaction": transaction })));
        }
    }

    Ok(into_payload(json!({ "transaction": null })))
}

/// Wallet id field of an RPC response; a missing id must not reach a later call
fn required_id(response: &Value, method: &str, key: &str) -> Result<Value, WalletError> {
    match response.get(key) {
        Some(id) if id.is_u64() => Ok(id.clone()),
        _ => Err(WalletError::Rpc {
            method: method.to_string(),
            message: format!("response has no numeric '{}'", key),
        }),
    }
}
