//! Channels backed by the marketplace and storage services

use super::{parse, AppContext, HandlerError};
use crate::api::{FetchLicenseRequest, NftsForDidRequest, UploadAssetsRequest, DEFAULT_NETWORK};
use crate::relay::envelope::into_payload;
use crate::relay::Payload;
use crate::services::license::fetch_license_hash;
use crate::services::nft_storage::AssetFile;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub async fn get_nfts_for_did(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: NftsForDidRequest = parse(payload)?;
    let network = request.network.as_deref().unwrap_or(DEFAULT_NETWORK);

    let nfts = ctx.marketplace.nfts_created_by(&request.did, network).await?;
    log::debug!("{} NFTs created by {} on {}", nfts.len(), request.did, network);
    Ok(into_payload(json!({ "nfts": nfts })))
}

pub async fn fetch_license(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: FetchLicenseRequest = parse(payload)?;
    let license_hash = fetch_license_hash(&ctx.http, &request.license_url).await?;
    Ok(into_payload(json!({ "licenseHash": license_hash })))
}

pub async fn upload_nft_assets(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: UploadAssetsRequest = parse(payload)?;
    let spec = request.file;

    let path = Path::new(&spec.path).to_path_buf();
    let file = tokio::task::spawn_blocking(move || AssetFile::from_path(&path, spec.name, spec.content_type))
        .await
        .map_err(|e| HandlerError::InvalidRequest(format!("reading upload failed: {}", e)))??;

    let result = ctx.uploader.upload(file, &request.metadata).await?;
    Ok(into_payload(json!(result)))
}

#[cfg(test)]
mod tests {
    use crate::api::channels;
    use crate::relay::envelope::into_payload;
    use crate::services::testing::serve_once;
    use crate::settings::Endpoints;
    use crate::testing::{client_for, test_context_with, RecordingShell, ScriptedWallet};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn endpoints_at(base: &str) -> Endpoints {
        Endpoints {
            mintgarden_api: base.to_string(),
            mintgarden_testnet_api: base.to_string(),
            nft_storage_api: base.to_string(),
            nft_storage_gateway: "https://gw.example/ipfs".to_string(),
            nft_storage_token: Some("secret-token".to_string()),
            ..Endpoints::default()
        }
    }

    #[tokio::test]
    async fn test_nfts_for_did() {
        let body = json!({ "items": [{ "encoded_id": "nft1abc" }] }).to_string();
        let (base, request) = serve_once("200 OK", "application/json", body.into_bytes()).await;
        let dir = TempDir::new().unwrap();
        let client = client_for(test_context_with(
            &dir,
            ScriptedWallet::new(),
            endpoints_at(&base),
            Arc::new(RecordingShell::default()),
        ));

        let payload = into_payload(json!({ "did": "did:chia:1artist" }));
        let response = client.request(channels::GET_NFTS_FOR_DID, payload).await.unwrap();
        assert_eq!(response["nfts"], json!([{ "encoded_id": "nft1abc" }]));

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /profile/did:chia:1artist/nfts?type=created"));
    }

    #[tokio::test]
    async fn test_nfts_for_did_reports_status() {
        let (base, _request) = serve_once("500 Internal Server Error", "text/plain", Vec::new()).await;
        let dir = TempDir::new().unwrap();
        let client = client_for(test_context_with(
            &dir,
            ScriptedWallet::new(),
            endpoints_at(&base),
            Arc::new(RecordingShell::default()),
        ));

        let payload = into_payload(json!({ "did": "did:chia:1artist", "network": "mainnet" }));
        let err = client.request(channels::GET_NFTS_FOR_DID, payload).await.unwrap_err();
        assert_eq!(err.rejection().unwrap(), &json!("500: Internal Server Error"));
    }

    #[tokio::test]
    async fn test_fetch_license() {
        let (base, _request) = serve_once("200 OK", "text/plain", b"MIT License text".to_vec()).await;
        let dir = TempDir::new().unwrap();
        let client = client_for(test_context_with(
            &dir,
            ScriptedWallet::new(),
            Endpoints::default(),
            Arc::new(RecordingShell::default()),
        ));

        let payload = into_payload(json!({ "licenseUrl": format!("{}/LICENSE", base) }));
        let response = client.request(channels::FETCH_LICENSE, payload).await.unwrap();
        assert_eq!(
            response["licenseHash"],
            json!("92623c09445a40c4cf55e1f77e14e0af68d1212fae6b21c84d664555de80728d")
        );
    }

    #[tokio::test]
    async fn test_fetch_license_not_found() {
        let (base, _request) = serve_once("404 Not Found", "text/plain", Vec::new()).await;
        let dir = TempDir::new().unwrap();
        let client = client_for(test_context_with(
            &dir,
            ScriptedWallet::new(),
            Endpoints::default(),
            Arc::new(RecordingShell::default()),
        ));

        let payload = into_payload(json!({ "licenseUrl": format!("{}/LICENSE", base) }));
        let err = client.request(channels::FETCH_LICENSE, payload).await.unwrap_err();
        assert_eq!(err.rejection().unwrap(), &json!("404: Not Found"));
    }

    #[tokio::test]
    async fn test_upload_assets() {
        let reply = json!({ "ok": true, "value": { "cid": "bafyabc" } }).to_string();
        let (base, request) = serve_once("200 OK", "application/json", reply.into_bytes()).await;
        let dir = TempDir::new().unwrap();
        let art = dir.path().join("art.png");
        std::fs::write(&art, b"pixels").unwrap();

        let client = client_for(test_context_with(
            &dir,
            ScriptedWallet::new(),
            endpoints_at(&base),
            Arc::new(RecordingShell::default()),
        ));

        let payload = into_payload(json!({
            "file": { "path": art.to_string_lossy(), "type": "image/png" },
            "metadata": { "format": "CHIP-0007", "name": "Art" }
        }));
        let response = client.request(channels::UPLOAD_NFT_ASSETS, payload).await.unwrap();
        assert_eq!(response["dataUris"][0], json!("https://gw.example/ipfs/bafyabc/art.png"));
        assert_eq!(response["dataHash"].as_str().unwrap().len(), 64);

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /upload"));
        assert!(raw.to_lowercase().contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let dir = TempDir::new().unwrap();
        let client = client_for(test_context_with(
            &dir,
            ScriptedWallet::new(),
            endpoints_at("http://127.0.0.1:9"),
            Arc::new(RecordingShell::default()),
        ));

        let missing = dir.path().join("missing.png");
        let payload = into_payload(json!({ "file": { "path": missing.to_string_lossy() } }));
        let err = client.request(channels::UPLOAD_NFT_ASSETS, payload).await.unwrap_err();
        assert!(err.rejection().unwrap().as_str().unwrap().contains("missing.png"));
    }
}
