//! Asset upload to nft.storage
//!
//! The data file and a `metadata.json` are stored together as one IPFS
//! directory. Both are hashed locally so the hashes can be committed on-chain.

use super::ServiceError;
use crate::settings::Endpoints;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;

pub const METADATA_FILE_NAME: &str = "metadata.json";

/// A file to upload
#[derive(Debug, Clone)]
pub struct AssetFile {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl AssetFile {
    /// Read a file from disk; the name defaults to the file name
    pub fn from_path(path: &Path, name: Option<String>, content_type: Option<String>) -> Result<Self, ServiceError> {
        let content = std::fs::read(path).map_err(|e| ServiceError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let name = name
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| "data".to_string());

        Ok(Self {
            name,
            content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
            content,
        })
    }
}

/// URIs and hashes of an uploaded asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub data_uris: Vec<String>,
    pub data_hash: String,
    pub metadata_uris: Vec<String>,
    pub metadata_hash: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    ok: bool,
    value: Option<UploadValue>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct UploadValue {
    cid: String,
}

#[derive(Debug, Clone)]
pub struct NftStorageUploader {
    http: reqwest::Client,
    api_url: String,
    gateway: String,
    token: Option<String>,
}

impl NftStorageUploader {
    pub fn new(http: reqwest::Client, endpoints: &Endpoints) -> Self {
        Self {
            http,
            api_url: endpoints.nft_storage_api.trim_end_matches('/').to_string(),
            gateway: endpoints.nft_storage_gateway.trim_end_matches('/').to_string(),
            token: endpoints.nft_storage_token.clone(),
        }
    }

    pub async fn upload(&self, file: AssetFile, metadata: &Value) -> Result<UploadResult, ServiceError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| ServiceError::Config("NFT_STORAGE_TOKEN is not set".to_string()))?;

        let data_hash = hex::encode(Sha256::digest(&file.content));
        let metadata_string = serde_json::to_string_pretty(metadata)
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        let metadata_hash = hex::encode(Sha256::digest(metadata_string.as_bytes()));

        let data_part = Part::bytes(file.content)
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ServiceError::Request(format!("Invalid content type: {}", e)))?;
        let metadata_part = Part::bytes(metadata_string.into_bytes())
            .file_name(METADATA_FILE_NAME)
            .mime_str("application/json")
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        let form = Form::new().part("file", data_part).part("file", metadata_part);

        let response = self
            .http
            .post(format!("{}/upload", self.api_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_status(response.status()));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Response(e.to_string()))?;
        let cid = match body {
            UploadResponse {
                ok: true,
                value: Some(value),
                ..
            } => value.cid,
            UploadResponse { error, .. } => {
                return Err(ServiceError::Response(format!(
                    "upload rejected: {}",
                    error.unwrap_or(Value::Null)
                )))
            }
        };

        log::info!("Uploaded {} to IPFS directory {}", file.name, cid);

        let data_name = encode_uri_component(&file.name);
        Ok(UploadResult {
            data_uris: vec![
                format!("{}/{}/{}", self.gateway, cid, data_name),
                format!("ipfs://{}/{}", cid, data_name),
            ],
            data_hash,
            metadata_uris: vec![
                format!("{}/{}/{}", self.gateway, cid, METADATA_FILE_NAME),
                format!("ipfs://{}/{}", cid, METADATA_FILE_NAME),
            ],
            metadata_hash,
        })
    }
}

/// `encodeURIComponent`: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_uri_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::http_client;
    use crate::services::testing::serve_once;
    use serde_json::json;

    fn asset() -> AssetFile {
        AssetFile {
            name: "my art.png".to_string(),
            content_type: "image/png".to_string(),
            content: b"MIT License text".to_vec(),
        }
    }

    #[test]
    fn test_uri_component_encoding() {
        assert_eq!(encode_uri_component("my art.png"), "my%20art.png");
        assert_eq!(encode_uri_component("a/b?c"), "a%2Fb%3Fc");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
        assert_eq!(encode_uri_component("(1)!~*'_-.x"), "(1)!~*'_-.x");
        assert_eq!(encode_uri_component("50%#&"), "50%25%23%26");
    }

    #[tokio::test]
    async fn test_upload_returns_gateway_and_ipfs_uris() {
        let body = json!({ "ok": true, "value": { "cid": "bafytest" } });
        let (base, request) = serve_once("200 OK", "application/json", body.to_string().into_bytes()).await;
        let endpoints = Endpoints {
            nft_storage_api: base,
            nft_storage_token: Some("secret".to_string()),
            ..Endpoints::default()
        };
        let uploader = NftStorageUploader::new(http_client().unwrap(), &endpoints);

        let metadata = json!({ "format": "CHIP-0007", "name": "Gem #1" });
        let result = uploader.upload(asset(), &metadata).await.unwrap();

        assert_eq!(
            result.data_uris,
            vec![
                "https://nftstorage.link/ipfs/bafytest/my%20art.png".to_string(),
                "ipfs://bafytest/my%20art.png".to_string(),
            ]
        );
        assert_eq!(result.metadata_uris[1], "ipfs://bafytest/metadata.json");
        assert_eq!(
            result.data_hash,
            "92623c09445a40c4cf55e1f77e14e0af68d1212fae6b21c84d664555de80728d"
        );
        let expected_metadata_hash =
            hex::encode(Sha256::digest(serde_json::to_string_pretty(&metadata).unwrap()));
        assert_eq!(result.metadata_hash, expected_metadata_hash);

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /upload "));
        assert!(request.to_lowercase().contains("authorization: bearer secret"));
        assert!(request.contains("filename=\"metadata.json\""));
    }

    #[tokio::test]
    async fn test_upload_requires_token() {
        let uploader = NftStorageUploader::new(http_client().unwrap(), &Endpoints::default());
        let err = uploader.upload(asset(), &json!({})).await.unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }
}
