//! MintGarden: read API for NFTs created by a DID, and public NFT pages

use super::ServiceError;
use crate::settings::Endpoints;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl MarketplaceClient {
    pub fn new(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    /// NFTs created by `did` on `network`
    pub async fn nfts_created_by(&self, did: &str, network: &str) -> Result<Vec<Value>, ServiceError> {
        let url = format!(
            "{}/profile/{}/nfts?type=created",
            self.endpoints.mintgarden_api_for(network).trim_end_matches('/'),
            did
        );
        log::debug!("Fetching NFTs for {} from {}", did, url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_status(response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Response(e.to_string()))?;

        Ok(body
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

/// Website link for an NFT (or the NFT index when no id is given)
pub fn nft_page_url(endpoints: &Endpoints, network: &str, encoded_id: Option<&str>) -> String {
    let base = endpoints.mintgarden_web_for(network).trim_end_matches('/');
    match encoded_id {
        Some(id) if !id.is_empty() => format!("{}/nfts/{}", base, id),
        _ => format!("{}/nfts", base),
    }
}
