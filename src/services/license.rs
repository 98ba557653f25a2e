//! License documents are referenced by URL and pinned on-chain by their SHA-256

use super::ServiceError;
use sha2::{Digest, Sha256};

/// Download `url` and return the lowercase hex SHA-256 of its body
pub async fn fetch_license_hash(http: &reqwest::Client, url: &str) -> Result<String, ServiceError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| ServiceError::Request(format!("Invalid license URL {}: {}", url, e)))?;

    let response = http
        .get(parsed)
        .send()
        .await
        .map_err(|e| ServiceError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ServiceError::from_status(response.status()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ServiceError::Request(e.to_string()))?;

    Ok(hex::encode(Sha256::digest(&body)))
}
