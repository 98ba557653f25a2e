//! Hosted services: MintGarden (read API and website), nft.storage, license documents

pub mod license;
pub mod marketplace;
pub mod nft_storage;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Non-success status, rendered as `"<status>: <statusText>"`
    #[error("{status}: {status_text}")]
    Status { status: u16, status_text: String },

    #[error("{0}")]
    Request(String),

    #[error("unexpected response: {0}")]
    Response(String),

    #[error("{0}")]
    Config(String),

    #[error("failed to read {path}: {reason}")]
    File { path: String, reason: String },
}

impl ServiceError {
    /// Map a non-success response to [`ServiceError::Status`]
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        ServiceError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

/// Shared HTTP client for the hosted services
pub fn http_client() -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .user_agent(concat!("Chia-NFT-Minter/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ServiceError::Request(format!("Failed to create HTTP client: {}", e)))
}
