//! Wallet RPC client
//!
//! A client is built for every request from the currently configured Chia root,
//! so a changed root or regenerated certificates take effect immediately.

use super::chia_config::{ChiaConfig, WalletConnectionInfo};
use super::WalletError;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One wallet RPC session
pub trait WalletRpc: Send + Sync {
    /// Call `method` with a JSON object of parameters
    fn call<'a>(&'a self, method: &'a str, params: Value) -> BoxFuture<'a, Result<Value, WalletError>>;
}

/// Builds wallet RPC sessions for a Chia root
pub trait WalletConnector: Send + Sync {
    fn connect(&self, chia_root: &Path) -> Result<Box<dyn WalletRpc>, WalletError>;
}

/// Connector for a real wallet node (HTTPS + client certificate)
#[derive(Debug, Default, Clone, Copy)]
pub struct TlsWalletConnector;

impl WalletConnector for TlsWalletConnector {
    fn connect(&self, chia_root: &Path) -> Result<Box<dyn WalletRpc>, WalletError> {
        let config = ChiaConfig::load(chia_root)?;
        let info = config.wallet_connection(chia_root);
        Ok(Box::new(TlsWalletClient::new(&info)?))
    }
}

/// HTTPS client authenticated with the node's daemon certificate
pub struct TlsWalletClient {
    base_url: String,
    http: reqwest::Client,
}

impl TlsWalletClient {
    /// Read certificates from disk and build the client.
    ///
    /// Fails with [`WalletError::CertificateNotFound`] before any network
    /// activity if a certificate or key file is missing.
    pub fn new(info: &WalletConnectionInfo) -> Result<Self, WalletError> {
        let client_cert = read_cert_or_key(&info.client_cert)?;
        let client_key = read_cert_or_key(&info.client_key)?;
        let ca_cert = read_cert_or_key(&info.ca_cert)?;

        let mut identity_pem = client_cert;
        identity_pem.push(b'\n');
        identity_pem.extend_from_slice(&client_key);

        let identity = reqwest::Identity::from_pem(&identity_pem)
            .map_err(|e| WalletError::Tls(format!("client identity: {}", e)))?;
        let ca = reqwest::Certificate::from_pem(&ca_cert)
            .map_err(|e| WalletError::Tls(format!("CA certificate: {}", e)))?;

        // The node's certificates are issued by its private CA for a fixed
        // hostname, not for the address we connect to
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .add_root_certificate(ca)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| WalletError::Tls(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: info.base_url(),
            http,
        })
    }
}

impl WalletRpc for TlsWalletClient {
    fn call<'a>(&'a self, method: &'a str, params: Value) -> BoxFuture<'a, Result<Value, WalletError>> {
        async move {
            let url = format!("{}/{}", self.base_url, method);
            log::debug!("wallet rpc: {}", method);

            let response = self
                .http
                .post(&url)
                .json(&params)
                .send()
                .await
                .map_err(|e| WalletError::Request(format!("{}: {}", method, e)))?;

            let body: Value = response
                .json()
                .await
                .map_err(|e| WalletError::Request(format!("Failed to parse {} response: {}", method, e)))?;

            check_response(method, body)
        }
        .boxed()
    }
}

/// Turn a `{"success": false, "error": ...}` body into an error
pub fn check_response(method: &str, body: Value) -> Result<Value, WalletError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = match body.get("error") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown error".to_string(),
        };
        return Err(WalletError::Rpc {
            method: method.to_string(),
            message,
        });
    }
    Ok(body)
}

fn read_cert_or_key(path: &Path) -> Result<Vec<u8>, WalletError> {
    if !path.exists() {
        return Err(WalletError::CertificateNotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))
}
