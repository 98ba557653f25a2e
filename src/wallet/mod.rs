//! Wallet node access
//!
//! The wallet node speaks JSON over HTTPS with mutual TLS. Connection details
//! (hostname, port, certificate paths) come from `<chia root>/config/config.yaml`.

pub mod chia_config;
pub mod rpc;

use std::path::PathBuf;
use thiserror::Error;

pub use chia_config::{ChiaConfig, WalletConnectionInfo};
pub use rpc::{TlsWalletConnector, WalletConnector, WalletRpc};

/// Wallet type id of DID wallets
pub const DID_WALLET_TYPE: u8 = 8;

/// Id of the standard XCH wallet
pub const STANDARD_WALLET_ID: u32 = 1;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("failed to read Chia config: {0}")]
    Config(String),

    #[error("crt/key Not Found at {}", .0.display())]
    CertificateNotFound(PathBuf),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("wallet request failed: {0}")]
    Request(String),

    #[error("wallet RPC {method} failed: {message}")]
    Rpc { method: String, message: String },
}
