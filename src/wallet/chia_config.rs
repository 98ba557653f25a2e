//! Reading wallet connection details from the node's `config.yaml`

use super::WalletError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

fn default_self_hostname() -> String {
    "localhost".to_string()
}

fn default_wallet_rpc_port() -> u16 {
    9256
}

#[derive(Debug, Clone, Deserialize)]
struct WalletSection {
    #[serde(default = "default_wallet_rpc_port")]
    rpc_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct DaemonSsl {
    private_crt: String,
    private_key: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PrivateSslCa {
    crt: String,
}

/// The parts of the node configuration this application needs
#[derive(Debug, Clone, Deserialize)]
pub struct ChiaConfig {
    #[serde(default = "default_self_hostname")]
    self_hostname: String,
    wallet: WalletSection,
    daemon_ssl: DaemonSsl,
    private_ssl_ca: PrivateSslCa,
}

/// Everything needed to open a wallet RPC connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnectionInfo {
    pub hostname: String,
    pub port: u16,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
    pub ca_cert: PathBuf,
}

impl WalletConnectionInfo {
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.hostname, self.port)
    }
}

impl ChiaConfig {
    /// Path of the configuration file under a Chia root
    pub fn path_for(chia_root: &Path) -> PathBuf {
        chia_root.join("config").join("config.yaml")
    }

    pub fn parse(contents: &str) -> Result<Self, WalletError> {
        serde_yaml::from_str(contents).map_err(|e| WalletError::Config(e.to_string()))
    }

    pub fn load(chia_root: &Path) -> Result<Self, WalletError> {
        let path = Self::path_for(chia_root);
        let contents = fs::read_to_string(&path)
            .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&contents)
    }

    /// Wallet endpoint and certificate paths; relative paths resolve against the root
    pub fn wallet_connection(&self, chia_root: &Path) -> WalletConnectionInfo {
        WalletConnectionInfo {
            hostname: self.self_hostname.clone(),
            port: self.wallet.rpc_port,
            client_cert: chia_root.join(&self.daemon_ssl.private_crt),
            client_key: chia_root.join(&self.daemon_ssl.private_key),
            ca_cert: chia_root.join(&self.private_ssl_ca.crt),
        }
    }
}
