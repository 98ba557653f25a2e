//! Application paths and external service endpoints
//!
//! Endpoints default to the public MintGarden and nft.storage services and can be
//! redirected through environment variables (useful for staging and tests).

use std::path::PathBuf;

/// Directory name used under the platform config dir
pub const APP_DIR_NAME: &str = "Chia-NFT-Minter";

/// Name of the persisted key-value store file
pub const STORE_FILE_NAME: &str = "config.json";

/// Where the application keeps its files
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    /// Resolve the platform default locations
    pub fn resolve() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        let log_dir = config_dir.join("logs");
        Self {
            config_dir,
            log_dir,
        }
    }

    /// Path to the persisted store
    pub fn store_file(&self) -> PathBuf {
        self.config_dir.join(STORE_FILE_NAME)
    }
}

/// Base URLs and credentials of the hosted services
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub mintgarden_api: String,
    pub mintgarden_testnet_api: String,
    pub mintgarden_web: String,
    pub mintgarden_testnet_web: String,
    pub nft_storage_api: String,
    pub nft_storage_gateway: String,
    pub nft_storage_token: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            mintgarden_api: "https://api.mintgarden.io".to_string(),
            mintgarden_testnet_api: "https://api.testnet.mintgarden.io".to_string(),
            mintgarden_web: "https://mintgarden.io".to_string(),
            mintgarden_testnet_web: "https://testnet.mintgarden.io".to_string(),
            nft_storage_api: "https://api.nft.storage".to_string(),
            nft_storage_gateway: "https://nftstorage.link/ipfs".to_string(),
            nft_storage_token: None,
        }
    }
}

impl Endpoints {
    /// Defaults overlaid with environment overrides
    pub fn from_env() -> Self {
        let mut endpoints = Self::default();

        if let Some(url) = env_non_empty("MINTGARDEN_API_URL") {
            endpoints.mintgarden_api = url;
        }
        if let Some(url) = env_non_empty("MINTGARDEN_TESTNET_API_URL") {
            endpoints.mintgarden_testnet_api = url;
        }
        if let Some(url) = env_non_empty("NFT_STORAGE_API_URL") {
            endpoints.nft_storage_api = url;
        }
        endpoints.nft_storage_token = env_non_empty("NFT_STORAGE_TOKEN");

        endpoints
    }

    /// MintGarden API base for a network name (anything but mainnet is testnet)
    pub fn mintgarden_api_for(&self, network: &str) -> &str {
        if network == "mainnet" {
            &self.mintgarden_api
        } else {
            &self.mintgarden_testnet_api
        }
    }

    /// MintGarden website base for a network name
    pub fn mintgarden_web_for(&self, network: &str) -> &str {
        if network == "mainnet" {
            &self.mintgarden_web
        } else {
            &self.mintgarden_testnet_web
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Expand `~` to the home directory
pub fn expand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().to_string();
        }
    }

    path.to_string()
}

/// Default Chia root: `$CHIA_ROOT`, else `~/.chia/mainnet`
pub fn default_chia_root() -> String {
    match env_non_empty("CHIA_ROOT") {
        Some(root) => expand_path(&root),
        None => expand_path("~/.chia/mainnet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_selects_endpoint() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.mintgarden_api_for("mainnet"),
            "https://api.mintgarden.io"
        );
        assert_eq!(
            endpoints.mintgarden_api_for("testnet10"),
            "https://api.testnet.mintgarden.io"
        );
        assert_eq!(
            endpoints.mintgarden_web_for("testnet10"),
            "https://testnet.mintgarden.io"
        );
    }

    #[test]
    fn test_expand_path_leaves_absolute_paths() {
        assert_eq!(expand_path("/opt/chia"), "/opt/chia");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_path("~/.chia/mainnet"),
                home.join(".chia/mainnet").to_string_lossy()
            );
        }
    }

    #[test]
    fn test_store_file_lives_in_config_dir() {
        let paths = AppPaths {
            config_dir: PathBuf::from("/tmp/minter"),
            log_dir: PathBuf::from("/tmp/minter/logs"),
        };
        assert_eq!(paths.store_file(), PathBuf::from("/tmp/minter/config.json"));
    }
}
