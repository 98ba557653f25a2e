//! Main-side handlers for every relay channel
//!
//! Handlers are independent: each obtains what it needs from [`AppContext`],
//! performs its RPC/HTTP calls in sequence and returns the response payload.
//! Side effects already committed on the wallet node are not rolled back when a
//! later call in the same handler fails.

mod local;
mod media;
mod wallet;

use crate::api::channels;
use crate::coin::CoinError;
use crate::relay::{Dispatcher, Payload};
use crate::services::marketplace::MarketplaceClient;
use crate::services::nft_storage::NftStorageUploader;
use crate::services::{http_client, ServiceError};
use crate::settings::Endpoints;
use crate::store::{SharedStore, StoreError};
use crate::wallet::{WalletConnector, WalletError, WalletRpc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Coin(#[from] CoinError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Shell(String),
}

/// Window and OS integration available to handlers
pub trait Shell: Send + Sync {
    /// Open a child window showing `route`
    fn open_window(&self, route: &str) -> Result<(), String>;

    /// Open an `https:` URL in the system browser
    fn open_url(&self, url: &str) -> Result<(), String>;
}

/// Shell for runs without a window system
#[derive(Debug, Default)]
pub struct HeadlessShell;

impl Shell for HeadlessShell {
    fn open_window(&self, route: &str) -> Result<(), String> {
        Err(format!("Cannot open window '{}' without a desktop shell", route))
    }

    fn open_url(&self, url: &str) -> Result<(), String> {
        log::info!("Open in browser: {}", url);
        Ok(())
    }
}

/// Everything handlers share
pub struct AppContext {
    pub store: SharedStore,
    pub wallet: Arc<dyn WalletConnector>,
    pub endpoints: Endpoints,
    pub http: reqwest::Client,
    pub marketplace: MarketplaceClient,
    pub uploader: NftStorageUploader,
    pub shell: Arc<dyn Shell>,
}

impl AppContext {
    pub fn new(
        store: SharedStore,
        wallet: Arc<dyn WalletConnector>,
        endpoints: Endpoints,
        shell: Arc<dyn Shell>,
    ) -> Result<Self, ServiceError> {
        let http = http_client()?;
        Ok(Self {
            store,
            wallet,
            marketplace: MarketplaceClient::new(http.clone(), endpoints.clone()),
            uploader: NftStorageUploader::new(http.clone(), &endpoints),
            endpoints,
            http,
            shell,
        })
    }

    /// Chia root as currently persisted
    pub fn chia_root(&self) -> String {
        self.store.lock().unwrap().chia_root()
    }

    /// Fresh wallet RPC session for the persisted Chia root
    pub fn wallet_rpc(&self) -> Result<Box<dyn WalletRpc>, WalletError> {
        let root = PathBuf::from(self.chia_root());
        self.wallet.connect(&root)
    }
}

/// Deserialize a request payload into its typed form
pub(crate) fn parse<T: DeserializeOwned>(payload: Payload) -> Result<T, HandlerError> {
    serde_json::from_value(Value::Object(payload))
        .map_err(|e| HandlerError::InvalidRequest(e.to_string()))
}

/// Dispatcher with every channel of the application registered
pub fn build_dispatcher(context: Arc<AppContext>) -> Dispatcher<AppContext> {
    let mut dispatcher = Dispatcher::new(context);
    dispatcher
        .register(channels::CONNECT, wallet::connect)
        .register(channels::GET_SYNC_STATUS, wallet::get_sync_status)
        .register(channels::GET_PUBLIC_KEYS, wallet::get_public_keys)
        .register(channels::LOG_IN, wallet::log_in)
        .register(channels::GET_WALLET_BALANCE, wallet::get_wallet_balance)
        .register(channels::GET_DIDS, wallet::get_dids)
        .register(channels::MINT_NFT, wallet::mint_nft)
        .register(channels::GET_NFT_MINT_STATUS, wallet::get_nft_mint_status)
        .register(channels::GET_NFTS_FOR_DID, media::get_nfts_for_did)
        .register(channels::FETCH_LICENSE, media::fetch_license)
        .register(channels::UPLOAD_NFT_ASSETS, media::upload_nft_assets)
        .register(channels::SET_CHIA_ROOT, local::set_chia_root)
        .register(channels::GET_CHIA_ROOT, local::get_chia_root)
        .register(channels::GET_COLLECTIONS, local::get_collections)
        .register(channels::SAVE_COLLECTION, local::save_collection)
        .register(channels::DELETE_COLLECTION, local::delete_collection)
        .register(channels::OPEN_WIN, local::open_win)
        .register(channels::OPEN_EXTERNAL, local::open_external);
    dispatcher
}
