//! Channels served from local state: the store and the window shell

use super::{parse, AppContext, HandlerError};
use crate::api::{DeleteCollectionRequest, OpenExternalRequest, OpenWinRequest, SetChiaRootRequest, DEFAULT_NETWORK};
use crate::relay::envelope::into_payload;
use crate::relay::Payload;
use crate::services::marketplace::nft_page_url;
use crate::settings::expand_path;
use crate::store::Collection;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct SaveCollectionRequest {
    collection: Collection,
}

pub async fn set_chia_root(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: SetChiaRootRequest = parse(payload)?;
    let root = expand_path(request.chia_root.trim());
    if root.is_empty() {
        return Err(HandlerError::InvalidRequest("chiaRoot must not be empty".to_string()));
    }

    ctx.store.lock().unwrap().set_chia_root(&root)?;
    log::info!("Chia root set to {}", root);
    Ok(Payload::new())
}

pub async fn get_chia_root(ctx: Arc<AppContext>, _payload: Payload) -> Result<Payload, HandlerError> {
    Ok(into_payload(json!({ "chiaRoot": ctx.chia_root() })))
}

pub async fn get_collections(ctx: Arc<AppContext>, _payload: Payload) -> Result<Payload, HandlerError> {
    let collections = ctx.store.lock().unwrap().collections();
    Ok(into_payload(json!({ "collections": collections })))
}

pub async fn save_collection(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: SaveCollectionRequest = parse(payload)?;
    let collection = request.collection;

    ctx.store.lock().unwrap().save_collection(collection.clone())?;
    log::info!("Saved collection {} ({})", collection.name, collection.id);
    Ok(into_payload(json!({ "collection": collection })))
}

pub async fn delete_collection(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: DeleteCollectionRequest = parse(payload)?;
    let deleted = ctx.store.lock().unwrap().remove_collection(&request.id)?;
    Ok(into_payload(json!({ "deleted": deleted })))
}

pub async fn open_win(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: OpenWinRequest = parse(payload)?;
    ctx.shell
        .open_window(&request.route)
        .map_err(HandlerError::Shell)?;
    Ok(Payload::new())
}

pub async fn open_external(ctx: Arc<AppContext>, payload: Payload) -> Result<Payload, HandlerError> {
    let request: OpenExternalRequest = parse(payload)?;
    let network = request.network.as_deref().unwrap_or(DEFAULT_NETWORK);
    let url = nft_page_url(&ctx.endpoints, network, request.encoded_id());

    if !url.starts_with("https://") {
        return Err(HandlerError::Shell(format!("Refusing to open non-https URL {}", url)));
    }

    ctx.shell.open_url(&url).map_err(HandlerError::Shell)?;
    Ok(into_payload(json!({ "url": url })))
}
