//! Persisted key-value store
//!
//! A JSON object on disk holding the configured Chia root and the collection
//! registry. Missing keys fall back to defaults; schema migrations run once at
//! load time for every version between the recorded schema version and the
//! running application version.

use crate::relay::Payload;
use crate::settings::default_chia_root;
use crate::version::SemVer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub const CHIA_ROOT_KEY: &str = "CHIA_ROOT";
pub const COLLECTIONS_KEY: &str = "collections";
const INTERNAL_KEY: &str = "__internal__";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize store: {0}")]
    Serialize(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("invalid version: {0}")]
    InvalidVersion(String),
}

/// One schema migration, applied to the raw store contents
pub struct Migration {
    pub version: &'static str,
    pub description: &'static str,
    pub apply: fn(&mut Payload),
}

/// Migrations known to this build, oldest first
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        version: "0.1.6",
        description: "rename_collection_attribute_name_to_trait_type",
        apply: rename_attribute_name_to_trait_type,
    }]
}

fn rename_attribute_name_to_trait_type(data: &mut Payload) {
    let Some(Value::Object(collections)) = data.get_mut(COLLECTIONS_KEY) else {
        return;
    };

    for collection in collections.values_mut() {
        let Some(Value::Array(attributes)) = collection.get_mut("attributes") else {
            continue;
        };
        for attribute in attributes.iter_mut().filter_map(Value::as_object_mut) {
            if let Some(name) = attribute.remove("name") {
                attribute.entry("trait_type").or_insert(name);
            }
        }
    }
}

/// Default values for keys missing from disk
pub fn defaults() -> Payload {
    let mut defaults = Payload::new();
    defaults.insert(CHIA_ROOT_KEY.to_string(), Value::String(default_chia_root()));
    defaults.insert(COLLECTIONS_KEY.to_string(), json!({}));
    defaults
}

/// Attribute definition of a collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionAttribute {
    pub trait_type: String,
}

/// User-defined grouping of NFTs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_hash: Option<String>,
    #[serde(default)]
    pub attributes: Vec<CollectionAttribute>,
}

/// The store itself; every `set` is written through to disk (last write wins)
#[derive(Debug)]
pub struct AppStore {
    path: PathBuf,
    data: Payload,
}

/// Type alias for the store shared between handlers
pub type SharedStore = Arc<Mutex<AppStore>>;

impl AppStore {
    /// Open the store with this build's version, migrations and defaults
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with(
            path,
            env!("CARGO_PKG_VERSION"),
            &migrations(),
            defaults(),
        )
    }

    pub fn open_with(
        path: impl Into<PathBuf>,
        app_version: &str,
        migrations: &[Migration],
        defaults: Payload,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let current = SemVer::parse(app_version)
            .ok_or_else(|| StoreError::InvalidVersion(app_version.to_string()))?;

        let mut data = load_raw(&path);
        for (key, value) in defaults {
            data.entry(key).or_insert(value);
        }

        let mut store = Self { path, data };
        store.migrate(&current, migrations);
        store.save()?;
        Ok(store)
    }

    fn migrate(&mut self, current: &SemVer, migrations: &[Migration]) {
        let previous = self
            .schema_version()
            .and_then(|v| SemVer::parse(&v))
            .unwrap_or(SemVer {
                major: 0,
                minor: 0,
                patch: 0,
                prerelease: None,
            });

        let mut pending: Vec<(SemVer, &Migration)> = migrations
            .iter()
            .filter_map(|m| SemVer::parse(m.version).map(|v| (v, m)))
            .filter(|(v, _)| *v > previous && v <= current)
            .collect();
        pending.sort_by(|a, b| a.0.cmp(&b.0));

        for (version, migration) in pending {
            log::info!(
                "Running store migration {} ({})",
                version,
                migration.description
            );
            (migration.apply)(&mut self.data);
        }

        self.data.insert(
            INTERNAL_KEY.to_string(),
            json!({ "migrations": { "version": current.to_string() } }),
        );
    }

    /// Schema version recorded on disk
    pub fn schema_version(&self) -> Option<String> {
        self.data
            .get(INTERNAL_KEY)?
            .pointer("/migrations/version")?
            .as_str()
            .map(str::to_string)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.data.insert(key.to_string(), value);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(&self.data)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        fs::write(&self.path, contents).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Configured Chia root directory
    pub fn chia_root(&self) -> String {
        self.get(CHIA_ROOT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(default_chia_root)
    }

    pub fn set_chia_root(&mut self, root: &str) -> Result<(), StoreError> {
        self.set(CHIA_ROOT_KEY, Value::String(root.to_string()))
    }

    /// All collections keyed by id; malformed entries are skipped
    pub fn collections(&self) -> BTreeMap<String, Collection> {
        let Some(Value::Object(raw)) = self.get(COLLECTIONS_KEY) else {
            return BTreeMap::new();
        };

        raw.iter()
            .filter_map(|(id, value)| match serde_json::from_value(value.clone()) {
                Ok(collection) => Some((id.clone(), collection)),
                Err(e) => {
                    log::warn!("Skipping malformed collection {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Insert or replace a collection under its id
    pub fn save_collection(&mut self, collection: Collection) -> Result<(), StoreError> {
        if collection.id.trim().is_empty() {
            return Err(StoreError::InvalidValue {
                key: COLLECTIONS_KEY.to_string(),
                reason: "collection id must not be empty".to_string(),
            });
        }

        let value = serde_json::to_value(&collection)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        let mut collections = match self.data.remove(COLLECTIONS_KEY) {
            Some(Value::Object(map)) => map,
            _ => Payload::new(),
        };
        collections.insert(collection.id.clone(), value);
        self.set(COLLECTIONS_KEY, Value::Object(collections))
    }

    /// Remove a collection; returns whether it existed
    pub fn remove_collection(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut collections = match self.data.remove(COLLECTIONS_KEY) {
            Some(Value::Object(map)) => map,
            _ => Payload::new(),
        };
        let existed = collections.remove(id).is_some();
        self.set(COLLECTIONS_KEY, Value::Object(collections))?;
        Ok(existed)
    }
}

fn load_raw(path: &Path) -> Payload {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                log::warn!("Store at {} is invalid, starting fresh", path.display());
                Payload::new()
            }
        },
        Err(_) => Payload::new(),
    }
}

/// Open the store and wrap it for sharing
pub fn create_shared_store(path: impl Into<PathBuf>) -> Result<SharedStore, StoreError> {
    Ok(Arc::new(Mutex::new(AppStore::open(path)?)))
}
