//! Test doubles shared by handler and client tests

use crate::handlers::{build_dispatcher, AppContext, Shell};
use crate::relay::{LocalBus, RelayClient};
use crate::settings::Endpoints;
use crate::store::AppStore;
use crate::wallet::{WalletConnector, WalletError, WalletRpc};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct Script {
    replies: HashMap<String, VecDeque<Result<Value, String>>>,
    calls: Vec<(String, Value)>,
    missing_certificates: bool,
}

/// Wallet node answering from a script; the last reply for a method repeats
#[derive(Default)]
pub struct ScriptedWallet {
    script: Arc<Mutex<Script>>,
}

impl ScriptedWallet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &str, reply: Value) {
        self.on_sequence(method, vec![reply]);
    }

    pub fn on_sequence(&self, method: &str, replies: Vec<Value>) {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(method.to_string(), replies.into_iter().map(Ok).collect());
    }

    pub fn fail(&self, method: &str, message: &str) {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(method.to_string(), VecDeque::from([Err(message.to_string())]));
    }

    pub fn set_missing_certificates(&self, missing: bool) {
        self.script.lock().unwrap().missing_certificates = missing;
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.script.lock().unwrap().calls.clone()
    }
}

impl WalletConnector for ScriptedWallet {
    fn connect(&self, chia_root: &Path) -> Result<Box<dyn WalletRpc>, WalletError> {
        if self.script.lock().unwrap().missing_certificates {
            return Err(WalletError::CertificateNotFound(
                chia_root.join("config/ssl/daemon/private_daemon.crt"),
            ));
        }
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
        }))
    }
}

struct ScriptedSession {
    script: Arc<Mutex<Script>>,
}

impl WalletRpc for ScriptedSession {
    fn call<'a>(&'a self, method: &'a str, params: Value) -> BoxFuture<'a, Result<Value, WalletError>> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            script.calls.push((method.to_string(), params));
            match script.replies.get_mut(method) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        async move {
            match reply {
                Some(Ok(value)) => Ok(value),
                Some(Err(message)) => Err(WalletError::Rpc {
                    method: method.to_string(),
                    message,
                }),
                None => Err(WalletError::Rpc {
                    method: method.to_string(),
                    message: "no scripted reply".to_string(),
                }),
            }
        }
        .boxed()
    }
}

/// Shell that records what it was asked to open
#[derive(Default)]
pub struct RecordingShell {
    pub windows: Mutex<Vec<String>>,
    pub urls: Mutex<Vec<String>>,
}

impl Shell for RecordingShell {
    fn open_window(&self, route: &str) -> Result<(), String> {
        self.windows.lock().unwrap().push(route.to_string());
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), String> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Context over a fresh store in `dir` with default endpoints
pub fn test_context(dir: &TempDir, wallet: Arc<ScriptedWallet>) -> Arc<AppContext> {
    test_context_with(dir, wallet, Endpoints::default(), Arc::new(RecordingShell::default()))
}

pub fn test_context_with(
    dir: &TempDir,
    wallet: Arc<ScriptedWallet>,
    endpoints: Endpoints,
    shell: Arc<dyn Shell>,
) -> Arc<AppContext> {
    let store_path: PathBuf = dir.path().join("config.json");
    let mut store = AppStore::open(store_path).unwrap();
    store
        .set_chia_root(&dir.path().join("chia").to_string_lossy())
        .unwrap();

    let context = AppContext::new(Arc::new(Mutex::new(store)), wallet, endpoints, shell).unwrap();
    Arc::new(context)
}

/// Relay client wired to a dispatcher over `context`
pub fn client_for(context: Arc<AppContext>) -> RelayClient {
    let dispatcher = Arc::new(build_dispatcher(context));
    RelayClient::new(LocalBus::spawn_with(dispatcher))
}

/// Relay client over a fresh test context; keep the directory alive for the test
pub fn context_client(wallet: Arc<ScriptedWallet>) -> (RelayClient, TempDir) {
    let dir = TempDir::new().unwrap();
    let client = client_for(test_context(&dir, wallet));
    (client, dir)
}
