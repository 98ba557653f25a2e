//! Tauri shell: the main window and the bridge between the webview and the relay
//!
//! The webview calls `relay_send` with a channel and its payload; the request is
//! handled on its own task and the response is emitted as an event named after
//! the request's correlation id.

use crate::handlers::{build_dispatcher, AppContext, Shell};
use crate::logging;
use crate::relay::{Dispatcher, Payload, Request, Responder};
use crate::settings::{AppPaths, Endpoints};
use crate::store::create_shared_store;
use crate::wallet::TlsWalletConnector;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager, Runtime, State, Url, WebviewUrl, WebviewWindowBuilder};

const MAIN_WINDOW: &str = "main";
const WINDOW_TITLE: &str = "Chia NFT Minter";

type AppDispatcher = Arc<Dispatcher<AppContext>>;

/// Emits relay responses to the webview
struct EventResponder {
    app: AppHandle,
}

impl Responder for EventResponder {
    fn respond(&self, correlation_id: &str, payload: Payload) {
        if let Err(e) = self.app.emit(correlation_id, payload) {
            log::warn!("Failed to emit response {}: {}", correlation_id, e);
        }
    }
}

/// Window and browser integration backed by the running app
struct TauriShell {
    app: AppHandle,
}

impl Shell for TauriShell {
    fn open_window(&self, route: &str) -> Result<(), String> {
        let label = format!("child-{}", uuid::Uuid::new_v4().simple());
        let url = WebviewUrl::App(format!("index.html#{}", route).into());

        WebviewWindowBuilder::new(&self.app, label, url)
            .title(WINDOW_TITLE)
            .inner_size(1440.0, 1000.0)
            .on_navigation(allow_navigation)
            .build()
            .map(|_| ())
            .map_err(|e| format!("Failed to open window {}: {}", route, e))
    }

    fn open_url(&self, url: &str) -> Result<(), String> {
        tauri_plugin_opener::open_url(url, None::<&str>).map_err(|e| e.to_string())
    }
}

/// Keep app pages in the webview; send `https:` links to the system browser
fn allow_navigation(url: &Url) -> bool {
    let external = url.scheme() == "https" && url.host_str() != Some("tauri.localhost");
    if external {
        if let Err(e) = tauri_plugin_opener::open_url(url.as_str(), None::<&str>) {
            log::warn!("Failed to open {}: {}", url, e);
        }
        return false;
    }
    true
}

/// Bring the main window to the front; false when it does not exist (yet)
fn restore_main_window<R: Runtime>(app: &AppHandle<R>) -> bool {
    let Some(window) = app.get_webview_window(MAIN_WINDOW) else {
        return false;
    };

    if let Err(e) = window.unminimize().and_then(|_| window.show()).and_then(|_| window.set_focus()) {
        log::warn!("Failed to restore main window: {}", e);
    }
    true
}

/// Forward a request from the webview; returns the correlation id to listen on
#[tauri::command]
async fn relay_send(
    channel: String,
    request: Payload,
    app: AppHandle,
    dispatcher: State<'_, AppDispatcher>,
) -> Result<String, String> {
    let request = Request::from_wire(channel, request);
    let correlation_id = request.correlation_id.clone();

    dispatcher.spawn(request, Arc::new(EventResponder { app }));
    Ok(correlation_id)
}

/// Channels the backend answers
#[tauri::command]
fn list_channels(dispatcher: State<'_, AppDispatcher>) -> Vec<String> {
    dispatcher.channels().into_iter().map(str::to_string).collect()
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let paths = AppPaths::resolve();
    if let Err(e) = logging::init_logger(&paths.log_dir) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    log::info!("Starting {} v{}", WINDOW_TITLE, env!("CARGO_PKG_VERSION"));

    tauri::Builder::default()
        // Must be registered first; a second launch only focuses this instance
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            log::info!("Second instance started, focusing the running one");
            restore_main_window(app);
        }))
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            logging::set_app_handle(app.handle().clone());

            let store = create_shared_store(paths.store_file())?;
            let shell = Arc::new(TauriShell {
                app: app.handle().clone(),
            });
            let context = AppContext::new(
                store,
                Arc::new(TlsWalletConnector),
                Endpoints::from_env(),
                shell,
            )?;
            let dispatcher: AppDispatcher = Arc::new(build_dispatcher(Arc::new(context)));
            app.manage(dispatcher);

            WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::App("index.html".into()))
                .title(WINDOW_TITLE)
                .inner_size(1440.0, 1000.0)
                .on_navigation(allow_navigation)
                .build()?;

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![relay_send, list_channels])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
