//! Headless minter client
//!
//! Runs the same channel handlers as the desktop app, wired through the
//! in-process relay, and prints each response as JSON.
//!
//! ```text
//! minter-cli channels
//! minter-cli status
//! minter-cli call get_dids
//! minter-cli call fetch_license '{"licenseUrl": "https://example.com/LICENSE"}'
//! ```

use anyhow::{anyhow, Context};
use chia_nft_minter_lib::client::MinterClient;
use chia_nft_minter_lib::handlers::{build_dispatcher, AppContext, HeadlessShell};
use chia_nft_minter_lib::logging;
use chia_nft_minter_lib::relay::envelope::into_payload;
use chia_nft_minter_lib::relay::{LocalBus, Payload, RelayClient};
use chia_nft_minter_lib::settings::{AppPaths, Endpoints};
use chia_nft_minter_lib::store::create_shared_store;
use chia_nft_minter_lib::wallet::TlsWalletConnector;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "minter-cli", version, about = "Drive the NFT minter without a window")]
struct Args {
    /// Store file to use instead of the one in the platform config dir
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the channels the backend answers
    Channels,

    /// Wallet connection, keys and sync status
    Status,

    /// Send one request and print its response
    Call {
        channel: String,

        /// JSON object payload
        #[arg(default_value = "{}")]
        payload: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let paths = AppPaths::resolve();
    logging::init_logger(&paths.log_dir).map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    let store_file = args.store.unwrap_or_else(|| paths.store_file());
    let store = create_shared_store(&store_file)
        .with_context(|| format!("opening store {}", store_file.display()))?;
    let context = AppContext::new(
        store,
        Arc::new(TlsWalletConnector),
        Endpoints::from_env(),
        Arc::new(HeadlessShell),
    )?;
    let dispatcher = Arc::new(build_dispatcher(Arc::new(context)));

    match args.command {
        Command::Channels => {
            for channel in dispatcher.channels() {
                println!("{}", channel);
            }
        }
        Command::Status => {
            let client = MinterClient::new(RelayClient::new(LocalBus::spawn_with(dispatcher)));
            client.connect().await?;
            let fingerprints = client.load_public_keys().await?;
            client.refresh_sync_status().await?;
            let state = client.state();
            print_json(&json!({
                "fingerprints": fingerprints,
                "state": state,
                "testnet": state.is_testnet(),
            }))?;
        }
        Command::Call { channel, payload } => {
            if !dispatcher.has_channel(&channel) {
                return Err(anyhow!("unknown channel '{}' (see `minter-cli channels`)", channel));
            }
            let payload = parse_payload(&payload)?;
            let relay = RelayClient::new(LocalBus::spawn_with(dispatcher));
            let response = relay.request(&channel, payload).await?;
            print_json(&Value::Object(response))?;
        }
    }

    Ok(())
}

fn parse_payload(raw: &str) -> anyhow::Result<Payload> {
    let value: Value = serde_json::from_str(raw).context("payload is not valid JSON")?;
    if !value.is_object() {
        return Err(anyhow!("payload must be a JSON object"));
    }
    Ok(into_payload(value))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
