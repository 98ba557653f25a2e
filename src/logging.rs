//! Logging configuration for the minter
//!
//! Uses log4rs with appenders:
//! 1. ConsoleAppender - stderr output (stdout is left to command output)
//! 2. RollingFileAppender - log files with rotation
//! 3. TauriEventAppender - forwards warnings and errors of this crate to the
//!    frontend (desktop builds only)

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

/// Log file size before rotation
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated files kept
const MAX_LOG_FILES: u32 = 5;

/// Frontend event carrying forwarded log records
pub const LOG_EVENT: &str = "app:log";

/// Level name for records forwarded to the frontend, `None` when not forwarded
fn forwarded_level(target: &str, level: log::Level) -> Option<&'static str> {
    if !target.starts_with("chia_nft_minter") {
        return None;
    }

    match level {
        log::Level::Error => Some("error"),
        log::Level::Warn => Some("warn"),
        _ => None,
    }
}

#[cfg(feature = "desktop")]
mod events {
    use super::{forwarded_level, LOG_EVENT};
    use serde::Serialize;
    use std::sync::OnceLock;
    use tauri::{AppHandle, Emitter};

    static APP_HANDLE: OnceLock<AppHandle<tauri::Wry>> = OnceLock::new();

    /// Set the app handle for TauriEventAppender.
    /// Call this in Tauri's setup() after the app is initialized
    pub fn set_app_handle(handle: AppHandle<tauri::Wry>) {
        match APP_HANDLE.set(handle) {
            Ok(_) => log::debug!("App handle set for TauriEventAppender"),
            Err(_) => log::warn!("App handle already set"),
        }
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct LogEvent {
        level: &'static str,
        message: String,
    }

    #[derive(Debug)]
    pub struct TauriEventAppender;

    impl log4rs::append::Append for TauriEventAppender {
        fn append(&self, record: &log::Record) -> anyhow::Result<()> {
            let Some(level) = forwarded_level(record.target(), record.level()) else {
                return Ok(());
            };

            if let Some(handle) = APP_HANDLE.get() {
                let _ = handle.emit(
                    LOG_EVENT,
                    LogEvent {
                        level,
                        message: record.args().to_string(),
                    },
                );
            }

            Ok(())
        }

        fn flush(&self) {}
    }
}

#[cfg(feature = "desktop")]
pub use events::{set_app_handle, TauriEventAppender};

/// Build the log4rs configuration writing to `log_dir`
///
/// # Log File Configuration
/// - File: `{log_dir}/minter.1.log`
/// - Max size: 10 MB per file
/// - Max count: 5 files (rotation)
/// - Pattern: `{timestamp} [{level}] {target} - {message}`
pub fn build_config(log_dir: &Path, level: LevelFilter) -> Result<Config, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build();

    let log_file = log_dir.join("minter.1.log");
    let log_pattern = log_dir.join("minter.{}.log");

    let roller = FixedWindowRoller::builder()
        .base(1)
        .build(&log_pattern.to_string_lossy(), MAX_LOG_FILES)?;
    let trigger = SizeTrigger::new(MAX_LOG_SIZE);
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(log_file, Box::new(policy))?;

    let builder = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("logfile", Box::new(logfile)));
    let root = Root::builder().appender("console").appender("logfile");

    #[cfg(feature = "desktop")]
    let (builder, root) = (
        builder.appender(Appender::builder().build("tauri_events", Box::new(TauriEventAppender))),
        root.appender("tauri_events"),
    );

    Ok(builder.build(root.build(level))?)
}

/// Initialize log4rs with console and rolling file appenders
pub fn init_logger(log_dir: &Path) -> Result<log4rs::Handle, Box<dyn std::error::Error>> {
    let config = build_config(log_dir, LevelFilter::Info)?;
    Ok(log4rs::init_config(config)?)
}
