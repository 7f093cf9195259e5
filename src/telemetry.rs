//! Structured trace log and crash log, both opt-in via `--logs`.
//!
//! Status output owns stdout, so diagnostics go to files under the temp dir.

use crate::config::AppConfig;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::fmt::time::UtcTime;

const CRASH_LOG_MAX_BYTES: u64 = 256 * 1024;

static TRACING_INIT: OnceLock<()> = OnceLock::new();
static CRASH_LOG_ENABLED: AtomicBool = AtomicBool::new(false);

/// JSON-lines trace file; `VOXPTT_TRACE_LOG` overrides the location.
pub fn tracing_log_path() -> PathBuf {
    env::var("VOXPTT_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("voxptt_trace.jsonl"))
}

pub fn crash_log_path() -> PathBuf {
    env::temp_dir().join("voxptt_crash.log")
}

pub fn logging_enabled(config: &AppConfig) -> bool {
    config.logs && !config.no_logs
}

/// Install the global JSON subscriber and arm the crash log.
pub fn init_tracing(config: &AppConfig) {
    let enabled = logging_enabled(config);
    CRASH_LOG_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let path = tracing_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Chain a hook that records panics before the default hook runs.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        previous(info);
    }));
}

/// Append one line describing the panic to the crash log.
pub fn log_panic(info: &panic::PanicHookInfo<'_>) {
    if !CRASH_LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());
    let payload = if let Some(text) = info.payload().downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = info.payload().downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    };
    write_crash_line(&format_crash_line(&location, &payload));
}

fn format_crash_line(location: &str, payload: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("[{timestamp}] panic at {location}: {payload}\n")
}

fn write_crash_line(line: &str) {
    let path = crash_log_path();
    if fs::metadata(&path).map(|m| m.len()).unwrap_or(0) > CRASH_LOG_MAX_BYTES {
        let _ = fs::remove_file(&path);
    }
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = file.write_all(line.as_bytes());
    }
}
