//! Structured logging setup.
//!
//! The terminal belongs to the UI while a test runs, so logs normally go to a file. Filtering
//! follows `RUST_LOG` (default `keypace=info`); `KEYPACE_LOG_FORMAT=json` switches to JSON lines.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const DEFAULT_FILTER: &str = "keypace=info";

fn json_requested() -> bool {
    std::env::var("KEYPACE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn make_writer(log_path: Option<&Path>) -> (BoxMakeWriter, bool) {
    if let Some(path) = log_path {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(path) {
            return (BoxMakeWriter::new(Mutex::new(file)), false);
        }
    }
    (BoxMakeWriter::new(std::io::stderr), true)
}

/// Install the global subscriber, appending to `log_path` when given and writable, stderr
/// otherwise. Later calls are no-ops.
pub fn init(log_path: Option<&Path>) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (writer, ansi) = make_writer(log_path);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_ids(false);

    if json_requested() {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
