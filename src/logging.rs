/// Tracing setup.
///
/// The terminal belongs to the renderer, so log output goes to a file.
/// `RUST_LOG` overrides the configured level.

use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::GameConfig;

/// Install the global subscriber. Returns false (and logs nowhere) when the
/// log file cannot be created.
pub fn init(config: &GameConfig) -> bool {
    let file = match File::create(&config.log_file) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_ok()
}
