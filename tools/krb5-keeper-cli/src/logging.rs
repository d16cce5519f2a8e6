use std::fs::OpenOptions;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const KRB5_KEEPER_LOG_PATH_ENV: &str = "KRB5_KEEPER_LOG_PATH";
const KRB5_KEEPER_LOG_LEVEL_ENV: &str = "KRB5_KEEPER_LOG_LEVEL";

/// Logs to the file named by `KRB5_KEEPER_LOG_PATH`, or to stderr when it is not set.
///
/// Function runtimes collect stderr, so the fallback is the usual case there.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(KRB5_KEEPER_LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let path = match std::env::var(KRB5_KEEPER_LOG_PATH_ENV) {
        Ok(path) => path,
        Err(_) => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
            return;
        }
    };

    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[KRB5-KEEPER] Couldn't open log file: {e}. File path: {}", path);
            return;
        }
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_thread_names(true)
        .with_writer(file);

    tracing_subscriber::registry().with(fmt_layer).with(filter).init();
}
