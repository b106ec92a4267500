//! Logging Infrastructure
//!
//! tracing-subscriber setup: `RUST_LOG`-driven filtering with an optional
//! daily-rotated log file for long-running deployments.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger from `RUST_LOG` (default `info`).
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger, writing to a daily-rotated file under `log_dir`
/// instead of stdout when the directory exists.
pub fn init_logger_with_file(default_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.unwrap_or("info")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "market-server");
            subscriber.with_writer(file_appender).init();
            return;
        }
    }

    subscriber.init();
}
