//! Logging Infrastructure
//!
//! Structured logging for development (terminal) and production (JSON,
//! optional daily-rolling file).

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the logger with `info` to stdout
pub fn init_logger() -> Option<WorkerGuard> {
    init_logger_with_file(None, false, None)
}

/// Initialize the logger with optional JSON format and file output
///
/// `log_level` accepts an `EnvFilter` directive (`info`,
/// `floor_server=debug,tower_http=info`); `RUST_LOG` wins when set. The
/// returned guard flushes the file writer on drop, keep it alive in `main`.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: bool,
    log_dir: Option<&str>,
) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_dir = log_dir.map(Path::new).filter(|dir| {
        std::fs::create_dir_all(dir).is_ok()
    });

    match file_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "floor-server");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            let builder = builder.with_writer(writer).with_ansi(false);
            let _ = if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            Some(guard)
        }
        None => {
            let _ = if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            None
        }
    }
}
