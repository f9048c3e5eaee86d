//! FILENAME: app/src/logging.rs
// PURPOSE: Unified log line format for the dashboard backend.
// CONTEXT: Library crates log through the `log` facade with a category as the
//          target ("PIVOT", "EXPORT", ...). This module installs env_logger and
//          renders every record as `seq|L|CATEGORY|message`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use env_logger::{Builder, Target};
use log::{Level, LevelFilter};

/// Global sequence counter; gives a total order even across threads.
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Get next sequence number
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst) + 1
}

fn level_letter(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

/// Formats one log line in the unified format.
pub fn format_line(seq: u64, level: Level, category: &str, message: &str) -> String {
    format!("{}|{}|{}|{}", seq, level_letter(level), category, message)
}

/// Parses a textual level (`info`, `debug`, ...). Unknown values fall back to `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::Info)
}

/// Installs the global logger. `RUST_LOG` still refines per-target levels.
///
/// With `log_file` set, lines go to that file (truncated) instead of stderr.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<(), String> {
    let mut builder = Builder::new();
    builder.filter_level(parse_level(level));
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{}",
            format_line(next_seq(), record.level(), record.target(), &record.args().to_string())
        )
    });

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| format!("Failed to create log file {:?}: {}", path, e))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| format!("Logger already initialized: {}", e))
}
