//! Tracing subscriber setup.
//!
//! Console output goes to stderr so JSON written to stdout stays clean. The
//! console level comes from `DOCVEC_LOG` when set, otherwise from
//! `logging.level`; `--debug` forces `debug`. An optional log file always
//! records this crate at debug level, without ANSI colors.

use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::config::LoggingConfig;
use crate::error::{IndexError, IndexResult};

/// Environment variable holding a full filter directive.
pub const LOG_ENV_VAR: &str = "DOCVEC_LOG";

/// Builds the console filter.
pub fn console_filter(config: &LoggingConfig, debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    match std::env::var(LOG_ENV_VAR) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::new(directive),
        _ => EnvFilter::new(&config.level),
    }
}

fn open_log_file(config: &LoggingConfig) -> IndexResult<Option<File>> {
    let Some(path) = &config.file else {
        return Ok(None);
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IndexError::ConfigError {
            reason: format!("cannot create log directory '{}': {e}", parent.display()),
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Some)
        .map_err(|e| IndexError::ConfigError {
            reason: format!("cannot open log file '{}': {e}", path.display()),
        })
}

/// Installs the global subscriber. Calling it twice is an error.
pub fn init(config: &LoggingConfig, debug: bool) -> IndexResult<()> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter(config, debug));

    let file_layer = open_log_file(config)?.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_filter(EnvFilter::new("docvec=debug"))
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| IndexError::General(format!("Failed to initialize logging: {e}")))
}
