// src/logging.rs

//! `tracing` subscriber setup.
//!
//! Everything rerun logs goes to STDERR; STDOUT belongs to toolchain failure
//! output and to the supervised program.
//!
//! `--log-level` wins when given. Otherwise `RERUN_LOG` is read as an
//! `EnvFilter` directive string, so both `RERUN_LOG=debug` and
//! `RERUN_LOG=rerun::exec=trace,info` work. The fallback is `info`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "RERUN_LOG";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => filter_from_env(std::env::var(LOG_ENV_VAR).ok().as_deref()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}

fn filter_from_env(value: Option<&str>) -> EnvFilter {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
