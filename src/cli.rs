// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::parse_duration;

/// Command-line arguments for `rerun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rerun",
    version,
    about = "Rebuild, test and restart a Go program whenever its sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Run the test suite after installing; failing tests prevent a restart.
    #[arg(long)]
    pub test: bool,

    /// Also produce a standalone binary in the working directory (advisory).
    #[arg(long)]
    pub build: bool,

    /// Validate only: run the pipeline but never start the program.
    #[arg(long)]
    pub no_run: bool,

    /// Pass the race detector flag to every toolchain invocation.
    #[arg(long)]
    pub race: bool,

    /// Read change events from a remote event socket instead of watching
    /// the local filesystem.
    #[arg(long, value_name = "HOST:PORT")]
    pub connect: Option<String>,

    /// Quiescence window before a burst of changes triggers a rebuild
    /// (e.g. `100ms`, `1s`). Overrides the config file.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// How long to wait after the interrupt signal before killing the
    /// program. Overrides the config file.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub grace_period: Option<Duration>,

    /// Path to an optional config file (TOML).
    ///
    /// Default: `Rerun.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RERUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve the entry module and watch set, print them, run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Import path of the program to supervise.
    #[arg(value_name = "IMPORT_PATH")]
    pub entry: String,

    /// Arguments forwarded verbatim to the program on every start.
    #[arg(
        value_name = "ARG",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub program_args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
