// src/errors.rs

//! Crate-wide error type and `Result` alias.
//!
//! Startup errors (`Resolution` of the entry module, `NotExecutable`,
//! `ConfigError`) and `Protocol` errors are fatal. `StageFailure` and
//! `Process` are absorbed by the orchestration loop and only logged.

use thiserror::Error;

use crate::exec::{FailureKind, Stage};

#[derive(Error, Debug)]
pub enum RerunError {
    #[error("cannot resolve module {path}: {reason}")]
    Resolution { path: String, reason: String },

    #[error("{path}: expected package {expected:?}, got {actual:?}")]
    NotExecutable {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{stage} stage failed ({kind})")]
    StageFailure { stage: Stage, kind: FailureKind },

    #[error("process error: {0}")]
    Process(String),

    #[error("remote protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RerunError {
    pub fn resolution(path: impl Into<String>, reason: impl Into<String>) -> Self {
        RerunError::Resolution {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that must terminate the program.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RerunError::StageFailure { .. } | RerunError::Process(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RerunError>;
