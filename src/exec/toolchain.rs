// src/exec/toolchain.rs

//! Toolchain abstraction.
//!
//! The build pipeline talks to a [`Toolchain`] instead of spawning processes
//! itself. Production code uses [`GoToolchain`]; tests can provide their
//! own implementation that returns scripted results.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{RerunError, Result};
use crate::exec::capture::combined_output;

/// One discrete toolchain invocation within the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Compile and install the entry module and its dependencies.
    Install,
    /// Run the entry module's test suite.
    Test,
    /// Produce a standalone binary in the working directory.
    Package,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Install => "install",
            Stage::Test => "test",
            Stage::Package => "package",
        })
    }
}

/// Why a stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The toolchain ran and reported failure (compile errors, failing tests).
    Compile,
    /// The toolchain itself could not be run.
    Toolchain,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Compile => "compile error",
            FailureKind::Toolchain => "toolchain error",
        })
    }
}

/// Flags passed identically to every stage invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFlags {
    /// Enable the race detector.
    pub race: bool,
}

/// Outcome of one stage: combined stdout+stderr and a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    pub success: bool,
    pub output: String,
    pub failure: Option<FailureKind>,
}

impl StageResult {
    pub fn passed(stage: Stage, output: impl Into<String>) -> Self {
        Self {
            stage,
            success: true,
            output: output.into(),
            failure: None,
        }
    }

    pub fn failed(stage: Stage, kind: FailureKind, output: impl Into<String>) -> Self {
        Self {
            stage,
            success: false,
            output: output.into(),
            failure: Some(kind),
        }
    }

    /// `Err(StageFailure)` when the stage did not succeed.
    pub fn check(&self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(RerunError::StageFailure {
            stage: self.stage,
            kind: self.failure.unwrap_or(FailureKind::Compile),
        })
    }
}

/// Trait abstracting how pipeline stages are executed.
pub trait Toolchain: Send + Sync {
    /// Run one stage to completion against `module`.
    fn run_stage(
        &self,
        stage: Stage,
        module: &str,
        flags: StageFlags,
    ) -> Pin<Box<dyn Future<Output = StageResult> + Send + '_>>;
}

/// The `go` command.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    go: String,
    workdir: Option<PathBuf>,
}

impl GoToolchain {
    pub fn new(go: impl Into<String>, workdir: Option<PathBuf>) -> Self {
        Self {
            go: go.into(),
            workdir,
        }
    }

    /// Arguments for one stage, without the program name.
    pub fn args(stage: Stage, module: &str, flags: StageFlags) -> Vec<String> {
        let mut args = vec![
            match stage {
                Stage::Install => "install",
                Stage::Test => "test",
                Stage::Package => "build",
            }
            .to_string(),
        ];
        if flags.race {
            args.push("-race".to_string());
        }
        if stage != Stage::Install {
            args.push("-v".to_string());
        }
        args.push(module.to_string());
        args
    }
}

impl Toolchain for GoToolchain {
    fn run_stage(
        &self,
        stage: Stage,
        module: &str,
        flags: StageFlags,
    ) -> Pin<Box<dyn Future<Output = StageResult> + Send + '_>> {
        let args = Self::args(stage, module, flags);

        Box::pin(async move {
            debug!(%stage, go = %self.go, ?args, "running toolchain");

            let mut cmd = Command::new(&self.go);
            cmd.args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(dir) = &self.workdir {
                cmd.current_dir(dir);
            }

            let child = match cmd.spawn() {
                Ok(child) => child,
                Err(e) => {
                    return StageResult::failed(
                        stage,
                        FailureKind::Toolchain,
                        format!("running {}: {e}\n", self.go),
                    );
                }
            };

            match combined_output(child).await {
                Ok((status, output)) if status.success() => StageResult::passed(stage, output),
                Ok((_, output)) => StageResult::failed(stage, FailureKind::Compile, output),
                Err(e) => StageResult::failed(
                    stage,
                    FailureKind::Toolchain,
                    format!("waiting for {}: {e}\n", self.go),
                ),
            }
        })
    }
}
