// src/exec/pipeline.rs

//! Build pipeline: install, optional test, optional package.
//!
//! Stages run strictly in sequence and short-circuit:
//! - install failure halts the cycle; its output is printed only when it
//!   differs from the previous cycle's failure output
//! - test failure (when enabled) halts the cycle
//! - package failure (when enabled) is reported but does not gate the
//!   restart

use std::io::Write;

use tracing::{debug, info, warn};

use crate::exec::toolchain::{Stage, StageFlags, StageResult, Toolchain};

/// Which optional stages run, and the flags passed to every stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub test: bool,
    pub package: bool,
    pub flags: StageFlags,
}

/// What one pipeline cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Stages in the order they ran, with their success flag.
    pub stages: Vec<(Stage, bool)>,
    pub installed: bool,
    /// Whether the supervised program should be restarted.
    pub restart: bool,
    /// Whether install failure output was printed this cycle.
    pub printed_error: bool,
}

impl PipelineReport {
    pub fn ran(&self, stage: Stage) -> bool {
        self.stages.iter().any(|(s, _)| *s == stage)
    }

    pub fn passed(&self, stage: Stage) -> Option<bool> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, ok)| *ok)
    }

    fn record(&mut self, result: &StageResult) {
        self.stages.push((result.stage, result.success));
    }
}

/// Runs the stage sequence and remembers the last install failure output.
#[derive(Debug)]
pub struct BuildPipeline<T: Toolchain> {
    toolchain: T,
    options: PipelineOptions,
    last_error: String,
}

impl<T: Toolchain> BuildPipeline<T> {
    pub fn new(toolchain: T, options: PipelineOptions) -> Self {
        Self {
            toolchain,
            options,
            last_error: String::new(),
        }
    }

    /// Install failure output of the previous cycle (empty after a success).
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Run one full cycle against `module`.
    pub async fn run(&mut self, module: &str) -> PipelineReport {
        let flags = self.options.flags;
        let mut report = PipelineReport::default();

        let install = self.toolchain.run_stage(Stage::Install, module, flags).await;
        report.record(&install);
        if let Err(err) = install.check() {
            if install.output != self.last_error {
                emit(&install.output);
                report.printed_error = true;
            } else {
                debug!(module, "install failed with unchanged output; not printing it again");
            }
            warn!(module, stage = %Stage::Install, error = %err, "pipeline halted; not restarting");
            self.last_error = install.output;
            return report;
        }
        self.last_error.clear();
        report.installed = true;
        info!(module, stage = %Stage::Install, "install passed");

        if self.options.test {
            let test = self.toolchain.run_stage(Stage::Test, module, flags).await;
            report.record(&test);
            if let Err(err) = test.check() {
                emit(&test.output);
                warn!(module, stage = %Stage::Test, error = %err, "tests failed; not restarting");
                return report;
            }
            info!(module, stage = %Stage::Test, "tests passed");
        }

        if self.options.package {
            let package = self.toolchain.run_stage(Stage::Package, module, flags).await;
            report.record(&package);
            match package.check() {
                Ok(()) => info!(module, stage = %Stage::Package, "build passed"),
                Err(err) => {
                    emit(&package.output);
                    warn!(
                        module,
                        stage = %Stage::Package,
                        error = %err,
                        "build failed; restarting anyway"
                    );
                }
            }
        }

        report.restart = true;
        report
    }
}

/// Print toolchain output for the operator on stdout.
fn emit(output: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(output.as_bytes());
    if !output.is_empty() && !output.ends_with('\n') {
        let _ = stdout.write_all(b"\n");
    }
    let _ = stdout.flush();
}
