// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`toolchain`] defines the `Toolchain` seam and the `go` implementation.
//! - [`capture`] collects a child's stdout and stderr into one buffer.
//! - [`pipeline`] runs install / test / package in sequence.
//! - [`supervisor`] owns the supervised program and restarts it.

pub mod capture;
pub mod pipeline;
pub mod supervisor;
pub mod toolchain;

pub use pipeline::{BuildPipeline, PipelineOptions, PipelineReport};
pub use supervisor::{
    ProcessControl, ProcessSpec, StopPhase, SupervisorHandle, SupervisorOptions,
    SupervisorState, spawn_supervisor,
};
pub use toolchain::{FailureKind, GoToolchain, Stage, StageFlags, StageResult, Toolchain};
