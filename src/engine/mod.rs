// src/engine/mod.rs

//! Orchestration engine for rerun.
//!
//! - [`debounce`] turns raw change events into coalesced rebuild triggers.
//! - [`runtime`] runs the build pipeline per trigger and drives the process
//!   supervisor.

pub mod debounce;
pub mod runtime;

pub use debounce::{Debouncer, run_aggregator};
pub use runtime::Runtime;
