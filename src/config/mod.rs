// src/config/mod.rs

//! Configuration loading and validation for rerun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate and compile raw values (`validate.rs`).
//! - Merge CLI flags over file values (`settings.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, load_optional};
pub use model::{
    ConfigFile, RawConfigFile, SupervisorSection, ToolchainSection, WatchSection,
};
pub use settings::Settings;
