// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use globset::GlobSet;
use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// interval = "100ms"
///
/// [watch]
/// include = ["*.go"]
/// exclude = ["**/.#*"]
///
/// [toolchain]
/// go = "go"
///
/// [supervisor]
/// grace_period = "5s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Quiescence window of the change aggregator.
    #[serde(default)]
    pub interval: Option<String>,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub toolchain: ToolchainSection,

    #[serde(default)]
    pub supervisor: SupervisorSection,
}

/// `[watch]` section: which changed paths count as source changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Matched after `include`; editor lock and swap files by default.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_include() -> Vec<String> {
    vec!["*.go".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/.#*".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainSection {
    /// Toolchain executable used for resolution, install, test and build.
    #[serde(default = "default_go")]
    pub go: String,

    /// Working directory for toolchain invocations. Defaults to the
    /// process working directory.
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

fn default_go() -> String {
    "go".to_string()
}

impl Default for ToolchainSection {
    fn default() -> Self {
        Self {
            go: default_go(),
            workdir: None,
        }
    }
}

/// `[supervisor]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SupervisorSection {
    #[serde(default)]
    pub grace_period: Option<String>,
}

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Validated configuration.
///
/// Constructed through `TryFrom<RawConfigFile>` (see `validate.rs`), so all
/// durations are parsed and all glob patterns compiled.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub interval: Duration,
    pub grace_period: Duration,
    pub include: GlobSet,
    pub exclude: GlobSet,
    pub go: String,
    pub workdir: Option<PathBuf>,
}
