// src/config/validate.rs

use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigFile, DEFAULT_GRACE_PERIOD, DEFAULT_INTERVAL, RawConfigFile,
};
use crate::errors::{RerunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RerunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let interval = parse_optional_duration("interval", raw.interval.as_deref())?
            .unwrap_or(DEFAULT_INTERVAL);
        if interval.is_zero() {
            return Err(RerunError::ConfigError(
                "interval must be greater than zero".to_string(),
            ));
        }

        let grace_period = parse_optional_duration(
            "supervisor.grace_period",
            raw.supervisor.grace_period.as_deref(),
        )?
        .unwrap_or(DEFAULT_GRACE_PERIOD);

        if raw.watch.include.is_empty() {
            return Err(RerunError::ConfigError(
                "[watch].include must contain at least one pattern".to_string(),
            ));
        }
        if raw.toolchain.go.trim().is_empty() {
            return Err(RerunError::ConfigError(
                "[toolchain].go must not be empty".to_string(),
            ));
        }

        Ok(ConfigFile {
            interval,
            grace_period,
            include: compile_globs("watch.include", &raw.watch.include)?,
            exclude: compile_globs("watch.exclude", &raw.watch.exclude)?,
            go: raw.toolchain.go,
            workdir: raw.toolchain.workdir,
        })
    }
}

impl ConfigFile {
    /// Built-in defaults, as if an empty config file had been loaded.
    pub fn defaults() -> Result<Self> {
        ConfigFile::try_from(RawConfigFile::default())
    }
}

fn parse_optional_duration(key: &str, value: Option<&str>) -> Result<Option<Duration>> {
    value
        .map(|s| {
            parse_duration(s)
                .map_err(|e| RerunError::ConfigError(format!("invalid `{key}`: {e}")))
        })
        .transpose()
}

pub(crate) fn compile_globs(key: &str, patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| {
            RerunError::ConfigError(format!("invalid glob in `{key}` ({pat:?}): {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| RerunError::ConfigError(format!("building `{key}` glob set: {e}")))
}
