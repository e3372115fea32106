// src/config/settings.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::exec::{PipelineOptions, StageFlags};
use crate::watch::SourceFilter;

/// Effective runtime settings: CLI flags layered over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub entry: String,
    pub program_args: Vec<String>,
    pub interval: Duration,
    pub grace_period: Duration,
    pub pipeline: PipelineOptions,
    pub never_run: bool,
    pub connect: Option<String>,
    pub go: String,
    pub workdir: Option<PathBuf>,
    pub filter: SourceFilter,
}

impl Settings {
    pub fn new(args: &CliArgs, cfg: ConfigFile) -> Self {
        Self {
            entry: args.entry.clone(),
            program_args: args.program_args.clone(),
            interval: args.interval.unwrap_or(cfg.interval),
            grace_period: args.grace_period.unwrap_or(cfg.grace_period),
            pipeline: PipelineOptions {
                test: args.test,
                package: args.build,
                flags: StageFlags { race: args.race },
            },
            never_run: args.no_run,
            connect: args.connect.clone(),
            go: cfg.go,
            workdir: cfg.workdir,
            filter: SourceFilter::new(cfg.include, cfg.exclude),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_overrides_file_values() {
        let args = CliArgs::try_parse_from([
            "rerun",
            "--interval",
            "2s",
            "--build",
            "./cmd/api",
            "serve",
            "-v",
        ])
        .unwrap();
        let cfg = ConfigFile::defaults().unwrap();

        let settings = Settings::new(&args, cfg.clone());
        assert_eq!(settings.interval, Duration::from_secs(2));
        assert_eq!(settings.grace_period, cfg.grace_period);
        assert!(settings.pipeline.package);
        assert!(!settings.pipeline.test);
        assert_eq!(settings.program_args, vec!["serve", "-v"]);
    }
}
