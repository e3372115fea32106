// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod remote;
pub mod resolve;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{Settings, load_optional};
use crate::engine::{Debouncer, Runtime, run_aggregator};
use crate::errors::Result;
use crate::exec::{
    BuildPipeline, GoToolchain, ProcessSpec, SupervisorOptions, spawn_supervisor,
};
use crate::remote::run_remote_source;
use crate::resolve::{GoListResolver, Module, ModuleResolver, binary_path, resolve_entry};
use crate::types::{ChangeEvent, RebuildTrigger};
use crate::watch::{LocalWatch, WatchSet, resolve_watch_set};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and entry-module validation
/// - the change source (local watcher or remote feed)
/// - the aggregator, the build pipeline and the process supervisor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_optional(args.config.as_deref())?;
    let settings = Settings::new(&args, cfg);

    let resolver: Arc<dyn ModuleResolver> = Arc::new(GoListResolver::new(
        settings.go.clone(),
        settings.workdir.clone(),
    ));

    // The entry module must resolve and be executable, otherwise nothing
    // else starts.
    let entry = {
        let resolver = Arc::clone(&resolver);
        let path = settings.entry.clone();
        tokio::task::spawn_blocking(move || resolve_entry(resolver.as_ref(), &path))
            .await
            .map_err(anyhow::Error::from)??
    };

    if args.dry_run {
        let set = resolve_watch_set(Arc::clone(&resolver), entry.import_path.clone()).await?;
        print_dry_run(&settings, &entry, &set);
        return Ok(());
    }

    info!(
        "setting up {} {}",
        settings.entry,
        settings.program_args.join(" ")
    );

    let (changes_tx, changes_rx) = mpsc::channel::<ChangeEvent>(64);
    let (triggers_tx, triggers_rx) = mpsc::channel::<RebuildTrigger>(1);

    tokio::spawn(run_aggregator(
        Debouncer::new(settings.filter.clone()),
        settings.interval,
        changes_rx,
        triggers_tx,
    ));

    let supervisor = spawn_supervisor(
        ProcessSpec {
            program: binary_path(&entry),
            args: settings.program_args.clone(),
        },
        SupervisorOptions {
            run: !settings.never_run,
            grace_period: settings.grace_period,
        },
    );

    // Ctrl-C → graceful shutdown.
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        let _ = shutdown_tx.send(()).await;
    });

    let pipeline = BuildPipeline::new(
        GoToolchain::new(settings.go.clone(), settings.workdir.clone()),
        settings.pipeline,
    );
    let runtime = Runtime::new(
        entry.import_path.clone(),
        pipeline,
        supervisor.clone(),
        triggers_rx,
    )
    .with_shutdown(shutdown_rx);

    match settings.connect.clone() {
        Some(address) => {
            let mut remote = tokio::spawn(run_remote_source(address, changes_tx));

            tokio::select! {
                res = runtime.run() => {
                    remote.abort();
                    res
                }
                joined = &mut remote => {
                    // Remote failures are fatal; take the program down with us.
                    supervisor.stop().await?;
                    match joined {
                        Ok(res) => res,
                        Err(e) => Err(anyhow::Error::from(e).into()),
                    }
                }
            }
        }
        None => {
            let watch = LocalWatch::start(Arc::clone(&resolver), &entry, changes_tx).await?;
            debug!(dirs = ?watch.dirs(), "local watch active");
            runtime.with_local_watch(watch).run().await
        }
    }
}

/// Print what would be supervised and watched, without running anything.
fn print_dry_run(settings: &Settings, entry: &Module, set: &WatchSet) {
    println!("rerun dry-run");
    println!("  entry: {}", entry.import_path);
    println!("  dir: {}", entry.dir.display());
    println!("  binary: {}", binary_path(entry).display());
    if !settings.program_args.is_empty() {
        println!("  args: {:?}", settings.program_args);
    }
    println!("  interval: {:?}", settings.interval);
    println!("  grace_period: {:?}", settings.grace_period);
    println!(
        "  stages: install{}{}",
        if settings.pipeline.test { ", test" } else { "" },
        if settings.pipeline.package { ", package" } else { "" }
    );
    if settings.never_run {
        println!("  run: never");
    }
    println!();

    match &settings.connect {
        Some(address) => println!("remote events: {address}"),
        None => {
            let roots = set.roots();
            println!(
                "watched directories ({} of {} packages):",
                roots.len(),
                set.visited_count()
            );
            for dir in roots {
                println!("  - {}", dir.display());
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
