// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::{BuildPipeline, ProcessControl, Toolchain};
use crate::types::RebuildTrigger;
use crate::watch::LocalWatch;

/// Main orchestration loop.
///
/// Runs one pipeline cycle at startup and one per [`RebuildTrigger`],
/// strictly one at a time, and asks the process control to restart the
/// program after every cycle that allows it. After such a cycle the local
/// watch set (if any) is refreshed as well.
///
/// Steady-state failures (stages, restarts, watch refreshes) are logged and
/// never end the loop. The loop ends when the trigger channel closes or a
/// shutdown is requested; the supervised program is stopped on the way out.
pub struct Runtime<T: Toolchain, P: ProcessControl> {
    entry: String,
    pipeline: BuildPipeline<T>,
    process: P,
    triggers: mpsc::Receiver<RebuildTrigger>,
    shutdown: Option<mpsc::Receiver<()>>,
    watch: Option<LocalWatch>,
    cycles: usize,
}

impl<T: Toolchain, P: ProcessControl> fmt::Debug for Runtime<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("entry", &self.entry)
            .field("watch", &self.watch)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}

impl<T: Toolchain, P: ProcessControl> Runtime<T, P> {
    pub fn new(
        entry: impl Into<String>,
        pipeline: BuildPipeline<T>,
        process: P,
        triggers: mpsc::Receiver<RebuildTrigger>,
    ) -> Self {
        Self {
            entry: entry.into(),
            pipeline,
            process,
            triggers,
            shutdown: None,
            watch: None,
            cycles: 0,
        }
    }

    /// Refresh this watch after every cycle that ends in a restart.
    pub fn with_local_watch(mut self, watch: LocalWatch) -> Self {
        self.watch = Some(watch);
        self
    }

    /// Stop the loop when a message arrives on `shutdown`.
    pub fn with_shutdown(mut self, shutdown: mpsc::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub async fn run(mut self) -> Result<()> {
        info!(module = %self.entry, "rerun runtime started");

        self.cycle().await;

        loop {
            let trigger = tokio::select! {
                trigger = self.triggers.recv() => trigger,
                () = recv_shutdown(&mut self.shutdown) => {
                    info!("shutdown requested");
                    None
                }
            };

            let Some(trigger) = trigger else {
                break;
            };

            info!(path = %trigger.path.display(), "change detected, rebuilding");
            self.cycle().await;
        }

        if let Err(e) = self.process.shutdown().await {
            warn!(error = %e, "stopping the program failed");
        }

        info!(cycles = self.cycles, "runtime exiting");
        Ok(())
    }

    async fn cycle(&mut self) {
        self.cycles += 1;
        debug!(cycle = self.cycles, module = %self.entry, "pipeline cycle starting");

        let report = self.pipeline.run(&self.entry).await;

        if !report.restart {
            return;
        }

        if let Err(e) = self.process.request_restart().await {
            warn!(error = %e, "restart request failed");
        }

        // Imports may have changed with a cycle that passed.
        if let Some(watch) = self.watch.as_mut() {
            if let Err(e) = watch.refresh().await {
                warn!(error = %e, "could not refresh watch set; keeping the current one");
            }
        }
    }
}

/// Resolves on a shutdown message; never resolves without a shutdown
/// channel or after its senders are gone.
async fn recv_shutdown(shutdown: &mut Option<mpsc::Receiver<()>>) {
    match shutdown {
        Some(rx) => {
            if rx.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}
