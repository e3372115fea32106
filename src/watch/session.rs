// src/watch/session.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::errors::Result;
use crate::resolve::{Module, ModuleResolver};
use crate::types::ChangeEvent;
use crate::watch::watch_set::{WatchSet, build_watch_set_from_graph};
use crate::watch::watcher::{WatcherHandle, spawn_watcher};

/// Local filesystem event source that follows the entry module's import
/// graph.
///
/// After every successful pipeline cycle the orchestration loop calls
/// [`LocalWatch::refresh`]; when imports were added or removed, the active
/// session is replaced by one subscribed to the new directory set. Each
/// pass resolves the whole graph through [`ModuleResolver::resolve_graph`].
pub struct LocalWatch {
    resolver: Arc<dyn ModuleResolver>,
    entry: String,
    changes_tx: mpsc::Sender<ChangeEvent>,
    session: WatcherHandle,
}

impl std::fmt::Debug for LocalWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWatch")
            .field("entry", &self.entry)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl LocalWatch {
    /// Build the initial watch set for an already-validated entry module.
    pub async fn start(
        resolver: Arc<dyn ModuleResolver>,
        entry: &Module,
        changes_tx: mpsc::Sender<ChangeEvent>,
    ) -> Result<Self> {
        let set = resolve_watch_set(Arc::clone(&resolver), entry.import_path.clone()).await?;

        let session = spawn_watcher(&set.roots(), changes_tx.clone())?;

        Ok(Self {
            resolver,
            entry: entry.import_path.clone(),
            changes_tx,
            session,
        })
    }

    /// Directories subscribed by the active session.
    pub fn dirs(&self) -> &[std::path::PathBuf] {
        self.session.dirs()
    }

    /// Re-resolve the import graph and replace the session if the directory
    /// set changed. Returns whether a new session was installed.
    pub async fn refresh(&mut self) -> Result<bool> {
        let set = resolve_watch_set(Arc::clone(&self.resolver), self.entry.clone()).await?;
        let roots = set.roots();

        if roots.as_slice() == self.session.dirs() {
            return Ok(false);
        }

        info!(
            module = %self.entry,
            dirs = roots.len(),
            "dependency graph changed; rebuilding watch set"
        );

        let fresh = spawn_watcher(&roots, self.changes_tx.clone())?;
        let old = std::mem::replace(&mut self.session, fresh);
        old.teardown();
        Ok(true)
    }
}

/// Resolve the entry module afresh and build its watch set off the async
/// runtime.
pub async fn resolve_watch_set(
    resolver: Arc<dyn ModuleResolver>,
    entry: String,
) -> Result<WatchSet> {
    tokio::task::spawn_blocking(move || -> Result<WatchSet> {
        let graph = resolver.resolve_graph(&entry)?;
        Ok(build_watch_set_from_graph(resolver.as_ref(), graph))
    })
    .await
    .map_err(anyhow::Error::from)?
}
