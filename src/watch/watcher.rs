// src/watch/watcher.rs

use std::path::PathBuf;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::types::ChangeEvent;

/// Handle for one filesystem watch session.
///
/// Keeps the underlying `RecommendedWatcher` alive. Tearing the session down
/// (explicitly or by dropping the handle) closes the notification source and
/// switches the forwarding task into drain mode: it discards whatever the
/// closed source still delivers until the source reports closed, so the
/// notify side never blocks on a channel nobody reads.
pub struct WatcherHandle {
    watcher: Option<RecommendedWatcher>,
    superseded: Option<oneshot::Sender<()>>,
    dirs: Vec<PathBuf>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("dirs", &self.dirs)
            .field("active", &self.watcher.is_some())
            .finish()
    }
}

impl WatcherHandle {
    /// Directories subscribed by this session.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Close the notification source and drain what is left of it.
    pub fn teardown(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(superseded) = self.superseded.take() {
            let _ = superseded.send(());
        }
        // Dropping the watcher drops its callback and with it the last
        // sender of the session channel.
        if self.watcher.take().is_some() {
            debug!(dirs = ?self.dirs, "watch session torn down");
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Subscribe to recursive change notifications for every directory in
/// `dirs` and forward changed paths to `changes_tx`.
pub fn spawn_watcher(
    dirs: &[PathBuf],
    changes_tx: mpsc::Sender<ChangeEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Fails only once the session has been drained and closed.
                let _ = event_tx.send(event);
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )
    .map_err(anyhow::Error::from)?;

    for dir in dirs {
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(anyhow::Error::from)?;
        info!("watching {} for file events", dir.display());
    }

    let (superseded_tx, mut superseded_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = &mut superseded_rx => break,
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        debug!("watch session closed");
                        return;
                    };
                    if !is_content_change(&event.kind) {
                        continue;
                    }
                    for path in event.paths {
                        debug!(path = %path.display(), "file event");
                        if changes_tx.send(ChangeEvent::new(path)).await.is_err() {
                            debug!("change channel closed; stopping watch forwarder");
                            return;
                        }
                    }
                }
            }
        }

        let mut discarded = 0usize;
        while event_rx.recv().await.is_some() {
            discarded += 1;
        }
        debug!(discarded, "superseded watch session drained");
    });

    Ok(WatcherHandle {
        watcher: Some(watcher),
        superseded: Some(superseded_tx),
        dirs: dirs.to_vec(),
    })
}

/// Whether a notify event can reflect changed source content.
///
/// Access events fire whenever the toolchain reads the tree and metadata
/// changes carry no content; both would otherwise retrigger a rebuild
/// forever.
pub fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};

    use super::*;

    #[test]
    fn only_content_events_are_forwarded() {
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(is_content_change(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_content_change(&EventKind::Access(AccessKind::Read)));
        assert!(!is_content_change(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::WriteTime
        ))));
    }
}
