// src/engine/debounce.rs

//! Change aggregator.
//!
//! Trailing-edge debounce over a single pending slot: every significant
//! change overwrites the slot and restarts the quiescence timer; when the
//! timer expires with a non-empty slot, one [`RebuildTrigger`] is handed to
//! the orchestration loop. The aggregator does not care whether events come
//! from the local watcher or the remote feed.

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::types::{ChangeEvent, RebuildTrigger};
use crate::watch::SourceFilter;

/// Pure pending-slot state, without timers or channels.
#[derive(Debug, Clone)]
pub struct Debouncer {
    filter: SourceFilter,
    pending: Option<RebuildTrigger>,
}

impl Debouncer {
    pub fn new(filter: SourceFilter) -> Self {
        Self {
            filter,
            pending: None,
        }
    }

    /// Record an event. Returns true when it was significant, i.e. the
    /// quiescence timer must restart.
    pub fn offer(&mut self, event: ChangeEvent) -> bool {
        if !self.filter.is_source(&event.path) {
            trace!(path = %event.path.display(), "ignoring non-source change");
            return false;
        }
        self.pending = Some(RebuildTrigger { path: event.path });
        true
    }

    pub fn pending(&self) -> Option<&Path> {
        self.pending.as_ref().map(|t| t.path())
    }

    /// Timer expiry: take the pending trigger, if any.
    pub fn fire(&mut self) -> Option<RebuildTrigger> {
        self.pending.take()
    }
}

/// Run the aggregator until the event source closes.
///
/// `triggers` should have capacity one. When a trigger is still waiting to
/// be picked up, a newer one is dropped: the waiting trigger already causes
/// a full rebuild that sees the newer changes.
pub async fn run_aggregator(
    mut debouncer: Debouncer,
    interval: Duration,
    mut events: mpsc::Receiver<ChangeEvent>,
    triggers: mpsc::Sender<RebuildTrigger>,
) {
    let timer = tokio::time::sleep(interval);
    tokio::pin!(timer);
    let mut armed = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    if let Some(trigger) = debouncer.fire() {
                        let _ = triggers.send(trigger).await;
                    }
                    debug!("change source closed; aggregator stopping");
                    return;
                };
                if debouncer.offer(event) {
                    timer.as_mut().reset(Instant::now() + interval);
                    armed = true;
                }
            }
            () = &mut timer, if armed => {
                armed = false;
                let Some(trigger) = debouncer.fire() else {
                    continue;
                };
                match triggers.try_send(trigger) {
                    Ok(()) => {}
                    Err(TrySendError::Full(trigger)) => {
                        debug!(
                            path = %trigger.path.display(),
                            "rebuild already pending; coalescing"
                        );
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!("trigger channel closed; aggregator stopping");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> Debouncer {
        Debouncer::new(SourceFilter::from_patterns(&["*.go"], &["**/.#*"]).unwrap())
    }

    #[test]
    fn last_source_change_wins() {
        let mut d = debouncer();
        assert!(d.offer(ChangeEvent::new("/src/a.go")));
        assert!(d.offer(ChangeEvent::new("/src/b.go")));
        assert!(!d.offer(ChangeEvent::new("/src/.b.go.swp")));

        let trigger = d.fire().unwrap();
        assert_eq!(trigger.path(), Path::new("/src/b.go"));
        assert!(d.fire().is_none());
    }

    #[test]
    fn non_source_changes_never_fill_the_slot() {
        let mut d = debouncer();
        assert!(!d.offer(ChangeEvent::new("/src/notes.txt")));
        assert!(!d.offer(ChangeEvent::new("/src/.#main.go")));
        assert!(d.pending().is_none());
        assert!(d.fire().is_none());
    }
}
