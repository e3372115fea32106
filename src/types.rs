// src/types.rs

//! Small value types shared between the event sources, the aggregator and the
//! orchestration loop.

use std::path::{Path, PathBuf};

/// A raw change notification from the local watcher or the remote feed.
///
/// Arrival time is implicit: the aggregator timestamps events as it receives
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Coalesced result of one burst of changes.
///
/// `path` is the last significant change of the burst. It is informational
/// only; every rebuild targets the entry module as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildTrigger {
    pub path: PathBuf,
}

impl RebuildTrigger {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
