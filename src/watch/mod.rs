// src/watch/mod.rs

//! Watch-set construction and local file watching.
//!
//! This module is responsible for:
//! - Walking the entry module's import graph into a set of directories
//!   (`watch_set`).
//! - Classifying changed paths as source changes (`filter`).
//! - Wiring up a cross-platform filesystem watcher (`notify`) per session
//!   (`watcher`).
//! - Replacing the session when the import graph changes (`session`).
//!
//! It does **not** debounce; raw changes go to the aggregator in
//! [`crate::engine::debounce`].

pub mod filter;
pub mod session;
pub mod watch_set;
pub mod watcher;

pub use filter::SourceFilter;
pub use session::{LocalWatch, resolve_watch_set};
pub use watch_set::{WatchSet, build_watch_set, build_watch_set_from_graph};
pub use watcher::{WatcherHandle, is_content_change, spawn_watcher};
