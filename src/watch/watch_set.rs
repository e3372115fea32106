// src/watch/watch_set.rs

//! Watch-set construction.
//!
//! Walks the import graph of the entry module and collects the source
//! directories of every non-standard module. The visited set is owned by a
//! single construction pass and threaded through the recursion explicitly;
//! each rebuild starts from an empty [`WatchSet`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::errors::Result;
use crate::resolve::{Module, ModuleResolver, ResolvedGraph};

/// Result of one construction pass.
#[derive(Debug, Default, Clone)]
pub struct WatchSet {
    visited: HashSet<String>,
    dirs: BTreeSet<PathBuf>,
}

impl WatchSet {
    /// Every source directory collected, one entry per directory.
    pub fn dirs(&self) -> &BTreeSet<PathBuf> {
        &self.dirs
    }

    /// Whether an import path was visited (resolved or skipped) in this pass.
    pub fn visited(&self, import_path: &str) -> bool {
        self.visited.contains(import_path)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Directories to subscribe to.
    ///
    /// Subscriptions are recursive, so a directory nested inside another
    /// collected directory is already covered and is left out.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        // BTreeSet order puts every ancestor before its descendants.
        for dir in &self.dirs {
            if roots.iter().any(|root| dir.starts_with(root)) {
                continue;
            }
            roots.push(dir.clone());
        }
        roots
    }
}

/// Build the watch set for an already-resolved entry module.
///
/// Resolution failures of individual imports are logged and that branch is
/// omitted. The entry module itself must be resolved by the caller, where
/// its failure is fatal.
pub fn build_watch_set(resolver: &dyn ModuleResolver, entry: &Module) -> WatchSet {
    let mut set = WatchSet::default();
    set.visited.insert(entry.import_path.clone());
    collect(resolver, entry, &mut set);
    debug!(
        module = %entry.import_path,
        visited = set.visited.len(),
        dirs = set.dirs.len(),
        "watch set built"
    );
    set
}

/// Build the watch set from a graph resolved in one lookup.
///
/// Imports found in `graph.deps` are answered from memory; only imports the
/// backend did not report fall through to `resolver`.
pub fn build_watch_set_from_graph(
    resolver: &dyn ModuleResolver,
    graph: ResolvedGraph,
) -> WatchSet {
    let preloaded = Preloaded {
        known: graph
            .deps
            .into_iter()
            .map(|m| (m.import_path.clone(), m))
            .collect(),
        fallback: resolver,
    };
    build_watch_set(&preloaded, &graph.entry)
}

struct Preloaded<'a> {
    known: HashMap<String, Module>,
    fallback: &'a dyn ModuleResolver,
}

impl ModuleResolver for Preloaded<'_> {
    fn resolve(&self, import_path: &str) -> Result<Module> {
        match self.known.get(import_path) {
            Some(module) => Ok(module.clone()),
            None => self.fallback.resolve(import_path),
        }
    }
}

fn collect(resolver: &dyn ModuleResolver, module: &Module, set: &mut WatchSet) {
    if module.standard {
        trace!(module = %module.import_path, "skipping standard library module");
        return;
    }

    for import in &module.imports {
        if !set.visited.insert(import.clone()) {
            continue;
        }

        match resolver.resolve(import) {
            Ok(dep) => {
                // The resolved path can differ from the import string
                // (vendoring); both count as visited.
                if dep.import_path != *import && !set.visited.insert(dep.import_path.clone()) {
                    continue;
                }
                collect(resolver, &dep, set);
            }
            Err(err) => {
                warn!(
                    module = %module.import_path,
                    import = %import,
                    error = %err,
                    "cannot resolve import; leaving it out of the watch set"
                );
            }
        }
    }

    if set.dirs.insert(module.dir.clone()) {
        debug!(
            module = %module.import_path,
            dir = %module.dir.display(),
            "adding directory to watch set"
        );
    }
}
