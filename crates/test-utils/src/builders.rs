#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rerun::errors::{RerunError, Result};
use rerun::resolve::{Module, ModuleResolver, PackageKind, ResolvedGraph};

/// Builder for an in-memory import graph.
///
/// Module directories are `<root>/<import path>`; standard-library modules
/// live under `/goroot/src`.
pub struct ModuleGraphBuilder {
    root: PathBuf,
    modules: BTreeMap<String, Module>,
}

impl ModuleGraphBuilder {
    pub fn new() -> Self {
        Self::with_root("/work/src")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            modules: BTreeMap::new(),
        }
    }

    pub fn executable(self, path: &str, imports: &[&str]) -> Self {
        self.module(path, PackageKind::Executable, imports)
    }

    pub fn library(self, path: &str, imports: &[&str]) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.module(path, PackageKind::Library(name), imports)
    }

    pub fn standard(mut self, path: &str, imports: &[&str]) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.modules.insert(
            path.to_string(),
            Module {
                import_path: path.to_string(),
                dir: Path::new("/goroot/src").join(path),
                kind: PackageKind::Library(name),
                imports: imports.iter().map(|s| s.to_string()).collect(),
                standard: true,
                target: None,
            },
        );
        self
    }

    fn module(mut self, path: &str, kind: PackageKind, imports: &[&str]) -> Self {
        let target = (kind == PackageKind::Executable)
            .then(|| PathBuf::from("/work/bin").join(path.rsplit('/').next().unwrap_or(path)));
        self.modules.insert(
            path.to_string(),
            Module {
                import_path: path.to_string(),
                dir: self.root.join(path),
                kind,
                imports: imports.iter().map(|s| s.to_string()).collect(),
                standard: false,
                target,
            },
        );
        self
    }

    pub fn build(self) -> FakeResolver {
        FakeResolver {
            modules: Mutex::new(self.modules.into_iter().collect()),
            calls: Mutex::new(HashMap::new()),
            graph_calls: AtomicUsize::new(0),
        }
    }
}

impl Default for ModuleGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolver over a fixed module graph that counts lookups per import path.
///
/// Unknown paths fail with a resolution error. `resolve_graph` answers the
/// whole reachable graph in one call, like `go list -deps`, and leaves
/// unknown imports out for the caller to resolve individually.
pub struct FakeResolver {
    modules: Mutex<HashMap<String, Module>>,
    calls: Mutex<HashMap<String, usize>>,
    graph_calls: AtomicUsize,
}

impl FakeResolver {
    /// How often `path` has been resolved.
    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Single-module lookups across all paths.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Whole-graph lookups.
    pub fn graph_calls(&self) -> usize {
        self.graph_calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.graph_calls.store(0, Ordering::SeqCst);
    }

    /// Replace a known module's import list, e.g. to simulate an edit.
    pub fn set_imports(&self, path: &str, imports: &[&str]) {
        if let Some(module) = self.modules.lock().unwrap().get_mut(path) {
            module.imports = imports.iter().map(|s| s.to_string()).collect();
        }
    }
}

impl ModuleResolver for FakeResolver {
    fn resolve(&self, import_path: &str) -> Result<Module> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(import_path.to_string())
            .or_default() += 1;

        self.modules
            .lock()
            .unwrap()
            .get(import_path)
            .cloned()
            .ok_or_else(|| RerunError::resolution(import_path, "no such module"))
    }

    fn resolve_graph(&self, import_path: &str) -> Result<ResolvedGraph> {
        self.graph_calls.fetch_add(1, Ordering::SeqCst);

        let modules = self.modules.lock().unwrap();
        let entry = modules
            .get(import_path)
            .cloned()
            .ok_or_else(|| RerunError::resolution(import_path, "no such module"))?;

        let mut seen: HashSet<String> = HashSet::from([entry.import_path.clone()]);
        let mut stack: Vec<String> = entry.imports.clone();
        let mut deps = Vec::new();
        while let Some(path) = stack.pop() {
            if !seen.insert(path.clone()) {
                continue;
            }
            if let Some(module) = modules.get(&path) {
                stack.extend(module.imports.iter().cloned());
                deps.push(module.clone());
            }
        }

        Ok(ResolvedGraph { entry, deps })
    }
}
