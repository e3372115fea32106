// src/resolve/module.rs

use std::path::PathBuf;

use tracing::debug;

use crate::errors::{RerunError, Result};

/// Declared package kind of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageKind {
    /// Builds into a runnable program (`package main`).
    Executable,
    /// Any other package; carries the declared package name.
    Library(String),
}

impl PackageKind {
    pub const EXECUTABLE_NAME: &'static str = "main";

    pub fn from_package_name(name: &str) -> Self {
        if name == Self::EXECUTABLE_NAME {
            PackageKind::Executable
        } else {
            PackageKind::Library(name.to_string())
        }
    }

    /// The declared package name.
    pub fn name(&self) -> &str {
        match self {
            PackageKind::Executable => Self::EXECUTABLE_NAME,
            PackageKind::Library(name) => name,
        }
    }
}

/// A resolved module. Resolved on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub import_path: String,
    pub dir: PathBuf,
    pub kind: PackageKind,
    pub imports: Vec<String>,
    /// Part of the toolchain's standard library; never watched.
    pub standard: bool,
    /// Where the toolchain installs the binary, for executable modules.
    pub target: Option<PathBuf>,
}

/// Resolves import paths to modules.
///
/// Implementations are synchronous; callers on the async runtime run them
/// through `spawn_blocking`.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, import_path: &str) -> Result<Module>;

    /// Resolve `import_path` together with as much of its transitive import
    /// graph as the backend can produce in one lookup.
    ///
    /// The default only resolves the entry itself; anything missing from
    /// `deps` is resolved one import at a time by the watch-set builder.
    fn resolve_graph(&self, import_path: &str) -> Result<ResolvedGraph> {
        Ok(ResolvedGraph {
            entry: self.resolve(import_path)?,
            deps: Vec::new(),
        })
    }
}

/// An entry module plus the dependencies resolved alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGraph {
    pub entry: Module,
    pub deps: Vec<Module>,
}

/// Resolve the entry module and check that it is executable.
///
/// Both failures are fatal at startup.
pub fn resolve_entry(resolver: &dyn ModuleResolver, import_path: &str) -> Result<Module> {
    let module = resolver.resolve(import_path)?;

    if module.kind != PackageKind::Executable {
        return Err(RerunError::NotExecutable {
            path: import_path.to_string(),
            expected: PackageKind::EXECUTABLE_NAME.to_string(),
            actual: module.kind.name().to_string(),
        });
    }

    debug!(module = %module.import_path, dir = %module.dir.display(), "entry module resolved");
    Ok(module)
}

/// Path of the installed binary for the entry module.
///
/// Prefers the install target reported by the toolchain, then falls back to
/// `$GOBIN`, `$GOPATH/bin` and `$HOME/go/bin` joined with the last segment
/// of the import path.
pub fn binary_path(entry: &Module) -> PathBuf {
    binary_path_with_env(entry, |key| std::env::var(key).ok())
}

pub(crate) fn binary_path_with_env(
    entry: &Module,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    if let Some(target) = entry.target.as_ref().filter(|t| !t.as_os_str().is_empty()) {
        return target.clone();
    }

    let bin_name = entry
        .import_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(entry.import_path.as_str())
        .to_string();

    let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());

    let bin_dir = if let Some(gobin) = non_empty("GOBIN") {
        PathBuf::from(gobin)
    } else if let Some(gopath) = non_empty("GOPATH") {
        let first = std::env::split_paths(&gopath)
            .next()
            .unwrap_or_else(|| PathBuf::from(&gopath));
        first.join("bin")
    } else {
        let home = non_empty("HOME").unwrap_or_else(|| ".".to_string());
        PathBuf::from(home).join("go").join("bin")
    };

    bin_dir.join(bin_name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct OneModule(Module);

    impl ModuleResolver for OneModule {
        fn resolve(&self, import_path: &str) -> Result<Module> {
            if import_path == self.0.import_path {
                Ok(self.0.clone())
            } else {
                Err(RerunError::resolution(import_path, "not found"))
            }
        }
    }

    fn module(path: &str, package: &str) -> Module {
        Module {
            import_path: path.to_string(),
            dir: PathBuf::from("/src").join(path),
            kind: PackageKind::from_package_name(package),
            imports: Vec::new(),
            standard: false,
            target: None,
        }
    }

    #[test]
    fn library_entry_reports_expected_and_actual_kind() {
        let resolver = OneModule(module("example.com/util", "util"));
        match resolve_entry(&resolver, "example.com/util") {
            Err(RerunError::NotExecutable {
                expected, actual, ..
            }) => {
                assert_eq!(expected, "main");
                assert_eq!(actual, "util");
            }
            other => panic!("expected NotExecutable, got {other:?}"),
        }
    }

    #[test]
    fn unknown_entry_is_a_resolution_error() {
        let resolver = OneModule(module("example.com/app", "main"));
        assert!(matches!(
            resolve_entry(&resolver, "example.com/missing"),
            Err(RerunError::Resolution { .. })
        ));
    }

    #[test]
    fn binary_path_prefers_toolchain_target() {
        let mut m = module("example.com/app", "main");
        m.target = Some(PathBuf::from("/opt/bin/app"));
        let path = binary_path_with_env(&m, |_| Some("/ignored".to_string()));
        assert_eq!(path, PathBuf::from("/opt/bin/app"));
    }

    #[test]
    fn binary_path_falls_back_through_environment() {
        let m = module("example.com/tools/app", "main");
        let env: HashMap<&str, &str> =
            HashMap::from([("GOPATH", "/home/dev/go"), ("HOME", "/home/dev")]);
        let path = binary_path_with_env(&m, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(path, PathBuf::from("/home/dev/go/bin/app"));

        let path = binary_path_with_env(&m, |k| (k == "GOBIN").then(|| "/gobin".to_string()));
        assert_eq!(path, PathBuf::from("/gobin/app"));
    }
}
