// src/resolve/go_list.rs

use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::errors::{RerunError, Result};
use crate::resolve::module::{Module, ModuleResolver, PackageKind, ResolvedGraph};

/// Pseudo-import used for cgo; it has no source directory of its own.
const CGO_PSEUDO_IMPORT: &str = "C";

/// Resolver backed by `go list -json <import path>`.
#[derive(Debug, Clone)]
pub struct GoListResolver {
    go: String,
    workdir: Option<PathBuf>,
}

impl GoListResolver {
    pub fn new(go: impl Into<String>, workdir: Option<PathBuf>) -> Self {
        Self {
            go: go.into(),
            workdir,
        }
    }
}

impl ModuleResolver for GoListResolver {
    fn resolve(&self, import_path: &str) -> Result<Module> {
        if import_path == CGO_PSEUDO_IMPORT {
            return Ok(Module {
                import_path: import_path.to_string(),
                dir: PathBuf::new(),
                kind: PackageKind::Library(CGO_PSEUDO_IMPORT.to_string()),
                imports: Vec::new(),
                standard: true,
                target: None,
            });
        }

        let stdout = self.go_list(import_path, &["-json"])?;
        parse_go_list_output(import_path, &stdout)
    }

    fn resolve_graph(&self, import_path: &str) -> Result<ResolvedGraph> {
        // `-e` reports broken dependencies inline instead of failing the
        // whole listing.
        let stdout = self.go_list(import_path, &["-e", "-deps", "-json"])?;
        parse_go_list_deps(import_path, &stdout)
    }
}

impl GoListResolver {
    /// Run `go list <flags> <import path>` and return its stdout.
    fn go_list(&self, import_path: &str, flags: &[&str]) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.go);
        cmd.arg("list").args(flags).arg(import_path);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        trace!(module = %import_path, ?flags, "running go list");
        let output = cmd.output().map_err(|e| {
            RerunError::resolution(import_path, format!("running {}: {e}", self.go))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RerunError::resolution(import_path, stderr.trim()));
        }

        Ok(output.stdout)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    #[serde(default)]
    dir: Option<PathBuf>,
    import_path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    standard: bool,
    #[serde(default)]
    goroot: bool,
    #[serde(default)]
    target: Option<PathBuf>,
    #[serde(default)]
    error: Option<GoListError>,
}

#[derive(Debug, Deserialize)]
struct GoListError {
    #[serde(rename = "Err")]
    err: String,
}

/// Convert one `go list -json` object into a [`Module`].
pub(crate) fn parse_go_list_output(import_path: &str, stdout: &[u8]) -> Result<Module> {
    let pkg: GoListPackage = serde_json::from_slice(stdout).map_err(|e| {
        RerunError::resolution(import_path, format!("decoding go list output: {e}"))
    })?;
    into_module(import_path, pkg)
}

/// Convert the object stream of `go list -e -deps -json`.
///
/// The toolchain lists dependencies first and the named package last.
/// Dependencies that failed to load are left out; the watch-set builder
/// resolves them individually and reports the failure there.
pub(crate) fn parse_go_list_deps(import_path: &str, stdout: &[u8]) -> Result<ResolvedGraph> {
    let mut modules = Vec::new();
    for pkg in serde_json::Deserializer::from_slice(stdout).into_iter::<GoListPackage>() {
        let pkg = pkg.map_err(|e| {
            RerunError::resolution(import_path, format!("decoding go list output: {e}"))
        })?;
        modules.push(pkg);
    }

    let entry = modules
        .pop()
        .ok_or_else(|| RerunError::resolution(import_path, "go list printed no packages"))?;
    let entry = into_module(import_path, entry)?;

    let deps = modules
        .into_iter()
        .filter_map(|pkg| {
            let path = pkg.import_path.clone();
            match into_module(&path, pkg) {
                Ok(module) => Some(module),
                Err(err) => {
                    debug!(module = %path, error = %err, "dependency failed to load");
                    None
                }
            }
        })
        .collect();

    Ok(ResolvedGraph { entry, deps })
}

fn into_module(import_path: &str, pkg: GoListPackage) -> Result<Module> {
    if let Some(err) = pkg.error {
        return Err(RerunError::resolution(import_path, err.err));
    }

    let dir = pkg
        .dir
        .ok_or_else(|| RerunError::resolution(import_path, "package has no source directory"))?;

    Ok(Module {
        import_path: pkg.import_path,
        dir,
        kind: PackageKind::from_package_name(&pkg.name),
        imports: pkg.imports,
        standard: pkg.standard || pkg.goroot,
        target: pkg.target,
    })
}
