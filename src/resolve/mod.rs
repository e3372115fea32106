// src/resolve/mod.rs

//! Dependency resolution.
//!
//! Turns an import path into a [`Module`]: its source directory, package
//! kind and direct imports. The watch-set builder walks the import graph
//! through the [`ModuleResolver`] trait, so tests can substitute an
//! in-memory graph for the real toolchain.
//!
//! - [`module`] holds the data model and entry-module validation.
//! - [`go_list`] is the production resolver backed by `go list -json`.

pub mod go_list;
pub mod module;

pub use go_list::GoListResolver;
pub use module::{
    Module, ModuleResolver, PackageKind, ResolvedGraph, binary_path, resolve_entry,
};
