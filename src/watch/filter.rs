// src/watch/filter.rs

use std::path::Path;

use globset::GlobSet;

use crate::config::validate::compile_globs;
use crate::errors::Result;

/// Decides which changed paths count as source changes.
///
/// A path is significant when it matches an `include` pattern and no
/// `exclude` pattern. Patterns are matched against the full path as
/// reported by the event source.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl SourceFilter {
    pub fn new(include: GlobSet, exclude: GlobSet) -> Self {
        Self { include, exclude }
    }

    pub fn from_patterns(include: &[&str], exclude: &[&str]) -> Result<Self> {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        Ok(Self::new(
            compile_globs("watch.include", &include)?,
            compile_globs("watch.exclude", &exclude)?,
        ))
    }

    pub fn is_source(&self, path: &Path) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_sources_pass_and_editor_files_do_not() {
        let filter = SourceFilter::from_patterns(&["*.go"], &["**/.#*"]).unwrap();

        assert!(filter.is_source(Path::new("/home/dev/app/main.go")));
        assert!(filter.is_source(Path::new("handlers.go")));
        assert!(!filter.is_source(Path::new("/home/dev/app/.main.go.swp")));
        assert!(!filter.is_source(Path::new("/home/dev/app/main.go~")));
        assert!(!filter.is_source(Path::new("/home/dev/app/.#main.go")));
        assert!(!filter.is_source(Path::new("/home/dev/app/README.md")));
    }
}
