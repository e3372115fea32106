#![allow(dead_code, unused_imports)]

pub use rerun_test_utils::builders;
pub use rerun_test_utils::{init_tracing, with_timeout};

use rerun::watch::SourceFilter;

/// The default source filter: Go files, minus editor lock files.
pub fn go_filter() -> SourceFilter {
    SourceFilter::from_patterns(&["*.go"], &["**/.#*"]).unwrap()
}
