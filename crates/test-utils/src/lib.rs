//! Shared helpers for rerun's integration tests.

pub mod builders;
pub mod fake_process;
pub mod fake_toolchain;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

pub use builders::{FakeResolver, ModuleGraphBuilder};
pub use fake_process::{FakeProcessControl, ProcessCall};
pub use fake_toolchain::{FakeToolchain, Invocation};

static TRACING: Once = Once::new();

/// Route `tracing` output into the test harness' captured output.
///
/// Filter with `RUST_LOG` (default `rerun=debug,warn`); the harness only
/// shows captured logs for failing tests unless run with `--nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("rerun=debug,warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, failing the test if it takes longer than five seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(Duration::from_secs(5), f).await {
        Ok(value) => value,
        Err(_) => panic!("test timed out after 5 seconds"),
    }
}
