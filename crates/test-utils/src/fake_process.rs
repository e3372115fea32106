use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use rerun::errors::{RerunError, Result};
use rerun::exec::ProcessControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessCall {
    Restart,
    Shutdown,
}

/// A fake process control that records restart and shutdown requests
/// instead of managing real processes.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessControl {
    calls: Arc<Mutex<Vec<ProcessCall>>>,
    fail_restarts: bool,
}

impl FakeProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every restart request is recorded and then reported as failed.
    pub fn failing() -> Self {
        Self {
            fail_restarts: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn restarts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == ProcessCall::Restart)
            .count()
    }
}

impl ProcessControl for FakeProcessControl {
    fn request_restart(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(ProcessCall::Restart);
            if self.fail_restarts {
                return Err(RerunError::Process("scripted restart failure".to_string()));
            }
            Ok(())
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(ProcessCall::Shutdown);
            Ok(())
        })
    }
}
