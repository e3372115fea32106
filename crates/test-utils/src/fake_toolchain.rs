use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use rerun::exec::{FailureKind, Stage, StageFlags, StageResult, Toolchain};

/// One recorded toolchain call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: Stage,
    pub module: String,
    pub flags: StageFlags,
}

/// A fake toolchain that:
/// - records every stage invocation
/// - replays scripted results per stage, in order
/// - passes with empty output once a stage's script runs out
///
/// Clones share the script and the log, so a test can keep one clone while
/// the pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeToolchain {
    script: Arc<Mutex<HashMap<Stage, VecDeque<StageResult>>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for its stage.
    pub fn push(&self, result: StageResult) {
        self.script
            .lock()
            .unwrap()
            .entry(result.stage)
            .or_default()
            .push_back(result);
    }

    /// Queue a compile failure with `output` for `stage`.
    pub fn fail_next(&self, stage: Stage, output: &str) {
        self.push(StageResult::failed(stage, FailureKind::Compile, output));
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.calls.lock().unwrap().iter().map(|c| c.stage).collect()
    }
}

impl Toolchain for FakeToolchain {
    fn run_stage(
        &self,
        stage: Stage,
        module: &str,
        flags: StageFlags,
    ) -> Pin<Box<dyn Future<Output = StageResult> + Send + '_>> {
        let module = module.to_string();

        Box::pin(async move {
            self.calls.lock().unwrap().push(Invocation {
                stage,
                module,
                flags,
            });

            let scripted = self
                .script
                .lock()
                .unwrap()
                .get_mut(&stage)
                .and_then(|queue| queue.pop_front());

            scripted.unwrap_or_else(|| StageResult::passed(stage, ""))
        })
    }
}
