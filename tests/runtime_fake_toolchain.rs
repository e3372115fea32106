// tests/runtime_fake_toolchain.rs

mod common;
use crate::common::builders::ModuleGraphBuilder;
use crate::common::{init_tracing, with_timeout};

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use rerun::engine::Runtime;
use rerun::exec::{BuildPipeline, PipelineOptions, Stage};
use rerun::resolve::ModuleResolver;
use rerun::types::RebuildTrigger;
use rerun::watch::LocalWatch;
use rerun_test_utils::{FakeProcessControl, FakeToolchain, ProcessCall};

fn trigger(path: &str) -> RebuildTrigger {
    RebuildTrigger {
        path: PathBuf::from(path),
    }
}

#[tokio::test]
async fn initial_cycle_and_one_cycle_per_trigger() {
    init_tracing();
    let toolchain = FakeToolchain::new();
    let process = FakeProcessControl::new();
    let (triggers_tx, triggers_rx) = mpsc::channel(1);

    let runtime = Runtime::new(
        "acme/app",
        BuildPipeline::new(toolchain.clone(), PipelineOptions::default()),
        process.clone(),
        triggers_rx,
    );
    let handle = tokio::spawn(runtime.run());

    triggers_tx.send(trigger("/src/a.go")).await.unwrap();
    triggers_tx.send(trigger("/src/b.go")).await.unwrap();
    drop(triggers_tx);

    with_timeout(handle).await.unwrap().unwrap();

    assert_eq!(toolchain.stages(), vec![Stage::Install; 3]);
    assert_eq!(
        process.calls(),
        vec![
            ProcessCall::Restart,
            ProcessCall::Restart,
            ProcessCall::Restart,
            ProcessCall::Shutdown,
        ]
    );
}

#[tokio::test]
async fn failed_cycle_does_not_restart_and_loop_keeps_going() {
    init_tracing();
    let toolchain = FakeToolchain::new();
    toolchain.fail_next(Stage::Install, "syntax error\n");
    let process = FakeProcessControl::new();
    let (triggers_tx, triggers_rx) = mpsc::channel(1);

    let runtime = Runtime::new(
        "acme/app",
        BuildPipeline::new(toolchain.clone(), PipelineOptions::default()),
        process.clone(),
        triggers_rx,
    );
    let handle = tokio::spawn(runtime.run());

    // First cycle fails, the fix arrives with the next trigger.
    triggers_tx.send(trigger("/src/main.go")).await.unwrap();
    drop(triggers_tx);

    with_timeout(handle).await.unwrap().unwrap();

    assert_eq!(toolchain.stages().len(), 2);
    assert_eq!(process.restarts(), 1);
}

#[tokio::test]
async fn restart_errors_are_not_fatal() {
    let toolchain = FakeToolchain::new();
    let process = FakeProcessControl::failing();
    let (triggers_tx, triggers_rx) = mpsc::channel(1);

    let runtime = Runtime::new(
        "acme/app",
        BuildPipeline::new(toolchain.clone(), PipelineOptions::default()),
        process.clone(),
        triggers_rx,
    );
    let handle = tokio::spawn(runtime.run());

    triggers_tx.send(trigger("/src/main.go")).await.unwrap();
    drop(triggers_tx);

    with_timeout(handle).await.unwrap().unwrap();
    assert_eq!(process.restarts(), 2);
    assert_eq!(process.calls().last(), Some(&ProcessCall::Shutdown));
}

#[tokio::test]
async fn shutdown_request_stops_the_program_and_the_loop() {
    let toolchain = FakeToolchain::new();
    let process = FakeProcessControl::new();
    let (_triggers_tx, triggers_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let runtime = Runtime::new(
        "acme/app",
        BuildPipeline::new(toolchain.clone(), PipelineOptions::default()),
        process.clone(),
        triggers_rx,
    )
    .with_shutdown(shutdown_rx);
    let handle = tokio::spawn(runtime.run());

    shutdown_tx.send(()).await.unwrap();

    with_timeout(handle).await.unwrap().unwrap();
    assert_eq!(process.calls(), vec![ProcessCall::Restart, ProcessCall::Shutdown]);
}

/// Poll `cond` every few milliseconds until it holds.
async fn wait_until(cond: impl Fn() -> bool) {
    with_timeout(async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn watch_set_follows_imports_only_after_a_passing_cycle() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    for module in ["app", "db"] {
        fs::create_dir_all(root.join(module)).unwrap();
    }

    let resolver = Arc::new(
        ModuleGraphBuilder::with_root(&root)
            .executable("app", &[])
            .library("db", &[])
            .build(),
    );
    let entry = resolver.resolve("app").unwrap();
    let (changes_tx, mut changes_rx) = mpsc::channel(64);
    let watch = LocalWatch::start(resolver.clone(), &entry, changes_tx)
        .await
        .unwrap();
    assert_eq!(watch.dirs(), &[root.join("app")]);

    // The new import only shows up in the graph from now on.
    resolver.set_imports("app", &["db"]);

    // Initial cycle fails to install, the first rebuild fails its tests.
    let toolchain = FakeToolchain::new();
    toolchain.fail_next(Stage::Install, "undefined: db\n");
    toolchain.fail_next(Stage::Test, "--- FAIL: TestStore\n");
    let process = FakeProcessControl::new();
    let (triggers_tx, triggers_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let options = PipelineOptions {
        test: true,
        ..PipelineOptions::default()
    };
    let runtime = Runtime::new(
        "app",
        BuildPipeline::new(toolchain.clone(), options),
        process.clone(),
        triggers_rx,
    )
    .with_local_watch(watch)
    .with_shutdown(shutdown_rx);
    let handle = tokio::spawn(runtime.run());

    triggers_tx.send(trigger("/src/app/main.go")).await.unwrap();
    wait_until(|| toolchain.stages().len() >= 3).await;
    assert_eq!(process.restarts(), 0);
    assert_eq!(resolver.graph_calls(), 1);

    triggers_tx.send(trigger("/src/app/main.go")).await.unwrap();
    wait_until(|| resolver.graph_calls() >= 2).await;
    assert_eq!(process.restarts(), 1);

    let file = root.join("db").join("store.go");
    fs::write(&file, "package db\n").unwrap();
    loop {
        let event = with_timeout(changes_rx.recv()).await.unwrap();
        if event.path == file {
            break;
        }
    }

    shutdown_tx.send(()).await.unwrap();
    with_timeout(handle).await.unwrap().unwrap();

    assert_eq!(
        toolchain.stages(),
        vec![
            Stage::Install,
            Stage::Install,
            Stage::Test,
            Stage::Install,
            Stage::Test,
        ]
    );
    // One graph pass at start and one after the single passing cycle.
    assert_eq!(resolver.graph_calls(), 2);
}
