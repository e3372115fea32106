// tests/supervisor.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tokio::sync::watch;
use tokio::time::{Duration, Instant, sleep};

use rerun::exec::{
    ProcessSpec, SupervisorHandle, SupervisorOptions, SupervisorState,
    spawn_supervisor,
};

fn spec(program: &str, args: &[&str]) -> ProcessSpec {
    ProcessSpec {
        program: PathBuf::from(program),
        args: args.iter().map(|s| s.to_string()).collect(),
    }
}

fn options(grace_period: Duration) -> SupervisorOptions {
    SupervisorOptions {
        run: true,
        grace_period,
    }
}

fn is_alive(pid: u32) -> bool {
    !matches!(kill(Pid::from_raw(pid as i32), None), Err(Errno::ESRCH))
}

async fn running_pid(
    states: &mut watch::Receiver<SupervisorState>,
    not: Option<u32>,
) -> u32 {
    let state = with_timeout(states.wait_for(|s| match s {
        SupervisorState::Running { pid } => Some(*pid) != not,
        _ => false,
    }))
    .await
    .unwrap();
    match *state {
        SupervisorState::Running { pid } => pid,
        other => panic!("unexpected state {other}"),
    }
}

/// Record every state the supervisor publishes.
fn record_states(handle: &SupervisorHandle) -> Arc<Mutex<Vec<SupervisorState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut rx = handle.subscribe();
    let sink = Arc::clone(&seen);
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = *rx.borrow_and_update();
            sink.lock().unwrap().push(state);
        }
    });
    seen
}

#[tokio::test]
async fn restart_interrupts_and_reaps_the_old_program_first() {
    init_tracing();
    let supervisor = spawn_supervisor(spec("sleep", &["30"]), options(Duration::from_secs(5)));
    let mut states = supervisor.subscribe();

    supervisor.restart().await.unwrap();
    let first = running_pid(&mut states, None).await;
    assert!(is_alive(first));

    supervisor.restart().await.unwrap();
    let second = running_pid(&mut states, Some(first)).await;

    assert_ne!(first, second);
    assert!(!is_alive(first), "old program still running after restart");
    assert!(is_alive(second));

    supervisor.stop().await.unwrap();
    assert_eq!(supervisor.state(), SupervisorState::NoProcess);
    assert!(!is_alive(second));
}

#[tokio::test]
async fn program_ignoring_the_interrupt_is_killed_after_the_grace_period() {
    init_tracing();
    let grace = Duration::from_millis(300);
    let supervisor = spawn_supervisor(
        spec("sh", &["-c", "trap '' INT; exec sleep 30"]),
        options(grace),
    );
    let mut states = supervisor.subscribe();

    supervisor.restart().await.unwrap();
    let pid = running_pid(&mut states, None).await;
    // Let the shell install its trap before interrupting it.
    sleep(Duration::from_millis(300)).await;

    let started = Instant::now();
    supervisor.stop().await.unwrap();

    assert!(started.elapsed() >= grace);
    assert!(!is_alive(pid));
    assert_eq!(supervisor.state(), SupervisorState::NoProcess);
}

#[tokio::test]
async fn rapid_restarts_never_overlap_two_programs() {
    init_tracing();
    let supervisor = spawn_supervisor(spec("sleep", &["30"]), options(Duration::from_secs(5)));
    let mut states = supervisor.subscribe();

    // Whenever a new program is observed running, every earlier one must
    // already be gone.
    let overlaps = Arc::new(Mutex::new(Vec::new()));
    let pids = Arc::new(Mutex::new(Vec::<u32>::new()));
    {
        let mut rx = supervisor.subscribe();
        let overlaps = Arc::clone(&overlaps);
        let pids = Arc::clone(&pids);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = *rx.borrow_and_update();
                if let SupervisorState::Running { pid } = state {
                    let mut pids = pids.lock().unwrap();
                    for old in pids.iter().filter(|old| is_alive(**old)) {
                        overlaps.lock().unwrap().push((*old, pid));
                    }
                    pids.push(pid);
                }
            }
        });
    }

    supervisor.restart().await.unwrap();
    let first = running_pid(&mut states, None).await;
    for _ in 0..3 {
        supervisor.restart().await.unwrap();
    }
    let last = running_pid(&mut states, Some(first)).await;
    assert!(!is_alive(first));

    supervisor.stop().await.unwrap();
    assert!(!is_alive(last));
    assert!(overlaps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn no_run_mode_never_starts_the_program() {
    let supervisor = spawn_supervisor(
        spec("sleep", &["30"]),
        SupervisorOptions {
            run: false,
            grace_period: Duration::from_secs(1),
        },
    );
    let seen = record_states(&supervisor);

    supervisor.restart().await.unwrap();
    supervisor.restart().await.unwrap();
    supervisor.stop().await.unwrap();

    assert_eq!(supervisor.state(), SupervisorState::NoProcess);
    assert!(
        !seen
            .lock()
            .unwrap()
            .iter()
            .any(|s| matches!(s, SupervisorState::Running { .. }))
    );
}

#[tokio::test]
async fn spawn_failure_leaves_no_process_and_supervision_continues() {
    init_tracing();
    let supervisor = spawn_supervisor(
        spec("/nonexistent/rerun-test-program", &[]),
        options(Duration::from_secs(1)),
    );

    supervisor.restart().await.unwrap();
    // Still accepting requests after the failed start.
    supervisor.restart().await.unwrap();
    supervisor.stop().await.unwrap();

    assert_eq!(supervisor.state(), SupervisorState::NoProcess);
}

#[tokio::test]
async fn program_exiting_on_its_own_is_reaped() {
    let supervisor = spawn_supervisor(
        spec("sh", &["-c", "sleep 0.3"]),
        options(Duration::from_secs(1)),
    );
    let mut states = supervisor.subscribe();

    supervisor.restart().await.unwrap();
    let pid = running_pid(&mut states, None).await;

    with_timeout(states.wait_for(|s| *s == SupervisorState::NoProcess))
        .await
        .unwrap();
    assert!(!is_alive(pid));

    // Stopping with nothing running is fine, and so is stopping twice.
    supervisor.stop().await.unwrap();
    supervisor.stop().await.unwrap();
}
