// src/exec/supervisor.rs

//! Process supervisor.
//!
//! Owns the single child process representing the running program. All
//! signalling, waiting and spawning happens on the supervisor's own task;
//! other components only send it control messages through a
//! [`SupervisorHandle`], so at most one stop/start transition is ever in
//! flight and two children never overlap.
//!
//! State machine:
//!
//! ```text
//! NoProcess -> Starting -> Running -> Stopping(Graceful) -> NoProcess
//!                                          |
//!                                          +-> Stopping(Forced) -> NoProcess
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::errors::{RerunError, Result};

/// Phase of a stop transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPhase {
    /// Interrupt sent, waiting up to the grace period.
    Graceful,
    /// Killed, waiting for the exit to be reaped.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NoProcess,
    Starting,
    Running { pid: u32 },
    Stopping(StopPhase),
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::NoProcess => f.write_str("no process"),
            SupervisorState::Starting => f.write_str("starting"),
            SupervisorState::Running { pid } => write!(f, "running (pid {pid})"),
            SupervisorState::Stopping(StopPhase::Graceful) => f.write_str("stopping (graceful)"),
            SupervisorState::Stopping(StopPhase::Forced) => f.write_str("stopping (forced)"),
        }
    }
}

/// Program to (re)start: the installed binary and the forwarded arguments.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    /// When false, restart requests are accepted but never start a process.
    pub run: bool,
    /// How long to wait for the program to exit after the interrupt.
    pub grace_period: Duration,
}

enum Control {
    Restart,
    Shutdown(oneshot::Sender<()>),
}

/// Seam between the orchestration loop and the supervisor.
///
/// Production code uses [`SupervisorHandle`]; tests can record requests
/// instead of managing real processes.
pub trait ProcessControl: Send {
    /// Stop the current program (if any) and start a fresh one.
    fn request_restart(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop the current program (if any) and end supervision.
    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Cloneable handle to a running supervisor task.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    control_tx: mpsc::Sender<Control>,
    state_rx: watch::Receiver<SupervisorState>,
}

impl SupervisorHandle {
    /// Queue a restart. Safe to call repeatedly; requests are handled one at
    /// a time in order.
    pub async fn restart(&self) -> Result<()> {
        self.control_tx
            .send(Control::Restart)
            .await
            .map_err(|_| RerunError::Process("supervisor is no longer running".to_string()))
    }

    /// Stop the program and wait until it has been reaped.
    ///
    /// Calling this on a supervisor that already stopped is a no-op.
    pub async fn stop(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.control_tx.send(Control::Shutdown(ack_tx)).await.is_err() {
            debug!("supervisor already stopped");
            return Ok(());
        }
        let _ = ack_rx.await;
        Ok(())
    }

    pub fn state(&self) -> SupervisorState {
        *self.state_rx.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state_rx.clone()
    }
}

impl ProcessControl for SupervisorHandle {
    fn request_restart(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.restart().await })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.stop().await })
    }
}

/// Spawn the supervisor task.
///
/// The control queue has depth one: a restart request is only accepted once
/// the previous one has been picked up.
pub fn spawn_supervisor(spec: ProcessSpec, options: SupervisorOptions) -> SupervisorHandle {
    let (control_tx, control_rx) = mpsc::channel::<Control>(1);
    let (state_tx, state_rx) = watch::channel(SupervisorState::NoProcess);

    let supervisor = Supervisor {
        spec,
        options,
        child: None,
        state_tx,
    };
    tokio::spawn(supervisor.run(control_rx));

    SupervisorHandle {
        control_tx,
        state_rx,
    }
}

struct Supervisor {
    spec: ProcessSpec,
    options: SupervisorOptions,
    child: Option<Child>,
    state_tx: watch::Sender<SupervisorState>,
}

enum Step {
    Control(Option<Control>),
    Exited(std::io::Result<ExitStatus>),
}

enum SignalError {
    AlreadyExited,
    Failed(String),
}

impl Supervisor {
    async fn run(mut self, mut control_rx: mpsc::Receiver<Control>) {
        debug!(
            program = %self.spec.program.display(),
            run = self.options.run,
            "supervisor started"
        );

        loop {
            let step = tokio::select! {
                control = control_rx.recv() => Step::Control(control),
                status = wait_child(&mut self.child) => Step::Exited(status),
            };

            match step {
                Step::Control(Some(Control::Restart)) => self.restart().await,
                Step::Control(Some(Control::Shutdown(ack))) => {
                    self.stop().await;
                    let _ = ack.send(());
                    break;
                }
                Step::Control(None) => {
                    self.stop().await;
                    break;
                }
                Step::Exited(status) => {
                    self.child = None;
                    match status {
                        Ok(status) => info!(%status, "program exited"),
                        Err(e) => warn!(error = %e, "waiting for program failed"),
                    }
                    self.set_state(SupervisorState::NoProcess);
                }
            }
        }

        debug!("supervisor finished");
    }

    async fn restart(&mut self) {
        self.stop().await;

        if !self.options.run {
            debug!("no-run mode; not starting the program");
            return;
        }

        self.start();
    }

    fn start(&mut self) {
        self.set_state(SupervisorState::Starting);
        info!(
            "running {} [{}]",
            self.spec.program.display(),
            self.spec.args.join(" ")
        );

        let mut cmd = Command::new(&self.spec.program);
        cmd.args(&self.spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        match cmd.spawn() {
            Ok(child) => {
                let pid = child.id().unwrap_or_default();
                self.child = Some(child);
                self.set_state(SupervisorState::Running { pid });
            }
            Err(e) => {
                let err = RerunError::Process(format!(
                    "starting {}: {e}",
                    self.spec.program.display()
                ));
                error!(error = %err, "error on starting process");
                self.set_state(SupervisorState::NoProcess);
            }
        }
    }

    /// Interrupt, wait up to the grace period, then kill. Returns once the
    /// child has been reaped.
    async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = child.id();
        self.set_state(SupervisorState::Stopping(StopPhase::Graceful));

        let interrupted = match send_interrupt(&child) {
            Ok(()) => true,
            Err(SignalError::AlreadyExited) => {
                debug!(?pid, "program already exited");
                true
            }
            Err(SignalError::Failed(reason)) => {
                warn!(
                    ?pid,
                    error = %reason,
                    "error sending interrupt; will now hard-kill the process"
                );
                false
            }
        };

        if interrupted {
            match tokio::time::timeout(self.options.grace_period, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(?pid, %status, "program stopped");
                    self.set_state(SupervisorState::NoProcess);
                    return;
                }
                Ok(Err(e)) => {
                    warn!(?pid, error = %e, "waiting for program failed; killing it");
                }
                Err(_) => {
                    warn!(
                        ?pid,
                        grace_period = ?self.options.grace_period,
                        "program did not exit within the grace period; killing it"
                    );
                }
            }
        }

        self.set_state(SupervisorState::Stopping(StopPhase::Forced));
        if let Err(e) = child.kill().await {
            warn!(?pid, error = %e, "failed to kill program");
        }
        match child.wait().await {
            Ok(status) => info!(?pid, %status, "program killed"),
            Err(e) => warn!(?pid, error = %e, "reaping killed program failed"),
        }

        self.set_state(SupervisorState::NoProcess);
    }

    fn set_state(&self, state: SupervisorState) {
        debug!(%state, "supervisor state");
        self.state_tx.send_replace(state);
    }
}

async fn wait_child(child: &mut Option<Child>) -> std::io::Result<ExitStatus> {
    match child {
        Some(child) => child.wait().await,
        None => std::future::pending().await,
    }
}

#[cfg(unix)]
fn send_interrupt(child: &Child) -> std::result::Result<(), SignalError> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Err(SignalError::AlreadyExited);
    };

    match kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(SignalError::AlreadyExited),
        Err(e) => Err(SignalError::Failed(e.to_string())),
    }
}

#[cfg(not(unix))]
fn send_interrupt(child: &Child) -> std::result::Result<(), SignalError> {
    if child.id().is_none() {
        return Err(SignalError::AlreadyExited);
    }
    Err(SignalError::Failed(
        "interrupt signals are not supported on this platform".to_string(),
    ))
}
