use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use xmlls_core::{ExecutableSpec, Notice, Notifier, Result, TracingNotifier, XmlLsError};

use crate::clock::{Clock, SystemClock};
use crate::ledger::{RestartDecision, RestartLedger};
use crate::process::{ProcessSpawner, ServerChannel, TokioSpawner};
use crate::state::ServerState;

/// Display name used in crash-loop reports
pub const DEFAULT_SERVER_NAME: &str = "XML";

/// Runs one server process and restarts it when it dies.
///
/// Every unrequested exit, including a failed spawn, counts as a crash and
/// goes through the [`RestartLedger`]. Each successful start publishes a
/// fresh [`ServerChannel`] on the handle. A stop requested through the
/// handle kills the process, clears the ledger and is never a crash.
pub struct ServerSupervisor {
    name: String,
    spec: ExecutableSpec,
    spawner: Arc<dyn ProcessSpawner>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    ledger: RestartLedger,
    state: watch::Sender<ServerState>,
    channels: mpsc::UnboundedSender<ServerChannel>,
    stop: CancellationToken,
}

/// Control side of a [`ServerSupervisor`]
#[derive(Debug)]
pub struct SupervisorHandle {
    state: watch::Receiver<ServerState>,
    channels: mpsc::UnboundedReceiver<ServerChannel>,
    stop: CancellationToken,
}

impl SupervisorHandle {
    /// Current state
    #[must_use]
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ServerState> {
        self.state.clone()
    }

    /// Wait for the channel of the next started process.
    ///
    /// Returns `None` once the supervisor has finished.
    pub async fn next_channel(&mut self) -> Option<ServerChannel> {
        self.channels.recv().await
    }

    /// Ask the supervisor to stop the server
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Token that stops the supervisor when cancelled
    #[must_use]
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }
}

impl ServerSupervisor {
    /// Builder for a supervisor running `spec`
    pub fn builder(spec: ExecutableSpec) -> SupervisorBuilder {
        SupervisorBuilder::new(spec)
    }

    /// Supervise until stopped or until the restart policy gives up.
    ///
    /// Returns `Ok(())` after a requested stop and
    /// [`XmlLsError::CrashLoop`] when restarts are refused.
    pub async fn run(mut self) -> Result<()> {
        loop {
            if self.stop.is_cancelled() {
                self.stopped();
                return Ok(());
            }

            self.set_state(ServerState::Starting);
            match self.spawner.spawn(&self.spec).await {
                Ok(mut process) => {
                    if let Some(channel) = process.take_channel() {
                        // nobody listening is not a failure of the server
                        let _ = self.channels.send(channel);
                    }
                    self.set_state(ServerState::Running);
                    info!(name = %self.name, pid = ?process.id(), "language server running");

                    let stop_requested = tokio::select! {
                        biased;
                        () = self.stop.cancelled() => true,
                        exit = process.wait() => {
                            match exit {
                                Ok(exit) => warn!(name = %self.name, %exit, "language server exited"),
                                Err(e) => warn!(name = %self.name, error = %e, "lost track of language server"),
                            }
                            false
                        }
                    };
                    if stop_requested {
                        if let Err(e) = process.kill().await {
                            warn!(name = %self.name, error = %e, "failed to kill language server");
                        }
                        self.stopped();
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!(name = %self.name, error = %e, "failed to start language server");
                }
            }

            if self.stop.is_cancelled() {
                self.stopped();
                return Ok(());
            }

            self.set_state(ServerState::Crashed);
            match self.ledger.record_crash(self.clock.now()) {
                RestartDecision::Restart => {
                    info!(name = %self.name, crashes = self.ledger.len(), "restarting language server");
                    self.set_state(ServerState::Restarting);
                }
                RestartDecision::Refuse { crashes, span } => {
                    self.set_state(ServerState::RefusingRestart);
                    let err = XmlLsError::CrashLoop {
                        name: self.name.clone(),
                        crashes,
                        window_secs: self.ledger.window().as_secs(),
                    };
                    warn!(name = %self.name, crashes, span_secs = span.as_secs(), "refusing to restart language server");
                    self.notifier.notify(Notice::error(err.to_string()));
                    self.set_state(ServerState::Stopped);
                    return Err(err);
                }
            }
        }
    }

    fn stopped(&mut self) {
        self.ledger.clear();
        self.set_state(ServerState::Stopped);
        info!(name = %self.name, "language server stopped");
    }

    fn set_state(&self, state: ServerState) {
        self.state.send_replace(state);
    }
}

/// Builder for [`ServerSupervisor`]
pub struct SupervisorBuilder {
    name: String,
    spec: ExecutableSpec,
    spawner: Arc<dyn ProcessSpawner>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    ledger: RestartLedger,
    stop: CancellationToken,
}

impl SupervisorBuilder {
    fn new(spec: ExecutableSpec) -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            spec,
            spawner: Arc::new(TokioSpawner),
            clock: Arc::new(SystemClock),
            notifier: Arc::new(TracingNotifier),
            ledger: RestartLedger::new(),
            stop: CancellationToken::new(),
        }
    }

    /// Display name for reports
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Process spawner
    #[must_use]
    pub fn spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Clock for crash timestamps
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Where crash-loop reports go
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Restart policy
    #[must_use]
    pub fn ledger(mut self, ledger: RestartLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Stop the supervisor when `token` is cancelled
    #[must_use]
    pub fn stop_token(mut self, token: CancellationToken) -> Self {
        self.stop = token;
        self
    }

    /// Build the supervisor and its handle
    pub fn build(self) -> (ServerSupervisor, SupervisorHandle) {
        let (state_tx, state_rx) = watch::channel(ServerState::Stopped);
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();

        let supervisor = ServerSupervisor {
            name: self.name,
            spec: self.spec,
            spawner: self.spawner,
            clock: self.clock,
            notifier: self.notifier,
            ledger: self.ledger,
            state: state_tx,
            channels: channel_tx,
            stop: self.stop.clone(),
        };
        let handle = SupervisorHandle {
            state: state_rx,
            channels: channel_rx,
            stop: self.stop,
        };
        (supervisor, handle)
    }
}
