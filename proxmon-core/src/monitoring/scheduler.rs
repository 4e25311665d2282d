//! Poll scheduler
//!
//! A single tokio task owns the refresh timer, the in-flight poll slot and
//! the display sink. Timer ticks, setting changes, poll-now requests and
//! poll completions are all handled in one `select!` loop, so there is
//! never more than one poll outstanding and the sink is only touched from
//! one place.
//!
//! Requests that arrive while a poll is in flight are dropped, not queued.
//! Stopping the scheduler abandons an in-flight poll; its result is never
//! published.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::Instrument;

use super::classifier::{AlertClassifier, DisplayState, Unavailable};
use super::metrics::HealthRecord;
use super::parser::PayloadParser;
use super::settings::{MonitorConfig, Placement, interval_from_setting};
use super::ssh_exec::RemoteExecutor;
use super::watcher::{ConfigWatcher, Reaction};
use crate::display::{DisplayProjector, DisplaySink};
use crate::error::{PayloadError, PollError};
use crate::settings::{SettingKey, SettingsStore};
use crate::tracing::span_names;

/// Where the health script is installed on the remote host
pub const REMOTE_SCRIPT_PATH: &str = "/tmp/proxmox-monitor.sh";

/// Command that prints one JSON health payload
pub const HEALTH_COMMAND: &str = "bash /tmp/proxmox-monitor.sh";

impl PollError {
    /// Maps a failed poll to what the display should show
    #[must_use]
    pub fn display_state(&self) -> DisplayState {
        match self {
            Self::NotConfigured(missing) => Unavailable::NotConfigured(missing.clone()).into(),
            Self::Transport(_) | Self::Payload(PayloadError::EmptyOutput) => {
                Unavailable::Offline.into()
            }
            Self::Payload(PayloadError::Malformed(detail)) => {
                Unavailable::DataError(detail.clone()).into()
            }
        }
    }
}

/// Runs one poll: remote call, then decode.
///
/// Makes no remote call when host or username is missing.
///
/// # Errors
///
/// Returns [`PollError`] when the config is incomplete, the remote call
/// fails, or the output cannot be decoded.
pub async fn poll_once(
    executor: &dyn RemoteExecutor,
    command: &str,
    config: &MonitorConfig,
) -> Result<HealthRecord, PollError> {
    let missing = config.missing_fields();
    if !missing.is_empty() {
        return Err(PollError::NotConfigured(missing));
    }

    let output = executor
        .execute(command, config)
        .instrument(tracing::debug_span!(span_names::REMOTE_EXECUTE))
        .await?;
    let stdout = output.into_stdout()?;
    Ok(PayloadParser::parse(&stdout)?)
}

/// Runs one poll and classifies the outcome
pub async fn poll_state(
    executor: &dyn RemoteExecutor,
    command: &str,
    config: &MonitorConfig,
) -> DisplayState {
    match poll_once(executor, command, config).await {
        Ok(record) => {
            tracing::debug!(hostname = %record.hostname, "Health record received");
            AlertClassifier::classify(&record)
        }
        Err(err) => {
            match &err {
                PollError::Transport(e) => tracing::warn!(error = %e, "SSH poll failed"),
                PollError::Payload(PayloadError::EmptyOutput) => {
                    tracing::info!("Empty SSH output");
                }
                PollError::Payload(PayloadError::Malformed(detail)) => {
                    tracing::error!(error = %detail, "Failed to decode health payload");
                }
                PollError::NotConfigured(missing) => {
                    tracing::debug!(?missing, "Monitor not configured");
                }
            }
            err.display_state()
        }
    }
}

/// What the scheduler is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Waiting for the next trigger
    Idle,
    /// A poll is in flight
    Polling,
    /// The last trigger found host or username missing; ticks keep
    /// arriving but make no remote call
    Disabled,
    /// The loop has exited
    Stopped,
}

#[derive(Debug)]
enum SchedulerCommand {
    Reschedule(u32),
    PollNow,
    Reposition(Placement),
    Stop,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Timer,
    SettingChange,
    Manual,
}

/// Handle to a running scheduler
///
/// Dropping the handle stops the scheduler.
#[derive(Debug)]
pub struct MonitorHandle {
    command_tx: mpsc::UnboundedSender<SchedulerCommand>,
    state_rx: watch::Receiver<Option<DisplayState>>,
    phase_rx: watch::Receiver<SchedulerPhase>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Restarts the timer at `secs` (clamped to the allowed range).
    ///
    /// The next tick is one full period after this call. A poll in flight
    /// is not affected.
    pub fn reschedule(&self, secs: u32) {
        self.send(SchedulerCommand::Reschedule(secs));
    }

    /// Requests an immediate poll; ignored while one is in flight
    pub fn poll_now(&self) {
        self.send(SchedulerCommand::PollNow);
    }

    /// Moves the indicator and redraws the last state without polling
    pub fn reposition(&self, placement: Placement) {
        self.send(SchedulerCommand::Reposition(placement));
    }

    /// Stops the scheduler. Safe to call more than once.
    pub fn stop(&self) {
        self.send(SchedulerCommand::Stop);
    }

    fn send(&self, command: SchedulerCommand) {
        // The loop may already have exited
        let _ = self.command_tx.send(command);
    }

    /// Returns the most recently published state
    #[must_use]
    pub fn latest(&self) -> Option<DisplayState> {
        self.state_rx.borrow().clone()
    }

    /// Returns a receiver that observes every published state
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<Option<DisplayState>> {
        self.state_rx.clone()
    }

    /// Returns the current phase
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        *self.phase_rx.borrow()
    }

    /// Returns whether the loop has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the scheduler and waits for the loop to exit
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Poll scheduler task failed");
        }
    }
}

/// Periodic health poller
///
/// Build with [`PollScheduler::new`] and launch with
/// [`PollScheduler::start`] from inside a tokio runtime.
pub struct PollScheduler<S> {
    store: Arc<dyn SettingsStore>,
    executor: Arc<dyn RemoteExecutor>,
    sink: S,
    command: String,
}

impl<S: DisplaySink + 'static> PollScheduler<S> {
    /// Creates a scheduler that runs [`HEALTH_COMMAND`]
    pub fn new(store: Arc<dyn SettingsStore>, executor: Arc<dyn RemoteExecutor>, sink: S) -> Self {
        Self {
            store,
            executor,
            sink,
            command: HEALTH_COMMAND.to_string(),
        }
    }

    /// Overrides the remote command
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Spawns the scheduler loop.
    ///
    /// The indicator is placed and shows the loading label, and the first
    /// poll starts immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(self) -> MonitorHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(None);
        let (phase_tx, phase_rx) = watch::channel(SchedulerPhase::Idle);
        // Subscribe before spawning so changes made right after start()
        // are not missed
        let changes = self.store.subscribe();

        let worker = SchedulerLoop {
            store: self.store,
            executor: self.executor,
            sink: self.sink,
            projector: DisplayProjector::new(),
            command: self.command,
            state_tx,
            phase_tx,
            in_flight: None,
        };
        let task = tokio::spawn(worker.run(command_rx, changes));

        MonitorHandle {
            command_tx,
            state_rx,
            phase_rx,
            task,
        }
    }
}

/// Starts a scheduler running [`HEALTH_COMMAND`]
pub fn start_monitor<S: DisplaySink + 'static>(
    store: Arc<dyn SettingsStore>,
    executor: Arc<dyn RemoteExecutor>,
    sink: S,
) -> MonitorHandle {
    PollScheduler::new(store, executor, sink).start()
}

struct SchedulerLoop<S> {
    store: Arc<dyn SettingsStore>,
    executor: Arc<dyn RemoteExecutor>,
    sink: S,
    projector: DisplayProjector,
    command: String,
    state_tx: watch::Sender<Option<DisplayState>>,
    phase_tx: watch::Sender<SchedulerPhase>,
    in_flight: Option<JoinHandle<DisplayState>>,
}

impl<S: DisplaySink + 'static> SchedulerLoop<S> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SchedulerCommand>,
        mut changes: broadcast::Receiver<SettingKey>,
    ) {
        let config = MonitorConfig::from_store(self.store.as_ref());
        self.projector
            .reposition(config.placement, None, &mut self.sink);

        let mut ticker = ticker_starting_at(Instant::now(), config.refresh_interval());
        let mut watching = true;

        tracing::info!(
            host = %config.host,
            interval_secs = config.refresh_interval_secs,
            placement = %config.placement,
            "Poll scheduler started"
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SchedulerCommand::Reschedule(secs)) => {
                        ticker = self.reschedule(secs);
                    }
                    Some(SchedulerCommand::PollNow) => self.trigger(Trigger::Manual),
                    Some(SchedulerCommand::Reposition(placement)) => self.reposition(placement),
                    Some(SchedulerCommand::Stop) | None => break,
                },
                change = changes.recv(), if watching => match change {
                    Ok(key) => self.on_setting_changed(key, &mut ticker),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Setting changes lagged, re-reading all settings");
                        for key in [
                            SettingKey::Placement,
                            SettingKey::RefreshInterval,
                            SettingKey::ServerHost,
                        ] {
                            self.on_setting_changed(key, &mut ticker);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("Settings store closed, no longer watching");
                        watching = false;
                    }
                },
                _ = ticker.tick() => self.trigger(Trigger::Timer),
                finished = wait_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.complete(finished);
                }
            }
        }

        if self.in_flight.take().is_some() {
            tracing::debug!("Abandoning in-flight poll");
        }
        self.phase_tx.send_replace(SchedulerPhase::Stopped);
        tracing::info!("Poll scheduler stopped");
    }

    fn trigger(&mut self, trigger: Trigger) {
        if self.in_flight.is_some() {
            tracing::debug!(?trigger, "Poll already in flight, dropping trigger");
            return;
        }

        let config = MonitorConfig::from_store(self.store.as_ref());
        let missing = config.missing_fields();
        if !missing.is_empty() {
            tracing::debug!(?trigger, ?missing, "Monitor not configured, skipping poll");
            self.phase_tx.send_replace(SchedulerPhase::Disabled);
            self.publish(Unavailable::NotConfigured(missing).into());
            return;
        }

        let span = tracing::info_span!(
            span_names::POLL_CYCLE,
            host = %config.host,
            port = config.port,
            ?trigger
        );
        let executor = Arc::clone(&self.executor);
        let command = self.command.clone();

        self.phase_tx.send_replace(SchedulerPhase::Polling);
        self.in_flight = Some(tokio::spawn(
            async move { poll_state(executor.as_ref(), &command, &config).await }.instrument(span),
        ));
    }

    fn complete(&mut self, finished: Result<DisplayState, JoinError>) {
        self.phase_tx.send_replace(SchedulerPhase::Idle);
        let state = finished.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Poll task failed");
            Unavailable::NoData.into()
        });
        self.publish(state);
    }

    fn publish(&mut self, state: DisplayState) {
        self.projector.project(Some(&state), &mut self.sink);
        self.state_tx.send_replace(Some(state));
    }

    fn reposition(&mut self, placement: Placement) {
        tracing::info!(%placement, "Repositioning indicator");
        let last = self.state_tx.borrow().clone();
        self.projector
            .reposition(placement, last.as_ref(), &mut self.sink);
    }

    fn reschedule(&self, secs: u32) -> Interval {
        let secs = interval_from_setting(i64::from(secs));
        tracing::info!(interval_secs = secs, "Refresh interval changed");
        let period = Duration::from_secs(u64::from(secs));
        ticker_starting_at(Instant::now() + period, period)
    }

    fn on_setting_changed(&mut self, key: SettingKey, ticker: &mut Interval) {
        let config = MonitorConfig::from_store(self.store.as_ref());
        match ConfigWatcher::on_change(key, &config) {
            Some(Reaction::Reposition(placement)) => self.reposition(placement),
            Some(Reaction::Reschedule(secs)) => *ticker = self.reschedule(secs),
            Some(Reaction::PollNow) => self.trigger(Trigger::SettingChange),
            None => {}
        }
    }
}

fn ticker_starting_at(start: Instant, period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn wait_in_flight(
    slot: &mut Option<JoinHandle<DisplayState>>,
) -> Result<DisplayState, JoinError> {
    match slot {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
