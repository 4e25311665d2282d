//! Poll scheduler behavior under virtual time
//!
//! Every test runs with the tokio clock paused, so sleeps inside the fake
//! executor and the scheduler's ticker advance deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use proxmon_core::display::LOADING_LABEL;
use proxmon_core::{
    CommandOutput, DisplayState, MemorySettingsStore, MissingField, MonitorConfig, MonitorHandle,
    Placement, PollScheduler, RecordingSink, RemoteExecutor, SchedulerPhase, SettingKey, Severity,
    TransportError, Unavailable,
};
use tokio::time::sleep;

const PAYLOAD: &str = r#"{
  "system_info": {
    "hostname": "proxmox-server-01",
    "uptime": "up 3 days",
    "load": "0.42, 0.37, 0.30",
    "memory_used": 8388608,
    "memory_total": 16777216
  },
  "cpu_temp": 70.0,
  "hdd_temps": [{"drive": "sda", "temp": 36}],
  "timestamp": 1718000000000
}"#;

/// Remote executor that answers every call the same way after `delay`
struct FakeExecutor {
    reply: Result<CommandOutput, u64>,
    delay: Duration,
    calls: AtomicUsize,
    ports: Mutex<Vec<u16>>,
}

impl FakeExecutor {
    fn replying(stdout: &str) -> Self {
        Self {
            reply: Ok(CommandOutput::success(stdout)),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            ports: Mutex::new(Vec::new()),
        }
    }

    fn timing_out() -> Self {
        Self {
            reply: Err(30),
            ..Self::replying("")
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn ports(&self) -> Vec<u16> {
        self.ports.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteExecutor for FakeExecutor {
    async fn execute(
        &self,
        _command: &str,
        config: &MonitorConfig,
    ) -> Result<CommandOutput, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ports.lock().unwrap().push(config.port);
        sleep(self.delay).await;
        self.reply.clone().map_err(TransportError::Timeout)
    }
}

fn configured_store(interval_secs: i64) -> Arc<MemorySettingsStore> {
    let store = MemorySettingsStore::new();
    store.set_string(SettingKey::ServerHost, "pve.lan");
    store.set_string(SettingKey::ServerUsername, "root");
    store.set_int(SettingKey::RefreshInterval, interval_secs);
    Arc::new(store)
}

fn start(
    store: &Arc<MemorySettingsStore>,
    executor: &Arc<FakeExecutor>,
) -> (MonitorHandle, RecordingSink) {
    let sink = RecordingSink::new();
    let handle = PollScheduler::new(store.clone(), executor.clone(), sink.clone()).start();
    (handle, sink)
}

async fn advance(secs: u64) {
    sleep(Duration::from_secs(secs)).await;
}

// ========== Poll Cycle Outcomes ==========

#[tokio::test(start_paused = true)]
async fn test_first_poll_runs_immediately() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD));
    let (handle, sink) = start(&store, &executor);

    advance(1).await;

    assert_eq!(executor.calls(), 1);
    assert_eq!(handle.phase(), SchedulerPhase::Idle);
    let Some(DisplayState::Status(view)) = handle.latest() else {
        panic!("expected a status view, got {:?}", handle.latest());
    };
    assert_eq!(view.label, "proxmox-serv...");
    assert_eq!(view.severity, Severity::Warning);

    let rec = sink.snapshot();
    assert_eq!(rec.labels, vec![LOADING_LABEL, "proxmox-serv..."]);
    assert_eq!(rec.icon, Severity::Warning.icon_name());
    assert_eq!(rec.placements, vec![Placement::Right]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_not_configured_makes_no_remote_call() {
    let store = Arc::new(MemorySettingsStore::new());
    store.set_string(SettingKey::ServerHost, "pve.lan");
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD));
    let (handle, sink) = start(&store, &executor);

    // Default interval is 300s; let several ticks pass
    advance(1000).await;

    assert_eq!(executor.calls(), 0);
    assert_eq!(handle.phase(), SchedulerPhase::Disabled);
    assert_eq!(
        handle.latest(),
        Some(DisplayState::Unavailable(Unavailable::NotConfigured(vec![
            MissingField::Username
        ])))
    );
    assert_eq!(sink.snapshot().label, "Not Configured");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_empty_output_is_offline() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(" \n\t\n"));
    let (handle, sink) = start(&store, &executor);

    advance(1).await;

    assert_eq!(
        handle.latest(),
        Some(DisplayState::Unavailable(Unavailable::Offline))
    );
    let rec = sink.snapshot();
    assert_eq!(rec.label, "Offline");
    assert_eq!(rec.entries.len(), 1);
    assert_eq!(rec.entries[0].text(), "No server data available");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_is_offline() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::timing_out());
    let (handle, _sink) = start(&store, &executor);

    advance(1).await;

    assert_eq!(
        handle.latest(),
        Some(DisplayState::Unavailable(Unavailable::Offline))
    );
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_invalid_json_is_data_error() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying("{\"system_info\": "));
    let (handle, sink) = start(&store, &executor);

    advance(1).await;

    assert!(matches!(
        handle.latest(),
        Some(DisplayState::Unavailable(Unavailable::DataError(_)))
    ));
    assert_eq!(sink.snapshot().label, "Data Error");

    handle.shutdown().await;
}

// ========== Overlap Guard ==========

#[tokio::test(start_paused = true)]
async fn test_overlapping_triggers_are_dropped() {
    let store = configured_store(30);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD).with_delay(Duration::from_secs(45)));
    let (handle, _sink) = start(&store, &executor);

    // t=10: manual request while the first poll is outstanding
    advance(10).await;
    assert_eq!(handle.phase(), SchedulerPhase::Polling);
    handle.poll_now();

    // t=20: a server-key change requests another poll
    advance(10).await;
    store.set_int(SettingKey::ServerPort, 2222);

    // t=50: the tick at t=30 fell inside the window too; first poll is done
    advance(30).await;
    assert_eq!(executor.calls(), 1);
    assert_eq!(handle.phase(), SchedulerPhase::Idle);
    assert!(matches!(handle.latest(), Some(DisplayState::Status(_))));

    // t=65: the next tick after completion polls again
    advance(15).await;
    assert_eq!(executor.calls(), 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_now_when_idle_polls() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD));
    let (handle, _sink) = start(&store, &executor);

    advance(5).await;
    handle.poll_now();
    advance(1).await;

    assert_eq!(executor.calls(), 2);
    handle.shutdown().await;
}

// ========== Rescheduling ==========

#[tokio::test(start_paused = true)]
async fn test_reschedule_measures_from_call_and_keeps_in_flight_poll() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD).with_delay(Duration::from_secs(50)));
    let (handle, _sink) = start(&store, &executor);

    // t=10: interval changes while the first poll is outstanding
    advance(10).await;
    handle.reschedule(60);

    // t=55: the in-flight poll was not cancelled
    advance(45).await;
    assert_eq!(executor.calls(), 1);
    assert!(matches!(handle.latest(), Some(DisplayState::Status(_))));

    // t=65: next tick is t=70, one period after the reschedule call
    advance(10).await;
    assert_eq!(executor.calls(), 1);

    advance(10).await;
    assert_eq!(executor.calls(), 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_interval_setting_change_reschedules() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD));
    let (handle, _sink) = start(&store, &executor);

    advance(100).await;
    assert_eq!(executor.calls(), 1);

    // Out-of-range values are clamped to 30s
    store.set_int(SettingKey::RefreshInterval, 5);

    advance(25).await;
    assert_eq!(executor.calls(), 1);

    advance(10).await;
    assert_eq!(executor.calls(), 2);

    // A reschedule alone never polls
    advance(1).await;
    assert_eq!(executor.calls(), 2);

    handle.shutdown().await;
}

// ========== Setting Reactions ==========

#[tokio::test(start_paused = true)]
async fn test_server_key_change_polls_with_new_settings() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD));
    let (handle, _sink) = start(&store, &executor);

    advance(10).await;
    store.set_int(SettingKey::ServerPort, 2222);
    advance(1).await;

    assert_eq!(executor.ports(), vec![22, 2222]);

    // Setting the same value again is not a change
    store.set_int(SettingKey::ServerPort, 2222);
    advance(1).await;
    assert_eq!(executor.calls(), 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_completing_configuration_enables_polling() {
    let store = Arc::new(MemorySettingsStore::new());
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD));
    let (handle, _sink) = start(&store, &executor);

    advance(1).await;
    assert_eq!(handle.phase(), SchedulerPhase::Disabled);

    store.set_string(SettingKey::ServerHost, "pve.lan");
    advance(1).await;
    assert_eq!(executor.calls(), 0);
    assert_eq!(
        handle.latest(),
        Some(DisplayState::Unavailable(Unavailable::NotConfigured(vec![
            MissingField::Username
        ])))
    );

    store.set_string(SettingKey::ServerUsername, "root");
    advance(1).await;
    assert_eq!(executor.calls(), 1);
    assert_eq!(handle.phase(), SchedulerPhase::Idle);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reposition_does_not_refetch() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD));
    let (handle, sink) = start(&store, &executor);

    advance(1).await;
    handle.reposition(Placement::Left);
    advance(1).await;
    store.set_string(SettingKey::Placement, "center");
    advance(1).await;

    assert_eq!(executor.calls(), 1);
    let rec = sink.snapshot();
    assert_eq!(
        rec.placements,
        vec![Placement::Right, Placement::Left, Placement::Center]
    );
    // Last state is redrawn after each move
    assert_eq!(rec.label, "proxmox-serv...");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reposition_before_first_result_shows_loading() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD).with_delay(Duration::from_secs(20)));
    let (handle, sink) = start(&store, &executor);

    advance(5).await;
    handle.reposition(Placement::Center);
    advance(1).await;

    let rec = sink.snapshot();
    assert_eq!(rec.labels, vec![LOADING_LABEL, LOADING_LABEL]);
    assert_eq!(rec.placements, vec![Placement::Right, Placement::Center]);

    handle.shutdown().await;
}

// ========== Shutdown ==========

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_result() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD).with_delay(Duration::from_secs(100)));
    let (handle, sink) = start(&store, &executor);
    let state_rx = handle.subscribe_state();

    advance(10).await;
    assert_eq!(handle.phase(), SchedulerPhase::Polling);
    handle.shutdown().await;

    // Let the abandoned poll finish
    advance(200).await;

    assert_eq!(executor.calls(), 1);
    assert_eq!(*state_rx.borrow(), None);
    assert_eq!(sink.snapshot().labels, vec![LOADING_LABEL]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let store = configured_store(300);
    let executor = Arc::new(FakeExecutor::replying(PAYLOAD));
    let (handle, _sink) = start(&store, &executor);

    advance(1).await;
    handle.stop();
    handle.stop();
    advance(1).await;

    assert!(handle.is_finished());
    assert_eq!(handle.phase(), SchedulerPhase::Stopped);

    // Setting changes after stop go nowhere
    store.set_int(SettingKey::ServerPort, 2200);
    advance(1).await;
    assert_eq!(executor.calls(), 1);
}
