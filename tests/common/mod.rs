// Shared fakes for the integration tests.
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use meeting_continuity::store::StoreChange;
use meeting_continuity::{
    CaptureCommand, CaptureDevice, CaptureFactory, ChannelNotifier, InFlightRegistry,
    KeyValueStore, ManualClock, MeetingStatusUpdater, MeetingView, MemoryOrigin,
    MinutesGenerator, Notice, SessionConfig, Transition, ViewDeps,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// 2025-10-27T14:30:00Z
pub const T0: i64 = 1_761_575_400_000;

pub const WAIT: Duration = Duration::from_secs(2);

/// Receive the next item or fail the test after `WAIT`
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for item")
        .expect("channel closed")
}

/// Assert nothing arrives within a short grace period
pub async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    let result = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(result.is_err(), "unexpected item: {:?}", result);
}

/// Receive the next transition or fail the test after `WAIT`
pub async fn next_transition(rx: &mut mpsc::UnboundedReceiver<Transition>) -> Transition {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for transition")
        .expect("controller dropped")
}

/// Session config with a display tick slow enough to stay out of the way
pub fn config(meeting_id: &str, user_id: &str, host_id: &str) -> SessionConfig {
    SessionConfig::new(meeting_id, user_id, host_id).with_tick_interval(Duration::from_secs(60))
}

/// Calls made to scripted capture devices, with failure switches
#[derive(Clone, Default)]
pub struct CaptureScript {
    calls: Arc<Mutex<Vec<CaptureCommand>>>,
    failing: Arc<Mutex<HashSet<CaptureCommand>>>,
    held: Arc<Mutex<Option<(CaptureCommand, Arc<Semaphore>)>>>,
}

impl CaptureScript {
    pub fn calls(&self) -> Vec<CaptureCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: CaptureCommand) -> usize {
        self.calls().iter().filter(|c| **c == command).count()
    }

    pub fn fail(&self, command: CaptureCommand) {
        self.failing.lock().unwrap().insert(command);
    }

    pub fn heal(&self, command: CaptureCommand) {
        self.failing.lock().unwrap().remove(&command);
    }

    pub fn device(&self) -> ScriptedCapture {
        ScriptedCapture {
            script: self.clone(),
        }
    }

    /// Make `command` block inside the device until the returned gate gets a permit
    pub fn hold(&self, command: CaptureCommand) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.held.lock().unwrap() = Some((command, gate.clone()));
        gate
    }

    /// Wait until the device has been asked for `command` `times` times
    pub async fn wait_for(&self, command: CaptureCommand, times: usize) {
        tokio::time::timeout(WAIT, async {
            while self.count(command) < times {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("capture command never issued");
    }

    async fn record(&self, command: CaptureCommand) -> Result<()> {
        self.calls.lock().unwrap().push(command);

        let gate = self
            .held
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(held, _)| *held == command)
            .map(|(_, gate)| gate.clone());
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }

        if self.failing.lock().unwrap().contains(&command) {
            anyhow::bail!("microphone unavailable");
        }
        Ok(())
    }
}

pub struct ScriptedCapture {
    script: CaptureScript,
}

#[async_trait::async_trait]
impl CaptureDevice for ScriptedCapture {
    async fn start(&mut self) -> Result<()> {
        self.script.record(CaptureCommand::Start).await
    }

    async fn pause(&mut self) -> Result<()> {
        self.script.record(CaptureCommand::Pause).await
    }

    async fn resume(&mut self) -> Result<()> {
        self.script.record(CaptureCommand::Resume).await
    }

    async fn stop(&mut self) -> Result<()> {
        self.script.record(CaptureCommand::Stop).await
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

impl CaptureFactory for CaptureScript {
    fn create(&self, _meeting_id: &str) -> Result<Box<dyn CaptureDevice>> {
        Ok(Box::new(self.device()))
    }
}

/// Minutes generator reporting each call on a channel
pub struct ChannelGenerator {
    calls: mpsc::UnboundedSender<(String, u64)>,
    failure: Mutex<Option<String>>,
}

impl ChannelGenerator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, u64)>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (
            Self {
                calls,
                failure: Mutex::new(None),
            },
            rx,
        )
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait::async_trait]
impl MinutesGenerator for ChannelGenerator {
    async fn generate(&self, meeting_id: &str, elapsed_seconds: u64) -> Result<String> {
        let _ = self.calls.send((meeting_id.to_string(), elapsed_seconds));
        if let Some(message) = self.failure.lock().unwrap().clone() {
            anyhow::bail!("{}", message);
        }
        Ok(format!("Minutes for {} ({}s)", meeting_id, elapsed_seconds))
    }
}

/// Status updater reporting each completion on a channel
pub struct ChannelStatus {
    calls: mpsc::UnboundedSender<(String, DateTime<Utc>)>,
}

impl ChannelStatus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, DateTime<Utc>)>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Self { calls }, rx)
    }
}

#[async_trait::async_trait]
impl MeetingStatusUpdater for ChannelStatus {
    async fn mark_completed(&self, meeting_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        let _ = self.calls.send((meeting_id.to_string(), ended_at));
        Ok(())
    }
}

/// Store whose every operation fails, like a disabled or full browser store
pub struct BrokenStore;

#[async_trait::async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        anyhow::bail!("storage disabled")
    }

    async fn set(&self, _key: &str, _value: String) -> Result<()> {
        anyhow::bail!("quota exceeded")
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        anyhow::bail!("storage disabled")
    }

    async fn watch(&self, _key: &str) -> Result<mpsc::Receiver<StoreChange>> {
        anyhow::bail!("storage disabled")
    }

    fn tab_id(&self) -> &str {
        "broken"
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// One tab on a shared origin, with its own fakes and observation channels
pub struct Tab {
    pub deps: ViewDeps,
    pub capture: CaptureScript,
    pub generator: Arc<ChannelGenerator>,
    pub minutes_calls: mpsc::UnboundedReceiver<(String, u64)>,
    pub completed: mpsc::UnboundedReceiver<(String, DateTime<Utc>)>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

impl Tab {
    pub async fn mount(&self, config: SessionConfig) -> MeetingView {
        MeetingView::mount(config, &self.deps).await.unwrap()
    }

    pub fn open(origin: &MemoryOrigin, clock: &Arc<ManualClock>) -> Self {
        Self::with_store(Arc::new(origin.tab()), clock, InFlightRegistry::new())
    }

    pub fn with_store(
        store: Arc<dyn KeyValueStore>,
        clock: &Arc<ManualClock>,
        in_flight: InFlightRegistry,
    ) -> Self {
        let capture = CaptureScript::default();
        let (generator, minutes_calls) = ChannelGenerator::new();
        let generator = Arc::new(generator);
        let (status, completed) = ChannelStatus::new();
        let (notifier, notices) = ChannelNotifier::new();

        let deps = ViewDeps {
            store,
            capture: Arc::new(capture.clone()),
            generator: generator.clone(),
            status: Arc::new(status),
            notifier: Arc::new(notifier),
            clock: clock.clone(),
            in_flight,
        };

        Self {
            deps,
            capture,
            generator,
            minutes_calls,
            completed,
            notices,
        }
    }
}
