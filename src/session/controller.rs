use super::config::SessionConfig;
use super::elapsed::{elapsed_seconds, format_elapsed};
use super::model::{RecordingSession, RecordingState};
use super::transition::{Transition, TransitionSource};
use crate::capture::{self, CaptureCommand, CaptureDevice};
use crate::clock::Clock;
use crate::error::SessionError;
use crate::notice::{Notice, Notifier};
use crate::store::{PersistedSessionRecord, PersistedSessionStore};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Snapshot of a controller for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub meeting_id: String,
    pub state: RecordingState,
    pub owner: bool,
    pub capture_attached: bool,
    pub elapsed_seconds: u64,
    pub clock: String,
}

#[derive(Debug)]
struct ControllerState {
    session: RecordingSession,
    /// This tab drives the capture device for the active session
    owner: bool,
    /// The capture device was started for the active session
    capture_attached: bool,
}

/// State machine for one meeting's recording in this tab
///
/// idle → recording ⇄ paused → stopped. Each transition calls the capture
/// device first, then updates the in-memory session, then persists it.
/// A failed capture call aborts the transition.
#[derive(Clone)]
pub struct RecordingSessionController {
    meeting_id: String,
    state: Arc<Mutex<ControllerState>>,

    /// Held for the whole of a transition; serializes transitions in this tab
    capture: Arc<Mutex<Box<dyn CaptureDevice>>>,

    store: PersistedSessionStore,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    /// One unbounded queue per observer, so a slow observer never loses a stop
    observers: Arc<StdMutex<Vec<mpsc::UnboundedSender<Transition>>>>,
    display: Arc<watch::Sender<u64>>,
    ticker: Arc<StdMutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl RecordingSessionController {
    pub fn new(
        config: &SessionConfig,
        capture: Box<dyn CaptureDevice>,
        store: PersistedSessionStore,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (display, _) = watch::channel(0);

        Self {
            meeting_id: config.meeting_id.clone(),
            state: Arc::new(Mutex::new(ControllerState {
                session: RecordingSession::idle(config.meeting_id.clone()),
                owner: false,
                capture_attached: false,
            })),
            capture: Arc::new(Mutex::new(capture)),
            store,
            clock,
            notifier,
            observers: Arc::new(StdMutex::new(Vec::new())),
            display: Arc::new(display),
            ticker: Arc::new(StdMutex::new(None)),
            tick_interval: config.tick_interval,
        }
    }

    pub fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    pub fn store(&self) -> &PersistedSessionStore {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Observe every state change of this controller
    pub fn subscribe_transitions(&self) -> mpsc::UnboundedReceiver<Transition> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock_unpoisoned(&self.observers).push(tx);
        rx
    }

    /// Elapsed seconds as last published by the display ticker
    pub fn display(&self) -> watch::Receiver<u64> {
        self.display.subscribe()
    }

    pub async fn snapshot(&self) -> RecordingSession {
        self.state.lock().await.session.clone()
    }

    pub async fn is_owner(&self) -> bool {
        self.state.lock().await.owner
    }

    pub async fn elapsed_seconds(&self) -> u64 {
        let state = self.state.lock().await;
        elapsed_seconds(&state.session, self.clock.now_ms())
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.state.lock().await;
        let elapsed = elapsed_seconds(&state.session, self.clock.now_ms());

        SessionStatus {
            meeting_id: self.meeting_id.clone(),
            state: state.session.state,
            owner: state.owner,
            capture_attached: state.capture_attached,
            elapsed_seconds: elapsed,
            clock: format_elapsed(elapsed),
        }
    }

    /// Begin a new recording; this tab becomes the owner
    pub async fn start(&self) -> Result<Transition, SessionError> {
        self.required(CaptureCommand::Start).await
    }

    pub async fn pause(&self) -> Result<Transition, SessionError> {
        self.required(CaptureCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<Transition, SessionError> {
        self.required(CaptureCommand::Resume).await
    }

    /// End the recording. Stopping an idle or stopped session does nothing
    /// and returns `None`.
    pub async fn stop(&self) -> Result<Option<Transition>, SessionError> {
        self.transition(CaptureCommand::Stop).await
    }

    async fn required(&self, command: CaptureCommand) -> Result<Transition, SessionError> {
        match self.transition(command).await? {
            Some(transition) => Ok(transition),
            None => Err(SessionError::InvalidTransition {
                command,
                from: self.snapshot().await.state,
            }),
        }
    }

    async fn transition(&self, command: CaptureCommand) -> Result<Option<Transition>, SessionError> {
        let mut device = self.capture.lock().await;

        let (from, owner, attached) = {
            let state = self.state.lock().await;
            (state.session.state, state.owner, state.capture_attached)
        };

        match (command, from) {
            (CaptureCommand::Stop, RecordingState::Idle | RecordingState::Stopped) => {
                debug!("Stop ignored for meeting {}: session is {}", self.meeting_id, from);
                return Ok(None);
            }
            (CaptureCommand::Start, RecordingState::Idle | RecordingState::Stopped) => {}
            (CaptureCommand::Pause, RecordingState::Recording)
            | (CaptureCommand::Resume, RecordingState::Paused)
            | (CaptureCommand::Stop, RecordingState::Recording | RecordingState::Paused) => {
                if !owner {
                    return Err(SessionError::NotOwner {
                        meeting_id: self.meeting_id.clone(),
                    });
                }
            }
            _ => return Err(SessionError::InvalidTransition { command, from }),
        }

        // A detached session (capture failed to restart) only moves the timer
        if command == CaptureCommand::Start || attached {
            if let Err(e) = capture::invoke(&mut **device, command).await {
                error!(
                    "Capture device {} failed to {} for meeting {}: {:#}",
                    device.name(),
                    command,
                    self.meeting_id,
                    e
                );
                self.notify(Notice::CaptureFailed {
                    meeting_id: self.meeting_id.clone(),
                    command,
                    error: format!("{:#}", e),
                });
                return Err(SessionError::Capture { command, source: e });
            }
        } else {
            warn!(
                "Capture detached for meeting {}, {} applies to the timer only",
                self.meeting_id, command
            );
        }

        let now = self.clock.now_ms();
        let (transition, session) = {
            let mut state = self.state.lock().await;

            // Another tab's write may have been adopted while the device was busy
            if state.session.state != from {
                warn!(
                    "Meeting {} changed from {} to {} during {}, discarding it",
                    self.meeting_id, from, state.session.state, command
                );
                return Err(SessionError::InvalidTransition {
                    command,
                    from: state.session.state,
                });
            }

            let elapsed_before = elapsed_seconds(&state.session, now);

            match command {
                CaptureCommand::Start => {
                    state.session.begin(now);
                    state.owner = true;
                    state.capture_attached = true;
                }
                CaptureCommand::Pause => state.session.pause(now),
                CaptureCommand::Resume => state.session.resume(now),
                CaptureCommand::Stop => state.session.finish(),
            }
            state.session.last_write_at = now;

            let elapsed = match command {
                CaptureCommand::Stop => elapsed_before,
                _ => elapsed_seconds(&state.session, now),
            };
            let transition = Transition {
                meeting_id: self.meeting_id.clone(),
                from,
                to: state.session.state,
                source: TransitionSource::Local,
                owned: true,
                elapsed_seconds: elapsed,
                at: now,
            };

            if command == CaptureCommand::Stop {
                state.owner = false;
                state.capture_attached = false;
            }

            (transition, state.session.clone())
        };

        if command == CaptureCommand::Stop {
            self.store.remove(&self.meeting_id).await;
        } else {
            let record = PersistedSessionRecord::from_session(&session, self.store.tab_id());
            self.store.write(&self.meeting_id, &record).await;
        }
        drop(device);

        self.follow_state(session.state, transition.elapsed_seconds);

        info!(
            "Meeting {}: {} -> {} at {}s",
            self.meeting_id, transition.from, transition.to, transition.elapsed_seconds
        );
        self.publish(transition.clone());

        Ok(Some(transition))
    }

    /// Take over the timing of `record` for display if it is newer than ours.
    /// Never touches the capture device.
    pub(crate) async fn adopt_record(
        &self,
        record: &PersistedSessionRecord,
        source: TransitionSource,
    ) -> bool {
        if !record.is_consistent() {
            warn!(
                "Ignoring inconsistent record for meeting {} from tab {}",
                self.meeting_id, record.writer
            );
            return false;
        }

        let now = self.clock.now_ms();
        let (transition, state_now, elapsed) = {
            let mut state = self.state.lock().await;
            if record.last_write_at <= state.session.last_write_at {
                debug!(
                    "Ignoring stale record for meeting {} ({} <= {})",
                    self.meeting_id, record.last_write_at, state.session.last_write_at
                );
                return false;
            }
            if state.owner {
                warn!(
                    "Meeting {} was updated by tab {} while this tab owns it",
                    self.meeting_id, record.writer
                );
            }

            let from = state.session.state;
            state.session.adopt(&record.to_session());
            let elapsed = elapsed_seconds(&state.session, now);

            let transition = (from != state.session.state).then(|| Transition {
                meeting_id: self.meeting_id.clone(),
                from,
                to: state.session.state,
                source,
                owned: state.owner,
                elapsed_seconds: elapsed,
                at: now,
            });
            (transition, state.session.state, elapsed)
        };

        self.follow_state(state_now, elapsed);
        if let Some(transition) = transition {
            info!(
                "Meeting {}: adopted {} -> {} from tab {}",
                self.meeting_id, transition.from, transition.to, record.writer
            );
            self.publish(transition);
        }
        true
    }

    /// Another tab removed the record. Only a mirroring tab follows it.
    pub(crate) async fn adopt_removal(&self) -> bool {
        let now = self.clock.now_ms();
        let transition = {
            let mut state = self.state.lock().await;
            if state.owner {
                warn!(
                    "Session record for meeting {} removed by another tab while this tab owns it",
                    self.meeting_id
                );
                return false;
            }
            if !state.session.state.is_active() {
                return false;
            }

            let from = state.session.state;
            let elapsed = elapsed_seconds(&state.session, now);
            state.session.finish();
            state.session.last_write_at = now;

            Transition {
                meeting_id: self.meeting_id.clone(),
                from,
                to: RecordingState::Stopped,
                source: TransitionSource::Remote,
                owned: false,
                elapsed_seconds: elapsed,
                at: now,
            }
        };

        self.follow_state(RecordingState::Stopped, transition.elapsed_seconds);
        info!("Meeting {}: stopped by another tab", self.meeting_id);
        self.publish(transition);
        true
    }

    /// Restart the capture device for the restored session and claim ownership.
    ///
    /// On failure the tab still holds the session, with capture detached, so
    /// the user can retry or stop it.
    pub(crate) async fn reattach(&self) -> Result<(), SessionError> {
        let mut device = self.capture.lock().await;

        let restored = {
            let state = self.state.lock().await;
            if !state.session.state.is_active() {
                return Err(SessionError::InvalidTransition {
                    command: CaptureCommand::Start,
                    from: state.session.state,
                });
            }
            if state.owner && state.capture_attached {
                return Err(SessionError::CaptureAttached {
                    meeting_id: self.meeting_id.clone(),
                });
            }
            state.session.state
        };

        let mut result = capture::invoke(&mut **device, CaptureCommand::Start)
            .await
            .map_err(|source| SessionError::Capture {
                command: CaptureCommand::Start,
                source,
            });

        if result.is_ok() && restored == RecordingState::Paused {
            if let Err(e) = device.pause().await {
                if let Err(stop_err) = device.stop().await {
                    warn!("Failed to release capture device: {:#}", stop_err);
                }
                result = Err(SessionError::Capture {
                    command: CaptureCommand::Pause,
                    source: e,
                });
            }
        }

        let now = self.clock.now_ms();
        let session = {
            let mut state = self.state.lock().await;
            state.owner = true;
            state.capture_attached = result.is_ok();
            if result.is_ok() {
                state.session.last_write_at = now;
            }
            state.session.clone()
        };

        match &result {
            Ok(()) => {
                let record = PersistedSessionRecord::from_session(&session, self.store.tab_id());
                self.store.write(&self.meeting_id, &record).await;
                info!(
                    "Capture re-attached for meeting {} ({})",
                    self.meeting_id, session.state
                );
            }
            Err(e) => error!(
                "Capture could not be re-attached for meeting {}: {}",
                self.meeting_id, e
            ),
        }

        result
    }

    /// Retry starting capture for a session whose restoration failed
    pub async fn retry_capture(&self) -> Result<(), SessionError> {
        if !self.is_owner().await {
            let state = self.snapshot().await.state;
            if state.is_active() {
                return Err(SessionError::NotOwner {
                    meeting_id: self.meeting_id.clone(),
                });
            }
        }

        let result = self.reattach().await;
        if let Err(SessionError::Capture { command, source }) = &result {
            self.notify(Notice::CaptureFailed {
                meeting_id: self.meeting_id.clone(),
                command: *command,
                error: format!("{:#}", source),
            });
        }
        result
    }

    fn publish(&self, transition: Transition) {
        lock_unpoisoned(&self.observers).retain(|tx| tx.send(transition.clone()).is_ok());
    }

    /// Publish `elapsed` now and run the ticker only while the session is active
    fn follow_state(&self, state: RecordingState, elapsed: u64) {
        self.display.send_replace(elapsed);
        if state.is_active() {
            self.ensure_ticker();
        } else {
            self.cancel_ticker();
        }
    }

    fn ticker_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        lock_unpoisoned(&self.ticker)
    }

    fn ensure_ticker(&self) {
        let mut slot = self.ticker_slot();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let display = Arc::clone(&self.display);
        let period = self.tick_interval;

        *slot = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let elapsed = {
                    let state = state.lock().await;
                    if !state.session.state.is_active() {
                        break;
                    }
                    elapsed_seconds(&state.session, clock.now_ms())
                };
                display.send_replace(elapsed);
            }
        }));
    }

    /// Cancel pending display updates
    pub fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker_slot().take() {
            handle.abort();
        }
    }
}

fn lock_unpoisoned<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
