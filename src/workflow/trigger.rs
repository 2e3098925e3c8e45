use super::api::{MeetingStatusUpdater, MinutesGenerator};
use super::outcome::GenerationOutcome;
use crate::notice::{Notice, Notifier};
use crate::session::{RecordingState, Transition, TransitionSource};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Meetings with a minutes generation run in flight, shared process-wide
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    meetings: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        match self.meetings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Claim `meeting_id`; `None` if a run is already in flight
    pub fn try_acquire(&self, meeting_id: &str) -> Option<InFlightGuard> {
        if !self.lock().insert(meeting_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            registry: self.clone(),
            meeting_id: meeting_id.to_string(),
        })
    }

    pub fn is_in_flight(&self, meeting_id: &str) -> bool {
        self.lock().contains(meeting_id)
    }
}

/// Releases the meeting when dropped, on success and failure alike
pub struct InFlightGuard {
    registry: InFlightRegistry,
    meeting_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.meeting_id);
    }
}

/// Runs the minutes workflow when the owning tab stops a recording
#[derive(Clone)]
pub struct PostStopWorkflowTrigger {
    generator: Arc<dyn MinutesGenerator>,
    status: Arc<dyn MeetingStatusUpdater>,
    notifier: Arc<dyn Notifier>,
    in_flight: InFlightRegistry,
}

impl PostStopWorkflowTrigger {
    pub fn new(
        generator: Arc<dyn MinutesGenerator>,
        status: Arc<dyn MeetingStatusUpdater>,
        notifier: Arc<dyn Notifier>,
        in_flight: InFlightRegistry,
    ) -> Self {
        Self {
            generator,
            status,
            notifier,
            in_flight,
        }
    }

    /// Whether `transition` is a stop performed by the owning tab
    pub fn should_fire(transition: &Transition) -> bool {
        transition.from.is_active()
            && transition.to == RecordingState::Stopped
            && transition.source == TransitionSource::Local
            && transition.owned
    }

    /// Start the workflow for `transition` if it qualifies and nothing is in flight
    ///
    /// The run is detached from the caller: it completes and reports even if
    /// nobody awaits the returned handle.
    pub fn handle(&self, transition: &Transition) -> Option<JoinHandle<GenerationOutcome>> {
        if !Self::should_fire(transition) {
            return None;
        }

        let Some(guard) = self.in_flight.try_acquire(&transition.meeting_id) else {
            warn!(
                "Minutes generation already in flight for meeting {}, ignoring stop",
                transition.meeting_id
            );
            return None;
        };

        let trigger = self.clone();
        let meeting_id = transition.meeting_id.clone();
        let elapsed_seconds = transition.elapsed_seconds;
        let ended_at = Utc
            .timestamp_millis_opt(transition.at)
            .single()
            .unwrap_or_else(Utc::now);

        Some(tokio::spawn(async move {
            let outcome = trigger.run(&meeting_id, elapsed_seconds, ended_at).await;
            drop(guard);
            outcome
        }))
    }

    /// Watch a controller's transitions until the controller goes away
    ///
    /// The queue is unbounded, so no stop can be skipped by a slow observer.
    pub fn observe(&self, mut transitions: mpsc::UnboundedReceiver<Transition>) -> JoinHandle<()> {
        let trigger = self.clone();
        tokio::spawn(async move {
            while let Some(transition) = transitions.recv().await {
                trigger.handle(&transition);
            }
        })
    }

    async fn run(
        &self,
        meeting_id: &str,
        elapsed_seconds: u64,
        ended_at: DateTime<Utc>,
    ) -> GenerationOutcome {
        info!(
            "Recording stopped for meeting {} after {}s, generating minutes",
            meeting_id, elapsed_seconds
        );

        if let Err(e) = self.status.mark_completed(meeting_id, ended_at).await {
            error!("Failed to mark meeting {} completed: {:#}", meeting_id, e);
        }

        match self.generator.generate(meeting_id, elapsed_seconds).await {
            Ok(minutes) => {
                info!("Minutes generated for meeting {}", meeting_id);
                self.notifier.notify(Notice::MinutesReady {
                    meeting_id: meeting_id.to_string(),
                    minutes,
                });
                GenerationOutcome::Success
            }
            Err(e) => {
                error!("Minutes generation failed for meeting {}: {:#}", meeting_id, e);
                let outcome = GenerationOutcome::classify_error(&e);
                self.notifier.notify(Notice::MinutesFailed {
                    meeting_id: meeting_id.to_string(),
                    outcome: outcome.clone(),
                });
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(from: RecordingState, to: RecordingState) -> Transition {
        Transition {
            meeting_id: "m".to_string(),
            from,
            to,
            source: TransitionSource::Local,
            owned: true,
            elapsed_seconds: 10,
            at: 0,
        }
    }

    #[test]
    fn fires_only_on_owned_local_stop() {
        use RecordingState::*;

        assert!(PostStopWorkflowTrigger::should_fire(&transition(Recording, Stopped)));
        assert!(PostStopWorkflowTrigger::should_fire(&transition(Paused, Stopped)));
        assert!(!PostStopWorkflowTrigger::should_fire(&transition(Idle, Recording)));
        assert!(!PostStopWorkflowTrigger::should_fire(&transition(Recording, Paused)));
        assert!(!PostStopWorkflowTrigger::should_fire(&transition(Stopped, Stopped)));

        let mut remote = transition(Recording, Stopped);
        remote.source = TransitionSource::Remote;
        assert!(!PostStopWorkflowTrigger::should_fire(&remote));

        let mut unowned = transition(Recording, Stopped);
        unowned.owned = false;
        assert!(!PostStopWorkflowTrigger::should_fire(&unowned));
    }

    #[test]
    fn guard_releases_on_drop() {
        let registry = InFlightRegistry::new();
        let guard = registry.try_acquire("m").unwrap();
        assert!(registry.is_in_flight("m"));
        assert!(registry.try_acquire("m").is_none());
        assert!(registry.try_acquire("other").is_some());

        drop(guard);
        assert!(!registry.is_in_flight("m"));
    }
}
