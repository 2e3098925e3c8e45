use crate::capture::CaptureFactory;
use crate::clock::Clock;
use crate::notice::Notifier;
use crate::session::{
    CrossTabSynchronizer, RecordingSessionController, RestoreOutcome, SessionConfig,
    SessionRestorer,
};
use crate::store::{KeyValueStore, PersistedSessionStore};
use crate::workflow::{InFlightRegistry, MeetingStatusUpdater, MinutesGenerator, PostStopWorkflowTrigger};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Collaborators shared by every view mounted in this tab
#[derive(Clone)]
pub struct ViewDeps {
    pub store: Arc<dyn KeyValueStore>,
    pub capture: Arc<dyn CaptureFactory>,
    pub generator: Arc<dyn MinutesGenerator>,
    pub status: Arc<dyn MeetingStatusUpdater>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub in_flight: InFlightRegistry,
}

/// One mounted meeting view: controller plus its observers
///
/// Mounting wires the post-stop trigger and the cross-tab synchronizer,
/// then runs restoration once. Dropping the view stops listening; a minutes
/// generation already running still completes and reports.
pub struct MeetingView {
    config: SessionConfig,
    controller: RecordingSessionController,
    restorer: SessionRestorer,
    restore_outcome: RestoreOutcome,
    tasks: Vec<JoinHandle<()>>,
}

impl MeetingView {
    pub async fn mount(config: SessionConfig, deps: &ViewDeps) -> Result<Self> {
        info!(
            "Mounting meeting {} for user {}",
            config.meeting_id, config.user_id
        );

        let device = deps
            .capture
            .create(&config.meeting_id)
            .context("Failed to create capture device")?;

        let controller = RecordingSessionController::new(
            &config,
            device,
            PersistedSessionStore::new(Arc::clone(&deps.store)),
            Arc::clone(&deps.clock),
            Arc::clone(&deps.notifier),
        );

        let trigger = PostStopWorkflowTrigger::new(
            Arc::clone(&deps.generator),
            Arc::clone(&deps.status),
            Arc::clone(&deps.notifier),
            deps.in_flight.clone(),
        );

        let mut tasks = vec![trigger.observe(controller.subscribe_transitions())];
        if let Some(sync) = CrossTabSynchronizer::spawn(controller.clone()).await {
            tasks.push(sync);
        }

        let restorer = SessionRestorer::new();
        let restore_outcome = restorer.restore(&controller, &config).await;
        info!(
            "Meeting {} mounted: {:?}",
            config.meeting_id, restore_outcome
        );

        Ok(Self {
            config,
            controller,
            restorer,
            restore_outcome,
            tasks,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn controller(&self) -> &RecordingSessionController {
        &self.controller
    }

    /// Result of the restoration that ran on mount
    pub fn restore_outcome(&self) -> &RestoreOutcome {
        &self.restore_outcome
    }

    /// Re-run restoration, as a re-render would; a no-op after mount
    pub async fn restore(&self) -> RestoreOutcome {
        self.restorer.restore(&self.controller, &self.config).await
    }
}

impl Drop for MeetingView {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.controller.cancel_ticker();
        info!("Meeting {} unmounted", self.config.meeting_id);
    }
}
