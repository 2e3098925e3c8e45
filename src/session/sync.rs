use super::controller::RecordingSessionController;
use super::transition::TransitionSource;
use crate::store::PersistedSessionRecord;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Mirrors another tab's writes into this tab's view of the session
///
/// Last write wins by `last_write_at`. Adopted state only drives the local
/// display; the capture device is never touched from here.
pub struct CrossTabSynchronizer;

impl CrossTabSynchronizer {
    /// Listen for other tabs' writes until the returned task is aborted.
    ///
    /// Returns `None` when the store cannot deliver notifications.
    pub async fn spawn(controller: RecordingSessionController) -> Option<JoinHandle<()>> {
        let meeting_id = controller.meeting_id().to_string();
        let mut updates = controller.store().subscribe(&meeting_id).await?;

        info!("Listening for cross-tab updates on meeting {}", meeting_id);

        Some(tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                Self::apply(&controller, update.as_ref()).await;
            }
            debug!("Cross-tab updates ended for meeting {}", meeting_id);
        }))
    }

    /// Reconcile one update; returns whether the local view changed
    pub async fn apply(
        controller: &RecordingSessionController,
        update: Option<&PersistedSessionRecord>,
    ) -> bool {
        match update {
            Some(record) => controller.adopt_record(record, TransitionSource::Remote).await,
            None => controller.adopt_removal().await,
        }
    }
}
