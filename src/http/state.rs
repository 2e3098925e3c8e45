use crate::notice::NoticeBoard;
use crate::view::{MeetingView, ViewDeps};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Mounted meeting views (meeting_id → view)
    pub views: Arc<RwLock<HashMap<String, Arc<MeetingView>>>>,

    /// Collaborators handed to every new view
    pub deps: ViewDeps,

    /// Pending user notices, drained by clients
    pub notices: NoticeBoard,

    /// Display refresh interval for new views
    pub tick_interval: Duration,

    /// Meetings whose mount is in progress
    mounting: Arc<Mutex<HashSet<String>>>,
}

/// Claim on a meeting id while its view is being mounted; released on drop
pub struct MountReservation {
    mounting: Arc<Mutex<HashSet<String>>>,
    meeting_id: String,
}

impl Drop for MountReservation {
    fn drop(&mut self) {
        lock_unpoisoned(&self.mounting).remove(&self.meeting_id);
    }
}

fn lock_unpoisoned(mounting: &Mutex<HashSet<String>>) -> std::sync::MutexGuard<'_, HashSet<String>> {
    match mounting.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl AppState {
    /// `deps.notifier` should deliver into `notices` for clients to see them
    pub fn new(deps: ViewDeps, notices: NoticeBoard, tick_interval: Duration) -> Self {
        Self {
            views: Arc::new(RwLock::new(HashMap::new())),
            deps,
            notices,
            tick_interval,
            mounting: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Reserve `meeting_id` for mounting, unless it is mounted or being mounted.
    ///
    /// Checked under the views write lock, and the view must be inserted
    /// before the reservation drops, so two mounts can never both proceed.
    pub async fn reserve_mount(&self, meeting_id: &str) -> Option<MountReservation> {
        let views = self.views.write().await;
        if views.contains_key(meeting_id) {
            return None;
        }
        if !lock_unpoisoned(&self.mounting).insert(meeting_id.to_string()) {
            return None;
        }

        Some(MountReservation {
            mounting: Arc::clone(&self.mounting),
            meeting_id: meeting_id.to_string(),
        })
    }

    pub async fn view(&self, meeting_id: &str) -> Option<Arc<MeetingView>> {
        self.views.read().await.get(meeting_id).cloned()
    }
}
