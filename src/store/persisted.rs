use super::backend::KeyValueStore;
use crate::clock::Millis;
use crate::session::{RecordingSession, RecordingState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "recording-session.";
const SUBSCRIPTION_BUFFER: usize = 16;

/// Store key holding the session record of `meeting_id`
pub fn record_key(meeting_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, meeting_id)
}

/// Serialized session snapshot shared by every tab of the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSessionRecord {
    pub meeting_id: String,
    pub state: RecordingState,
    pub started_at: Option<Millis>,
    pub accumulated_pause_ms: i64,
    pub pause_started_at: Option<Millis>,
    pub last_write_at: Millis,
    /// Tab that wrote this record
    pub writer: String,
}

impl PersistedSessionRecord {
    pub fn from_session(session: &RecordingSession, writer: &str) -> Self {
        Self {
            meeting_id: session.meeting_id.clone(),
            state: session.state,
            started_at: session.started_at,
            accumulated_pause_ms: session.accumulated_pause_ms,
            pause_started_at: session.pause_started_at,
            last_write_at: session.last_write_at,
            writer: writer.to_string(),
        }
    }

    pub fn to_session(&self) -> RecordingSession {
        RecordingSession {
            meeting_id: self.meeting_id.clone(),
            state: self.state,
            started_at: self.started_at,
            accumulated_pause_ms: self.accumulated_pause_ms,
            pause_started_at: self.pause_started_at,
            last_write_at: self.last_write_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Whether the timing fields describe a session that could exist.
    ///
    /// An active record needs a start; a pause cannot begin before the start
    /// and paused time cannot be negative.
    pub fn is_consistent(&self) -> bool {
        if self.accumulated_pause_ms < 0 {
            return false;
        }
        match (self.state, self.started_at, self.pause_started_at) {
            (RecordingState::Recording | RecordingState::Paused, None, _) => false,
            (RecordingState::Paused, Some(_), None) => false,
            (_, Some(started_at), Some(paused_at)) => paused_at >= started_at,
            _ => true,
        }
    }
}

/// Session records on top of the shared store
///
/// Persistence is best effort: every failure is logged and swallowed so a
/// broken store only degrades continuity to "this tab, this lifetime".
#[derive(Clone)]
pub struct PersistedSessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl PersistedSessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Identifier of the tab this store writes as
    pub fn tab_id(&self) -> &str {
        self.backend.tab_id()
    }

    pub async fn write(&self, meeting_id: &str, record: &PersistedSessionRecord) {
        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize session record for {}: {}", meeting_id, e);
                return;
            }
        };

        match self.backend.set(&record_key(meeting_id), value).await {
            Ok(()) => debug!(
                "Persisted {} session for meeting {} ({} store)",
                record.state,
                meeting_id,
                self.backend.name()
            ),
            Err(e) => warn!(
                "Failed to persist session for meeting {}: {:#}",
                meeting_id, e
            ),
        }
    }

    pub async fn read(&self, meeting_id: &str) -> Option<PersistedSessionRecord> {
        let raw = match self.backend.get(&record_key(meeting_id)).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read session for meeting {}: {:#}", meeting_id, e);
                return None;
            }
        };

        decode(meeting_id, &raw)
    }

    pub async fn remove(&self, meeting_id: &str) {
        if let Err(e) = self.backend.remove(&record_key(meeting_id)).await {
            warn!(
                "Failed to remove session record for meeting {}: {:#}",
                meeting_id, e
            );
        }
    }

    /// Records written by other tabs for `meeting_id`; `None` items are removals
    ///
    /// Returns `None` when the store cannot deliver notifications.
    pub async fn subscribe(
        &self,
        meeting_id: &str,
    ) -> Option<mpsc::Receiver<Option<PersistedSessionRecord>>> {
        let mut changes = match self.backend.watch(&record_key(meeting_id)).await {
            Ok(changes) => changes,
            Err(e) => {
                warn!(
                    "Cross-tab updates unavailable for meeting {}: {:#}",
                    meeting_id, e
                );
                return None;
            }
        };

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let meeting_id = meeting_id.to_string();

        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                let update = match change.value {
                    Some(raw) => match decode(&meeting_id, &raw) {
                        Some(record) => Some(record),
                        None => continue,
                    },
                    None => None,
                };

                if tx.send(update).await.is_err() {
                    break;
                }
            }
        });

        Some(rx)
    }
}

fn decode(meeting_id: &str, raw: &str) -> Option<PersistedSessionRecord> {
    match serde_json::from_str::<PersistedSessionRecord>(raw) {
        Ok(record) if record.meeting_id != meeting_id => {
            warn!(
                "Session record under meeting {} belongs to {}, ignoring",
                meeting_id, record.meeting_id
            );
            None
        }
        Ok(record) if !record.is_consistent() => {
            warn!(
                "Inconsistent session record for meeting {} from tab {}, ignoring",
                meeting_id, record.writer
            );
            None
        }
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Corrupt session record for meeting {}: {}", meeting_id, e);
            None
        }
    }
}
