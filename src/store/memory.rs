use super::backend::{KeyValueStore, StoreChange};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::warn;

const BROADCAST_CAPACITY: usize = 256;
const WATCH_BUFFER: usize = 64;

#[derive(Debug, Clone)]
struct Broadcast {
    writer: String,
    change: StoreChange,
}

struct OriginInner {
    values: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<Broadcast>,
}

/// In-process origin: one set of keys shared by every tab handle created from it
#[derive(Clone)]
pub struct MemoryOrigin {
    inner: Arc<OriginInner>,
}

impl MemoryOrigin {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(OriginInner {
                values: RwLock::new(HashMap::new()),
                changes,
            }),
        }
    }

    /// Open a new tab on this origin
    pub fn tab(&self) -> MemoryStore {
        MemoryStore {
            origin: self.clone(),
            tab_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl Default for MemoryOrigin {
    fn default() -> Self {
        Self::new()
    }
}

/// One tab's handle on a [`MemoryOrigin`]
pub struct MemoryStore {
    origin: MemoryOrigin,
    tab_id: String,
}

impl MemoryStore {
    fn publish(&self, key: &str, value: Option<String>) {
        // No receivers just means no other tab is watching
        let _ = self.origin.inner.changes.send(Broadcast {
            writer: self.tab_id.clone(),
            change: StoreChange {
                key: key.to_string(),
                value,
            },
        });
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.origin.inner.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        {
            let mut values = self.origin.inner.values.write().await;
            values.insert(key.to_string(), value.clone());
        }
        self.publish(key, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let removed = {
            let mut values = self.origin.inner.values.write().await;
            values.remove(key)
        };
        if removed.is_some() {
            self.publish(key, None);
        }
        Ok(())
    }

    async fn watch(&self, key: &str) -> Result<mpsc::Receiver<StoreChange>> {
        let mut changes = self.origin.inner.changes.subscribe();
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let key = key.to_string();
        let tab_id = self.tab_id.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    received = changes.recv() => match received {
                        Ok(broadcast) => {
                            if broadcast.change.key != key || broadcast.writer == tab_id {
                                continue;
                            }
                            if tx.send(broadcast.change).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Store watcher for {} lagged, skipped {} changes", key, skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(rx)
    }

    fn tab_id(&self) -> &str {
        &self.tab_id
    }

    fn name(&self) -> &str {
        "memory"
    }
}
