use super::backend::{KeyValueStore, StoreChange};
use anyhow::{Context, Result};
use async_nats::jetstream::kv::{self, Operation};
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

const WATCH_BUFFER: usize = 64;

/// Value as stored in the bucket
///
/// The writer travels with the value so watchers can drop their own writes.
/// A removal is stored as a tombstone (`value: null`) for the same reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEnvelope {
    pub writer: String,
    pub value: Option<String>,
}

impl StoreEnvelope {
    pub fn decode(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).context("Failed to decode store envelope")
    }
}

/// Shared store backed by a NATS JetStream key-value bucket
pub struct NatsKvStore {
    kv: kv::Store,
    bucket: String,
    tab_id: String,
}

impl NatsKvStore {
    /// Connect to NATS and open (or create) the bucket
    pub async fn connect(url: &str, bucket: &str) -> Result<Self> {
        info!("Connecting to NATS key-value bucket {} at {}", bucket, url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;
        let jetstream = async_nats::jetstream::new(client);

        let kv = match jetstream.get_key_value(bucket).await {
            Ok(kv) => kv,
            Err(_) => jetstream
                .create_key_value(kv::Config {
                    bucket: bucket.to_string(),
                    history: 1,
                    ..Default::default()
                })
                .await
                .context("Failed to create key-value bucket")?,
        };

        let tab_id = uuid::Uuid::new_v4().to_string();
        info!("Opened bucket {} as tab {}", bucket, tab_id);

        Ok(Self {
            kv,
            bucket: bucket.to_string(),
            tab_id,
        })
    }

    async fn put_envelope(&self, key: &str, value: Option<String>) -> Result<()> {
        let envelope = StoreEnvelope {
            writer: self.tab_id.clone(),
            value,
        };
        let payload = serde_json::to_vec(&envelope)?;

        self.kv
            .put(key, payload.into())
            .await
            .with_context(|| format!("Failed to write {} to bucket {}", key, self.bucket))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for NatsKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let raw = self
            .kv
            .get(key)
            .await
            .with_context(|| format!("Failed to read {} from bucket {}", key, self.bucket))?;

        match raw {
            Some(raw) => Ok(StoreEnvelope::decode(&raw)?.value),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.put_envelope(key, Some(value)).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.put_envelope(key, None).await
    }

    async fn watch(&self, key: &str) -> Result<mpsc::Receiver<StoreChange>> {
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let (ready_tx, ready_rx) = oneshot::channel();
        let store = self.kv.clone();
        let key = key.to_string();
        let tab_id = self.tab_id.clone();

        tokio::spawn(async move {
            let mut watch = match store.watch(&key).await {
                Ok(watch) => {
                    let _ = ready_tx.send(Ok(()));
                    watch
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(anyhow::Error::new(e)));
                    return;
                }
            };

            loop {
                let entry = tokio::select! {
                    _ = tx.closed() => break,
                    entry = watch.next() => entry,
                };

                let entry = match entry {
                    Some(Ok(entry)) => entry,
                    Some(Err(e)) => {
                        warn!("Store watcher for {} failed: {}", key, e);
                        continue;
                    }
                    None => break,
                };

                let value = match entry.operation {
                    Operation::Put => match StoreEnvelope::decode(&entry.value) {
                        Ok(envelope) if envelope.writer == tab_id => continue,
                        Ok(envelope) => envelope.value,
                        Err(e) => {
                            warn!("Ignoring undecodable value for {}: {:#}", entry.key, e);
                            continue;
                        }
                    },
                    Operation::Delete | Operation::Purge => None,
                };

                let change = StoreChange {
                    key: entry.key,
                    value,
                };
                if tx.send(change).await.is_err() {
                    break;
                }
            }
        });

        ready_rx
            .await
            .context("Store watcher exited before subscribing")?
            .context("Failed to watch key")?;

        Ok(rx)
    }

    fn tab_id(&self) -> &str {
        &self.tab_id
    }

    fn name(&self) -> &str {
        "nats"
    }
}
