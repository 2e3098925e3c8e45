use anyhow::Result;
use tokio::sync::mpsc;

/// A key changed in the shared store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
    /// New value, or `None` if the key was removed
    pub value: Option<String>,
}

/// Shared, per-origin string key-value store
///
/// Every tab of the same origin sees the same keys. There is no locking,
/// no transaction and no ordering guarantee between writers.
///
/// Implementations:
/// - Memory: in-process origin shared by several tab handles
/// - NATS: JetStream key-value bucket shared by several processes
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Subscribe to changes of `key` made by other tabs
    ///
    /// Writes made through this handle are never delivered back to it.
    async fn watch(&self, key: &str) -> Result<mpsc::Receiver<StoreChange>>;

    /// Identifier of the tab this handle writes as
    fn tab_id(&self) -> &str;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
