//! Shared session store
//!
//! The only coordination channel between tabs: a per-origin key-value store
//! that broadcasts every write to the other tabs of the same origin.

mod backend;
mod memory;
mod nats;
mod persisted;

pub use backend::{KeyValueStore, StoreChange};
pub use memory::{MemoryOrigin, MemoryStore};
pub use nats::{NatsKvStore, StoreEnvelope};
pub use persisted::{record_key, PersistedSessionRecord, PersistedSessionStore};
