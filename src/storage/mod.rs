pub mod memory;

pub use memory::MemoryStore;

use crate::core::StoreResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Async key-value capability consumed by [`MultiStore`](crate::MultiStore).
///
/// Implementations own their storage format, transport and failure modes; the
/// aggregator only relies on each call eventually resolving or failing.
#[async_trait]
pub trait Store<V>: Send + Sync {
    /// Returns the value stored under `key`, or `None` when the key is absent.
    async fn get(&self, key: &str) -> StoreResult<Option<V>>;

    /// Stores `value` under `key`.
    async fn set(&self, key: &str, value: V) -> StoreResult<()>;
}

/// Shared handle to a store, as held by an aggregator.
pub type StoreHandle<V> = Arc<dyn Store<V>>;
