use super::Store;
use crate::core::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{Level, event};

/// An in-process [`Store`] backed by a `HashMap`.
///
/// Intended for tests and demos: every call can be slowed down with a fixed
/// latency, and the next `get`/`set` can be made to fail with a chosen error.
/// Seeding and inspection helpers (`insert`, `peek`) bypass both.
pub struct MemoryStore<V> {
    name: String,
    data: RwLock<HashMap<String, V>>,
    latency: Mutex<Duration>,
    next_get_error: Mutex<Option<StoreError>>,
    next_set_error: Mutex<Option<StoreError>>,
    get_calls: AtomicU64,
    set_calls: AtomicU64,
}

impl<V> MemoryStore<V> {
    /// Creates an empty store with no latency.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: RwLock::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            next_get_error: Mutex::new(None),
            next_set_error: Mutex::new(None),
            get_calls: AtomicU64::new(0),
            set_calls: AtomicU64::new(0),
        }
    }

    /// Sets the latency applied to every `get`/`set` call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Mutex::new(latency);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Changes the per-call latency of a store that is already shared.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.lock().await = latency;
    }

    /// Makes the next `get` fail with `error` without reading any data.
    pub async fn fail_next_get(&self, error: StoreError) {
        *self.next_get_error.lock().await = Some(error);
    }

    /// Makes the next `set` fail with `error` without writing any data.
    pub async fn fail_next_set(&self, error: StoreError) {
        *self.next_set_error.lock().await = Some(error);
    }

    /// Seeds a value directly.
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.data.write().await.insert(key.into(), value);
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// Number of `get` calls received, including failed ones.
    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `set` calls received, including failed ones.
    pub fn set_calls(&self) -> u64 {
        self.set_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().await;
        if !latency.is_zero() {
            sleep(latency).await;
        }
    }
}

impl<V: Clone> MemoryStore<V> {
    /// Reads a value directly.
    pub async fn peek(&self, key: &str) -> Option<V> {
        self.data.read().await.get(key).cloned()
    }
}

#[async_trait]
impl<V> Store<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> StoreResult<Option<V>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.next_get_error.lock().await.take();
        self.simulate_latency().await;
        if let Some(err) = fault {
            event!(Level::DEBUG, store = %self.name, error = %err, "injected fault");
            return Err(err);
        }
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: V) -> StoreResult<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.next_set_error.lock().await.take();
        self.simulate_latency().await;
        if let Some(err) = fault {
            event!(Level::DEBUG, store = %self.name, error = %err, "injected fault");
            return Err(err);
        }
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
