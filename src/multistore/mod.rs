pub mod config;
mod outcome;

pub use config::{ErrorSelection, MultiStoreConfig};

use self::outcome::{ReadRace, WriteFanOut};
use crate::core::{ConfigError, StoreError, StoreResult};
use crate::storage::{Store, StoreHandle};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, Level, event, info_span};

/// Fan-out aggregator over a fixed, non-empty set of stores.
///
/// - `set` broadcasts the write to every store and fails if any store fails.
/// - `get` races every store and returns the first value found. Store failures
///   are only surfaced when no store can serve a value.
///
/// Each store call runs on its own tokio task, so both operations must be
/// awaited inside a tokio runtime. Reads that lose the race are not cancelled:
/// their tasks keep running and their results are discarded.
///
/// # Examples
///
/// ```
/// use multistore::{MemoryStore, MultiStore, StoreHandle};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let local = Arc::new(MemoryStore::<String>::new("local"));
/// let remote = Arc::new(MemoryStore::<String>::new("remote"));
/// let stores: Vec<StoreHandle<String>> = vec![local.clone(), remote.clone()];
///
/// let multi = MultiStore::new(stores)?;
/// multi.set("greeting", "hello".to_string()).await?;
///
/// assert_eq!(remote.peek("greeting").await.as_deref(), Some("hello"));
/// assert_eq!(multi.get("greeting").await?.as_deref(), Some("hello"));
/// # Ok(())
/// # }
/// ```
pub struct MultiStore<V> {
    stores: Arc<[StoreHandle<V>]>,
    config: Arc<MultiStoreConfig>,
}

impl<V> MultiStore<V> {
    /// Creates an aggregator with the default configuration.
    ///
    /// Fails with [`ConfigError::NoStores`] when `stores` is empty.
    pub fn new<I>(stores: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = StoreHandle<V>>,
    {
        Self::with_config(stores, MultiStoreConfig::default())
    }

    /// Creates an aggregator with an explicit configuration.
    pub fn with_config<I>(stores: I, config: MultiStoreConfig) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = StoreHandle<V>>,
    {
        let stores: Arc<[StoreHandle<V>]> = stores.into_iter().collect();
        if stores.is_empty() {
            return Err(ConfigError::NoStores);
        }

        event!(
            Level::DEBUG,
            name = %config.name,
            stores = stores.len(),
            "multistore created"
        );
        Ok(Self {
            stores,
            config: Arc::new(config),
        })
    }

    /// The stores in configuration order.
    pub fn stores(&self) -> &[StoreHandle<V>] {
        &self.stores
    }

    /// Number of stores. Always at least one.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn config(&self) -> &MultiStoreConfig {
        &self.config
    }

    /// Spawns `call` once per store and yields the outcomes in completion order,
    /// each tagged with the store's index.
    fn dispatch<T, F, Fut>(
        &self,
        call: F,
    ) -> FuturesUnordered<impl Future<Output = (usize, StoreResult<T>)> + Send>
    where
        F: Fn(StoreHandle<V>) -> Fut,
        Fut: Future<Output = StoreResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.stores
            .iter()
            .enumerate()
            .map(|(index, store)| {
                let handle = tokio::spawn(call(Arc::clone(store)).in_current_span());
                settle(index, handle)
            })
            .collect()
    }
}

impl<V> MultiStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Writes `value` under `key` to every store.
    ///
    /// Every store is attempted even when others fail, and the call waits for
    /// all of them. If any store fails, one of the failures is returned as-is,
    /// chosen by [`MultiStoreConfig::error_selection`].
    pub async fn set(&self, key: &str, value: V) -> StoreResult<()> {
        let span = info_span!(
            "multistore.set",
            name = %self.config.name,
            key = %key,
            stores = self.stores.len()
        );
        self.broadcast_set(key, value).instrument(span).await
    }

    /// Reads `key` from every store and returns the first value found.
    ///
    /// Returns `Ok(None)` when every store reports the key absent. A store
    /// failure is returned only when every store either failed or had no value.
    pub async fn get(&self, key: &str) -> StoreResult<Option<V>> {
        let span = info_span!(
            "multistore.get",
            name = %self.config.name,
            key = %key,
            stores = self.stores.len()
        );
        self.race_get(key).instrument(span).await
    }

    async fn broadcast_set(&self, key: &str, value: V) -> StoreResult<()> {
        let key: Arc<str> = Arc::from(key);
        let mut pending = self.dispatch(|store| {
            let key = Arc::clone(&key);
            let value = value.clone();
            async move { store.set(&key, value).await }
        });

        let mut write = WriteFanOut::new(self.stores.len(), self.config.error_selection);
        while let Some((index, outcome)) = pending.next().await {
            match outcome {
                Ok(()) => write.record_ack(index),
                Err(err) => write.record_failure(index, err),
            }
        }

        debug_assert!(write.is_settled());
        write.finish()
    }

    async fn race_get(&self, key: &str) -> StoreResult<Option<V>> {
        let key: Arc<str> = Arc::from(key);
        let mut pending = self.dispatch(|store| {
            let key = Arc::clone(&key);
            async move { store.get(&key).await }
        });

        let mut race = ReadRace::new(self.stores.len(), self.config.error_selection);
        while let Some((index, outcome)) = pending.next().await {
            match outcome {
                Ok(Some(value)) => {
                    event!(
                        Level::DEBUG,
                        store = index,
                        abandoned = pending.len(),
                        "store produced a value"
                    );
                    return Ok(Some(value));
                }
                Ok(None) => race.record_absent(index),
                Err(err) => race.record_error(index, err),
            }
        }

        debug_assert!(race.is_settled());
        race.finish()
    }
}

/// Awaits a spawned store call. A task that panicked or was aborted counts as
/// a failure of that store.
async fn settle<T>(index: usize, handle: JoinHandle<StoreResult<T>>) -> (usize, StoreResult<T>) {
    let outcome = match handle.await {
        Ok(outcome) => outcome,
        Err(err) => Err(StoreError::Aborted(format!("store {index}: {err}"))),
    };
    (index, outcome)
}

#[async_trait]
impl<V> Store<V> for MultiStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> StoreResult<Option<V>> {
        MultiStore::get(self, key).await
    }

    async fn set(&self, key: &str, value: V) -> StoreResult<()> {
        MultiStore::set(self, key, value).await
    }
}

impl<V> Clone for MultiStore<V> {
    fn clone(&self) -> Self {
        Self {
            stores: Arc::clone(&self.stores),
            config: Arc::clone(&self.config),
        }
    }
}

impl<V> fmt::Debug for MultiStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiStore")
            .field("stores", &self.stores.len())
            .field("config", &self.config)
            .finish()
    }
}
