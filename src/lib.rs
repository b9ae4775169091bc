// ============================================================================
// multistore
// ============================================================================
//
// Presents a set of async key-value stores as one store: writes go to every
// store, reads race all of them and take the first value found.

pub mod core;
pub mod multistore;
pub mod storage;

pub use self::core::{ConfigError, StoreError, StoreResult};
pub use self::multistore::{ErrorSelection, MultiStore, MultiStoreConfig};
pub use self::storage::{MemoryStore, Store, StoreHandle};
