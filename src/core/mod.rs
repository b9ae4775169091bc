pub mod error;

pub use error::{ConfigError, StoreError, StoreResult};
