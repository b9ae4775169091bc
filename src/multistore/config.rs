use serde::{Deserialize, Serialize};

/// Chooses which store failure is surfaced when more than one store fails
/// during a single `get` or `set`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSelection {
    /// The failure of the lowest-indexed failing store.
    #[default]
    StoreOrder,
    /// Whichever failure settled first. Depends on store latency.
    FirstSettled,
}

/// Aggregator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MultiStoreConfig {
    /// Name recorded on every `multistore.get`/`multistore.set` span
    pub name: String,

    /// Error surfaced when several stores fail in the same call
    pub error_selection: ErrorSelection,
}

impl Default for MultiStoreConfig {
    fn default() -> Self {
        Self {
            name: "multistore".to_string(),
            error_selection: ErrorSelection::default(),
        }
    }
}

impl MultiStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name used in tracing spans
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the error selection policy
    pub fn error_selection(mut self, error_selection: ErrorSelection) -> Self {
        self.error_selection = error_selection;
        self
    }
}
