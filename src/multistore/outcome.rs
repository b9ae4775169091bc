// Per-call completion tracking. A fresh tracker is created for every `get`/`set`
// and dropped when the call returns; nothing here outlives a single invocation.

use super::config::ErrorSelection;
use crate::core::{StoreError, StoreResult};
use tracing::{Level, event};

/// Holds the one store failure that a call will surface.
#[derive(Debug)]
struct ErrorSlot {
    selection: ErrorSelection,
    recorded: Option<(usize, StoreError)>,
}

impl ErrorSlot {
    fn new(selection: ErrorSelection) -> Self {
        Self {
            selection,
            recorded: None,
        }
    }

    fn offer(&mut self, index: usize, error: StoreError) {
        let replace = match (&self.recorded, self.selection) {
            (None, _) => true,
            (Some(_), ErrorSelection::FirstSettled) => false,
            (Some((held, _)), ErrorSelection::StoreOrder) => index < *held,
        };
        if replace {
            self.recorded = Some((index, error));
        }
    }

    fn take(self) -> Option<(usize, StoreError)> {
        self.recorded
    }
}

/// Tracks the settled `get` calls of one read race that has not found a value.
///
/// The race itself returns as soon as a store yields a value; this tracker only
/// decides the outcome once every store has answered with absence or failure.
#[derive(Debug)]
pub(crate) struct ReadRace {
    remaining: usize,
    absent: usize,
    failed: usize,
    errors: ErrorSlot,
}

impl ReadRace {
    pub(crate) fn new(stores: usize, selection: ErrorSelection) -> Self {
        Self {
            remaining: stores,
            absent: 0,
            failed: 0,
            errors: ErrorSlot::new(selection),
        }
    }

    pub(crate) fn record_absent(&mut self, index: usize) {
        self.remaining = self.remaining.saturating_sub(1);
        self.absent += 1;
        event!(Level::DEBUG, store = index, "store has no value");
    }

    pub(crate) fn record_error(&mut self, index: usize, error: StoreError) {
        self.remaining = self.remaining.saturating_sub(1);
        self.failed += 1;
        event!(Level::DEBUG, store = index, error = %error, "store read failed");
        self.errors.offer(index, error);
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.remaining == 0
    }

    /// Absence when no store failed, otherwise the selected failure.
    pub(crate) fn finish<V>(self) -> StoreResult<Option<V>> {
        match self.errors.take() {
            Some((index, error)) => {
                event!(
                    Level::WARN,
                    store = index,
                    absent = self.absent,
                    failed = self.failed,
                    error = %error,
                    "no store produced a value; surfacing read failure"
                );
                Err(error)
            }
            None => {
                event!(Level::DEBUG, absent = self.absent, "key absent from every store");
                Ok(None)
            }
        }
    }
}

/// Tracks the settled `set` calls of one write broadcast.
#[derive(Debug)]
pub(crate) struct WriteFanOut {
    remaining: usize,
    acked: usize,
    failed: usize,
    errors: ErrorSlot,
}

impl WriteFanOut {
    pub(crate) fn new(stores: usize, selection: ErrorSelection) -> Self {
        Self {
            remaining: stores,
            acked: 0,
            failed: 0,
            errors: ErrorSlot::new(selection),
        }
    }

    pub(crate) fn record_ack(&mut self, index: usize) {
        self.remaining = self.remaining.saturating_sub(1);
        self.acked += 1;
        event!(Level::DEBUG, store = index, "store write acknowledged");
    }

    pub(crate) fn record_failure(&mut self, index: usize, error: StoreError) {
        self.remaining = self.remaining.saturating_sub(1);
        self.failed += 1;
        event!(Level::WARN, store = index, error = %error, "store write failed");
        self.errors.offer(index, error);
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.remaining == 0
    }

    pub(crate) fn finish(self) -> StoreResult<()> {
        match self.errors.take() {
            Some((_, error)) => {
                event!(
                    Level::WARN,
                    acked = self.acked,
                    failed = self.failed,
                    "write did not reach every store"
                );
                Err(error)
            }
            None => Ok(()),
        }
    }
}
