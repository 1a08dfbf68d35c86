use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// Metrics
/// Ephemeral, in-memory counters for executor operations.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Executor entrypoints
    pub find_calls: u64,
    pub find_one_calls: u64,
    pub remove_calls: u64,
    pub save_calls: u64,

    // Rows touched
    pub rows_loaded: u64,
    pub rows_removed: u64,
    pub rows_scanned: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub find_calls: u64,
    pub find_one_calls: u64,
    pub remove_calls: u64,
    pub save_calls: u64,
    pub rows_loaded: u64,
    pub rows_removed: u64,
    pub rows_scanned: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Snapshot the current counter state.
#[must_use]
pub fn report() -> EventState {
    with_state(Clone::clone)
}

/// Reset all counters (useful in tests).
pub fn reset() {
    with_state_mut(|m| *m = EventState::default());
}
