//! Metrics sink boundary.
//!
//! Executor logic MUST NOT depend on `obs::metrics` directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between execution logic
//! and the counter state.
use crate::obs::metrics::{self, EntityCounters, EventOps};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug)]
pub enum ExecKind {
    Find,
    FindOne,
    Remove,
    Save,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    ExecStart {
        kind: ExecKind,
        entity: &'a str,
    },
    ExecFinish {
        kind: ExecKind,
        entity: &'a str,
        rows_touched: u64,
    },
    RowsScanned {
        entity: &'a str,
        rows_scanned: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into the counter state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ExecStart { kind, entity } => {
                metrics::with_state_mut(|m| {
                    count_call(&mut m.ops, kind);
                    count_entity_call(m.entities.entry(entity.to_string()).or_default(), kind);
                });
            }

            MetricsEvent::ExecFinish {
                kind,
                entity,
                rows_touched,
            } => {
                metrics::with_state_mut(|m| {
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    match kind {
                        ExecKind::Find | ExecKind::FindOne => {
                            m.ops.rows_loaded = m.ops.rows_loaded.saturating_add(rows_touched);
                            entry.rows_loaded = entry.rows_loaded.saturating_add(rows_touched);
                        }
                        ExecKind::Remove => {
                            m.ops.rows_removed = m.ops.rows_removed.saturating_add(rows_touched);
                            entry.rows_removed = entry.rows_removed.saturating_add(rows_touched);
                        }
                        ExecKind::Save => {}
                    }
                });
            }

            MetricsEvent::RowsScanned {
                entity,
                rows_scanned,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
                });
            }
        }
    }
}

const fn count_call(ops: &mut EventOps, kind: ExecKind) {
    match kind {
        ExecKind::Find => ops.find_calls = ops.find_calls.saturating_add(1),
        ExecKind::FindOne => ops.find_one_calls = ops.find_one_calls.saturating_add(1),
        ExecKind::Remove => ops.remove_calls = ops.remove_calls.saturating_add(1),
        ExecKind::Save => ops.save_calls = ops.save_calls.saturating_add(1),
    }
}

const fn count_entity_call(entry: &mut EntityCounters, kind: ExecKind) {
    match kind {
        ExecKind::Find => entry.find_calls = entry.find_calls.saturating_add(1),
        ExecKind::FindOne => entry.find_one_calls = entry.find_one_calls.saturating_add(1),
        ExecKind::Remove => entry.remove_calls = entry.remove_calls.saturating_add(1),
        ExecKind::Save => entry.save_calls = entry.save_calls.saturating_add(1),
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Run a closure with a temporary metrics sink override.
///
/// The override is thread-local and the previous sink is restored on
/// every exit path, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0.take();
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

/// Span
/// RAII guard that emits start/finish metrics events for one executor call.
/// Ensures finish accounting happens even on unwind.

pub(crate) struct Span<'a> {
    kind: ExecKind,
    entity: &'a str,
    rows: u64,
}

impl<'a> Span<'a> {
    /// Start a metrics span for a specific entity and executor kind.
    #[must_use]
    pub(crate) fn new(kind: ExecKind, entity: &'a str) -> Self {
        record(MetricsEvent::ExecStart { kind, entity });

        Self {
            kind,
            entity,
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span<'_> {
    fn drop(&mut self) {
        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            entity: self.entity,
            rows_touched: self.rows,
        });
    }
}
