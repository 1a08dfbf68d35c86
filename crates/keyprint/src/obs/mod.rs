//! Observability: ephemeral telemetry for executor calls.
//!
//! Executors never touch counter state directly; every event is routed
//! through the sink boundary so tests can observe traffic with a scoped
//! override.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EntityCounters, EventOps, EventState, report, reset};
pub use sink::{ExecKind, MetricsEvent, MetricsSink, with_metrics_sink};
