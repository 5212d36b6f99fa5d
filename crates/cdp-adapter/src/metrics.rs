use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{core::Collector, histogram_opts, HistogramVec, IntCounterVec, Registry};
use tracing::error;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigatorMetricsSnapshot {
    pub operations: u64,
    pub failures: u64,
    pub latency_total_us: u64,
}

static OPERATIONS: AtomicU64 = AtomicU64::new(0);
static FAILURES: AtomicU64 = AtomicU64::new(0);
static LATENCY_TOTAL_US: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref NAV_OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "firco_navigator_operations_total",
            "Total page navigator operations"
        ),
        &["op"]
    )
    .expect("valid metric definition");
    static ref NAV_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "firco_navigator_failures_total",
            "Total page navigator operation failures"
        ),
        &["op"]
    )
    .expect("valid metric definition");
    static ref NAV_DURATION: HistogramVec = HistogramVec::new(
        histogram_opts!(
            "firco_navigator_duration_seconds",
            "Page navigator operation latency",
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]
        ),
        &["op"]
    )
    .expect("valid metric definition");
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register navigator metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, NAV_OPERATIONS_TOTAL.clone());
    register(registry, NAV_FAILURES_TOTAL.clone());
    register(registry, NAV_DURATION.clone());
}

pub fn record_operation(op: &str, duration: Duration, ok: bool) {
    OPERATIONS.fetch_add(1, Ordering::Relaxed);
    let micros = duration.as_micros().min(u64::MAX as u128) as u64;
    LATENCY_TOTAL_US.fetch_add(micros, Ordering::Relaxed);
    NAV_OPERATIONS_TOTAL.with_label_values(&[op]).inc();
    NAV_DURATION
        .with_label_values(&[op])
        .observe(duration.as_secs_f64());
    if !ok {
        FAILURES.fetch_add(1, Ordering::Relaxed);
        NAV_FAILURES_TOTAL.with_label_values(&[op]).inc();
    }
}

pub fn snapshot() -> NavigatorMetricsSnapshot {
    NavigatorMetricsSnapshot {
        operations: OPERATIONS.load(Ordering::Relaxed),
        failures: FAILURES.load(Ordering::Relaxed),
        latency_total_us: LATENCY_TOTAL_US.load(Ordering::Relaxed),
    }
}
