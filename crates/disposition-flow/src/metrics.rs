use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounterVec, Opts, Registry};
use tracing::error;

lazy_static! {
    static ref OUTCOMES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "firco_disposition_outcomes_total",
            "Terminal disposition outcomes by status detail"
        ),
        &["status_detail"]
    )
    .expect("valid metric definition");
    static ref RETRIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "firco_disposition_retries_total",
            "Retried attempts by failure classification"
        ),
        &["classification"]
    )
    .expect("valid metric definition");
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register disposition metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, OUTCOMES_TOTAL.clone());
    register(registry, RETRIES_TOTAL.clone());
}

pub fn record_outcome(status_detail: &str) {
    OUTCOMES_TOTAL.with_label_values(&[status_detail]).inc();
}

pub fn record_retry(classification: &str) {
    RETRIES_TOTAL.with_label_values(&[classification]).inc();
}

pub fn outcome_count(status_detail: &str) -> u64 {
    OUTCOMES_TOTAL.with_label_values(&[status_detail]).get()
}

pub fn retry_count(classification: &str) -> u64 {
    RETRIES_TOTAL.with_label_values(&[classification]).get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_outcomes_and_retries() {
        let before = outcome_count("escalated");
        record_outcome("escalated");
        assert!(outcome_count("escalated") > before);

        let before = retry_count("reload_loop");
        record_retry("reload_loop");
        assert!(retry_count("reload_loop") > before);
    }

    #[test]
    fn registers_into_custom_registry() {
        let registry = Registry::new();
        register_metrics(&registry);
        record_outcome("already_handled");
        assert!(registry
            .gather()
            .iter()
            .any(|family| family.get_name() == "firco_disposition_outcomes_total"));
    }
}
