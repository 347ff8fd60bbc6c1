use prometheus_client::{metrics::counter::Counter, registry::Registry};

/// Prefix applied to every metric registered by [Metrics::init].
pub const METRICS_PREFIX: &str = "mailbench";

/// Counters describing completed benchmark runs.
///
/// Agents count locally while processing and publish once when they exit, so updating these
/// never contends with the measured workload.
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// Number of completed runs
    pub runs: Counter,
    /// Number of ordinary messages enqueued by the router
    pub routed: Counter,
    /// Number of ordinary messages dequeued by agents
    pub processed: Counter,
    /// Number of completion handles fulfilled by agents
    pub signaled: Counter,
}

impl Metrics {
    /// Create and return a new set of metrics, registered with the given registry.
    pub fn init(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        let registry = registry.sub_registry_with_prefix(METRICS_PREFIX);
        registry.register("runs", "Number of completed runs", metrics.runs.clone());
        registry.register(
            "routed",
            "Number of ordinary messages enqueued by the router",
            metrics.routed.clone(),
        );
        registry.register(
            "processed",
            "Number of ordinary messages dequeued by agents",
            metrics.processed.clone(),
        );
        registry.register(
            "signaled",
            "Number of completion handles fulfilled by agents",
            metrics.signaled.clone(),
        );
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn test_registered_metrics_are_encoded() {
        let mut registry = Registry::default();
        let metrics = Metrics::init(&mut registry);
        metrics.routed.inc_by(5);
        metrics.signaled.inc();

        let mut buffer = String::new();
        encode(&mut buffer, &registry).unwrap();
        assert!(buffer.contains("mailbench_routed_total 5"));
        assert!(buffer.contains("mailbench_signaled_total 1"));
        assert!(buffer.contains("mailbench_runs_total 0"));
    }
}
