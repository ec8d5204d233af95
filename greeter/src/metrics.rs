use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref GREETINGS_SERVED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "greeter_greetings_served_total",
        "Total greetings returned"
    ))
    .unwrap();
    pub static ref GREETING_MISSES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "greeter_greeting_misses_total",
        "Total greeting lookups with no matching language"
    ))
    .unwrap();
    pub static ref MEASUREMENTS_RECORDED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "greeter_measurements_recorded_total",
        "Total measurements inserted into the store"
    ))
    .unwrap();
    pub static ref STORE_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "greeter_store_failures_total",
        "Total failed store reads and writes"
    ))
    .unwrap();
    pub static ref STORE_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "greeter_store_latency_seconds",
            "Time taken by a single store operation"
        )
        .buckets(vec![
            0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0
        ])
    )
    .unwrap();
}

/// Registers every collector with [`REGISTRY`]. Calling it again is a no-op.
pub fn init_metrics() -> prometheus::Result<()> {
    register(Box::new(GREETINGS_SERVED_TOTAL.clone()))?;
    register(Box::new(GREETING_MISSES_TOTAL.clone()))?;
    register(Box::new(MEASUREMENTS_RECORDED_TOTAL.clone()))?;
    register(Box::new(STORE_FAILURES_TOTAL.clone()))?;
    register(Box::new(STORE_LATENCY_SECONDS.clone()))?;
    Ok(())
}

fn register(collector: Box<dyn Collector>) -> prometheus::Result<()> {
    match REGISTRY.register(collector) {
        Err(prometheus::Error::AlreadyReg) => Ok(()),
        other => other,
    }
}

pub fn gather_metrics() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_gather_lists_registered_metrics() {
        init_metrics().unwrap();
        GREETINGS_SERVED_TOTAL.inc();

        let text = gather_metrics().unwrap();
        assert!(text.contains("greeter_greetings_served_total"));
        assert!(text.contains("greeter_store_latency_seconds"));
    }
}
