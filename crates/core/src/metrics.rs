//! Metrics instrumentation for house creation.

use std::time::Instant;

pub const HOUSE_CREATED: &str = "house_created_total";
pub const HOUSE_CREATE_FAILED: &str = "house_create_failed_total";
pub const UNAUTHENTICATED_CALLS: &str = "unauthenticated_calls_total";
pub const CALLABLE_LATENCY: &str = "callable_request_latency";

pub fn increment_house_created() {
    metrics::counter!(HOUSE_CREATED, 1);
}

pub fn increment_house_create_failed() {
    metrics::counter!(HOUSE_CREATE_FAILED, 1);
}

pub fn increment_unauthenticated() {
    metrics::counter!(UNAUTHENTICATED_CALLS, 1);
}

/// Record callable request latency, labelled by function name.
pub fn record_callable_latency(function: &'static str, duration_ms: f64) {
    metrics::histogram!(CALLABLE_LATENCY, duration_ms, "function" => function);
}

/// RAII timer recording callable latency on drop.
pub struct MetricTimer {
    start: Instant,
    function: &'static str,
}

impl MetricTimer {
    pub fn new(function: &'static str) -> Self {
        Self {
            start: Instant::now(),
            function,
        }
    }
}

impl Drop for MetricTimer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        record_callable_latency(self.function, duration_ms);
    }
}
