//! Histogram helpers

use super::labels;

/// Record how long a connect took
pub fn connect_duration(transport: &'static str, duration_ms: u64) {
    metrics::histogram!(labels::CONNECT_DURATION, "transport" => transport)
        .record(duration_ms as f64);
}

/// Record how long a bind took
pub fn bind_duration(duration_ms: u64) {
    metrics::histogram!(labels::BIND_DURATION).record(duration_ms as f64);
}
