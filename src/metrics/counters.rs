//! Counter helpers

use super::labels;

/// Record a successful connect
pub fn connection_opened(transport: &'static str) {
    metrics::counter!(labels::CONNECTIONS_OPENED, "transport" => transport).increment(1);
}

/// Record a failed connect
pub fn connection_failed(transport: &'static str, reason: &'static str) {
    metrics::counter!(
        labels::CONNECTIONS_FAILED,
        "transport" => transport,
        "reason" => reason
    )
    .increment(1);
}

/// Record a closed socket
pub fn connection_closed(transport: &'static str) {
    metrics::counter!(labels::CONNECTIONS_CLOSED, "transport" => transport).increment(1);
}

/// Record a TLS handshake outcome
pub fn tls_upgrade(outcome: &'static str) {
    metrics::counter!(labels::TLS_UPGRADES, "outcome" => outcome).increment(1);
}

/// Record a bind attempt
pub fn bind_attempted() {
    metrics::counter!(labels::BINDS_ATTEMPTED).increment(1);
}

/// Record a bind outcome
pub fn bind_completed(outcome: &'static str) {
    metrics::counter!(labels::BINDS_COMPLETED, "outcome" => outcome).increment(1);
}
