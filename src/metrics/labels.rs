//! Metric names and label values

/// Sockets successfully connected
pub const CONNECTIONS_OPENED: &str = "ldap_session_connections_opened_total";
/// Connect attempts that failed
pub const CONNECTIONS_FAILED: &str = "ldap_session_connections_failed_total";
/// Sockets closed
pub const CONNECTIONS_CLOSED: &str = "ldap_session_connections_closed_total";
/// TLS handshakes on connected sockets
pub const TLS_UPGRADES: &str = "ldap_session_tls_upgrades_total";
/// Bind attempts
pub const BINDS_ATTEMPTED: &str = "ldap_session_binds_attempted_total";
/// Bind outcomes
pub const BINDS_COMPLETED: &str = "ldap_session_binds_completed_total";
/// Time to establish the transport connection
pub const CONNECT_DURATION: &str = "ldap_session_connect_duration_ms";
/// Time to complete a bind
pub const BIND_DURATION: &str = "ldap_session_bind_duration_ms";

/// Connect failed with an I/O error
pub const REASON_IO: &str = "io";
/// Connect or read timed out
pub const REASON_TIMEOUT: &str = "timeout";
/// Implicit TLS handshake failed after the transport connected
pub const REASON_TLS: &str = "tls";

/// Operation succeeded
pub const OUTCOME_SUCCESS: &str = "success";
/// Operation failed
pub const OUTCOME_FAILURE: &str = "failure";
