//! Socket state machine

use crate::{Error, Result};

/// Socket lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SocketState {
    /// No stream attached (initial and after close)
    #[default]
    Disconnected,

    /// Connected, plaintext
    ConnectedPlain,

    /// Connected, TLS established
    ConnectedEncrypted,
}

impl SocketState {
    /// Check if transition is valid
    pub fn can_transition_to(&self, next: SocketState) -> bool {
        use SocketState::*;

        matches!(
            (self, next),
            (Disconnected, ConnectedPlain)
                | (Disconnected, ConnectedEncrypted)
                | (ConnectedPlain, ConnectedEncrypted)
                | (_, Disconnected)
        )
    }

    /// Transition to new state
    pub fn transition(&mut self, next: SocketState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidState {
                expected: format!("valid transition from {}", self),
                actual: next.to_string(),
            });
        }
        *self = next;
        Ok(())
    }

    /// Whether a stream is attached in this state
    pub fn is_connected(&self) -> bool {
        !matches!(self, SocketState::Disconnected)
    }
}

impl std::fmt::Display for SocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::ConnectedPlain => write!(f, "connected_plain"),
            Self::ConnectedEncrypted => write!(f, "connected_encrypted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_then_upgrade() {
        let mut state = SocketState::Disconnected;
        assert!(state.transition(SocketState::ConnectedPlain).is_ok());
        assert!(state.transition(SocketState::ConnectedEncrypted).is_ok());
        assert!(state.is_connected());
    }

    #[test]
    fn test_implicit_tls_skips_plain() {
        let mut state = SocketState::Disconnected;
        assert!(state.transition(SocketState::ConnectedEncrypted).is_ok());
    }

    #[test]
    fn test_no_downgrade() {
        let mut state = SocketState::ConnectedEncrypted;
        assert!(state.transition(SocketState::ConnectedPlain).is_err());
        assert_eq!(state, SocketState::ConnectedEncrypted);
    }

    #[test]
    fn test_close_from_any_state() {
        for start in [
            SocketState::Disconnected,
            SocketState::ConnectedPlain,
            SocketState::ConnectedEncrypted,
        ] {
            let mut state = start;
            assert!(state.transition(SocketState::Disconnected).is_ok());
            assert!(!state.is_connected());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(SocketState::ConnectedPlain.to_string(), "connected_plain");
    }
}
