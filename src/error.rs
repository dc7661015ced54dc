use derive_more::{Display, Error};

use crate::session::Phase;

/// Contract violations raised by the session engine.
///
/// `InvalidState` is returned by operations that were rejected without
/// touching any state (an answer after the round resolved, a second
/// `start()`), so callers may ignore it. `Configuration` is raised at setup
/// time only.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    #[display("cannot {operation} while the session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },
    #[display("invalid session configuration: {reason}")]
    Configuration { reason: String },
}

impl SessionError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        SessionError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, SessionError::InvalidState { .. })
    }
}
