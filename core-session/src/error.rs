//! # Session Error Types
//!
//! Every failure the coordinator can observe is converted into one of these
//! kinds at the bridge boundary; raw platform errors never reach the
//! coordinator's logic.

use bridge_traits::BridgeError;
use thiserror::Error;

use crate::snapshot::SessionLifecycle;

/// Errors produced by the media session core.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The operation is not valid in the coordinator's current lifecycle state.
    #[error("Cannot {operation} while session is {state}")]
    InvalidLifecycleState {
        operation: &'static str,
        state: SessionLifecycle,
    },

    /// The audio policy refused focus; playback stays gated.
    #[error("Audio focus denied: {0}")]
    FocusDenied(String),

    /// The platform rejected the session metadata or notification.
    #[error("Notification render failed: {0}")]
    RenderFailure(String),

    /// The engine reported an unrecoverable error.
    #[error("Fatal engine error: {0}")]
    FatalEngineError(String),

    /// Artwork bytes could not be decoded or scaled.
    #[error("Artwork processing failed: {0}")]
    Artwork(String),

    /// The coordinator was created outside a tokio runtime.
    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl SessionError {
    /// Whether the session keeps running after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidLifecycleState { .. }
                | SessionError::FocusDenied(_)
                | SessionError::RenderFailure(_)
                | SessionError::Artwork(_)
                | SessionError::Bridge(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_error_message() {
        let err = SessionError::InvalidLifecycleState {
            operation: "report_state",
            state: SessionLifecycle::Stopped,
        };
        assert_eq!(err.to_string(), "Cannot report_state while session is stopped");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_recoverability() {
        assert!(SessionError::FocusDenied("call".into()).is_recoverable());
        assert!(SessionError::from(BridgeError::PayloadRejected("bitmap".into())).is_recoverable());
        assert!(!SessionError::FatalEngineError("decoder".into()).is_recoverable());
        assert!(!SessionError::RuntimeUnavailable("none".into()).is_recoverable());
    }
}
