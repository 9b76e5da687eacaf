use thiserror::Error;

use crate::draft::SessionType;

/// Failures reported by a [`PersistenceBridge`](crate::PersistenceBridge).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("authentication required")]
    AuthRequired,

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("server error: {0}")]
    ServerError(String),
}

impl BridgeError {
    /// The raw message as the backend phrased it, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            BridgeError::AuthRequired => "authentication required",
            BridgeError::ValidationFailed(msg)
            | BridgeError::NetworkError(msg)
            | BridgeError::ServerError(msg) => msg,
        }
    }
}

/// Misuse of the wizard API. Expected user-facing results (validation blocks, classified
/// backend failures, missing login) are reported through `StepOutcome` instead.
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("step {index} is out of range for {session_type} sessions ({count} steps)")]
    StepOutOfRange {
        session_type: SessionType,
        index: usize,
        count: usize,
    },

    #[error("finish is only available on the final step (at step {current}, final step is {last})")]
    NotAtFinalStep { current: usize, last: usize },

    #[error("session type cannot change once the campaign has been created")]
    SessionTypeLocked,

    #[error("{0} sessions do not take a lead list")]
    LeadsNotApplicable(SessionType),

    #[error("the campaign has not been created yet")]
    NotYetCreated,

    #[error("an error is pending and must be dismissed first")]
    ErrorPending,

    #[error("there is no error to dismiss")]
    NoErrorToDismiss,

    #[error("the wizard has already completed")]
    AlreadyCompleted,

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, WizardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_strips_variant_prefix() {
        let err = BridgeError::ServerError("Agent is active in call session 42".to_string());
        assert_eq!(err.message(), "Agent is active in call session 42");
        assert_eq!(err.to_string(), "server error: Agent is active in call session 42");
        assert_eq!(BridgeError::AuthRequired.message(), "authentication required");
    }
}
