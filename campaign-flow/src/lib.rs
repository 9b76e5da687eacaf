pub mod auth;
pub mod bridge;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod draft;
pub mod error;
pub mod graph;
#[cfg(feature = "http")]
pub mod http;
pub mod validation;

// Re-export commonly used types
pub use auth::{CredentialSource, StaticCredentials};
pub use bridge::{BridgeCall, BridgeResult, InMemoryBridge, PersistenceBridge, StoredSession};
pub use classifier::{
    ClassifiedError, ErrorKind, FailureOrigin, NavigationTarget, SuggestedAction, classify,
};
pub use config::{ApiConfig, ConfigError};
pub use controller::{Operation, StepOutcome, WizardController, WizardSnapshot, WizardStatus};
pub use draft::{
    Agent, AgentChoice, AgentId, Lead, LeadFile, NewSession, PhoneNumber, RemoteId, SessionType,
    SessionUpdate, WizardDraft,
};
pub use error::{BridgeError, Result, WizardError};
pub use graph::{StepGraph, StepKind, WizardState};
#[cfg(feature = "http")]
pub use http::HttpBridge;
pub use validation::{ValidationGate, Verdict};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_inbound_walkthrough() {
        let bridge = Arc::new(InMemoryBridge::new());
        let controller =
            WizardController::new(bridge.clone(), Arc::new(StaticCredentials::new("t")));

        controller.set_session_type(SessionType::Inbound).await.unwrap();
        controller.set_name("Support Line").await.unwrap();
        controller.set_goal("Answer billing questions").await.unwrap();

        let mut kinds = Vec::new();
        loop {
            match controller.next().await.unwrap() {
                StepOutcome::Moved { kind, .. } => kinds.push(kind),
                StepOutcome::Stayed => break,
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert_eq!(
            kinds,
            vec![StepKind::SelectAgent, StepKind::SetGoal, StepKind::Review]
        );

        let outcome = controller.finish().await.unwrap();
        assert!(matches!(outcome, StepOutcome::Completed { .. }));
        assert!(matches!(
            controller.set_name("late edit").await,
            Err(WizardError::AlreadyCompleted)
        ));
    }
}
