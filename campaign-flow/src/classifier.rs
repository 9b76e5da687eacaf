//! Recovers structure from the backend's free-text campaign errors.
//!
//! The backend has no error codes for these cases, only human-readable messages. Rules are
//! matched case-insensitively, in order, and the first hit wins. Anything unmatched is
//! `Generic` and keeps the raw message.
//!
//! Only session create/update answers from the server go through the rules. Transport
//! failures and lead-upload failures stay `Generic`, with their [`FailureOrigin`] kept.

use serde::{Deserialize, Serialize};

use crate::{draft::AgentId, error::BridgeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AgentBusy,
    MissingPhoneNumber,
    MissingTraining,
    Generic,
}

/// How a failure surfaced, before any message rules were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureOrigin {
    /// The backend refused the request (4xx).
    Rejected,
    /// The backend was reached but failed.
    Server,
    /// The request never reached the backend.
    Unreachable,
}

impl From<&BridgeError> for FailureOrigin {
    fn from(err: &BridgeError) -> Self {
        match err {
            BridgeError::AuthRequired | BridgeError::ValidationFailed(_) => Self::Rejected,
            BridgeError::ServerError(_) => Self::Server,
            BridgeError::NetworkError(_) => Self::Unreachable,
        }
    }
}

/// Where a remedial action takes the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum NavigationTarget {
    CreateAgent,
    AssignPhoneNumber { agent_id: Option<AgentId> },
    TrainAgent { agent_id: Option<AgentId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub label: String,
    pub target: NavigationTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub origin: FailureOrigin,
    pub title: String,
    pub description: String,
    pub raw: String,
    pub action: Option<SuggestedAction>,
}

impl ClassifiedError {
    /// A failed session create or update. Answers from the server are matched against the
    /// rules; a request that never arrived is not.
    pub fn from_session_failure(err: &BridgeError) -> Self {
        let origin = FailureOrigin::from(err);
        if origin == FailureOrigin::Unreachable {
            return Self::unrefined(err);
        }
        Self {
            origin,
            ..classify(err.message())
        }
    }

    /// Any other failure: `Generic`, with the raw message and no remedy.
    pub fn unrefined(err: &BridgeError) -> Self {
        let origin = FailureOrigin::from(err);
        let title = match origin {
            FailureOrigin::Unreachable => "Could not reach the server",
            FailureOrigin::Rejected | FailureOrigin::Server => GENERIC_TITLE,
        };
        Self {
            kind: ErrorKind::Generic,
            origin,
            title: title.to_string(),
            description: err.message().to_string(),
            raw: err.message().to_string(),
            action: None,
        }
    }

    /// Points agent-specific remedies at the given agent.
    pub fn for_agent(mut self, agent_id: Option<&AgentId>) -> Self {
        if let Some(action) = self.action.as_mut() {
            match &mut action.target {
                NavigationTarget::AssignPhoneNumber { agent_id: target }
                | NavigationTarget::TrainAgent { agent_id: target } => {
                    *target = agent_id.cloned();
                }
                NavigationTarget::CreateAgent => {}
            }
        }
        self
    }
}

const GENERIC_TITLE: &str = "Something went wrong";

struct Rule {
    pattern: &'static str,
    kind: ErrorKind,
}

const RULES: &[Rule] = &[
    Rule {
        pattern: "active in call session",
        kind: ErrorKind::AgentBusy,
    },
    Rule {
        pattern: "phone number assigned",
        kind: ErrorKind::MissingPhoneNumber,
    },
    Rule {
        pattern: "knowledge base training",
        kind: ErrorKind::MissingTraining,
    },
];

/// Match a server message against the rules. The result has [`FailureOrigin::Server`].
pub fn classify(raw: &str) -> ClassifiedError {
    let haystack = raw.to_lowercase();
    let kind = RULES
        .iter()
        .find(|rule| haystack.contains(rule.pattern))
        .map_or(ErrorKind::Generic, |rule| rule.kind);

    let (title, description, action) = match kind {
        ErrorKind::AgentBusy => (
            "Agent is busy",
            "This agent is already active in another call session. \
             Create a new agent to run this campaign."
                .to_string(),
            Some(SuggestedAction {
                label: "Create new agent".to_string(),
                target: NavigationTarget::CreateAgent,
            }),
        ),
        ErrorKind::MissingPhoneNumber => (
            "No phone number assigned",
            "This agent needs a phone number before it can place or receive calls.".to_string(),
            Some(SuggestedAction {
                label: "Assign number for this agent".to_string(),
                target: NavigationTarget::AssignPhoneNumber { agent_id: None },
            }),
        ),
        ErrorKind::MissingTraining => (
            "Agent needs training",
            "This agent has not completed knowledge base training yet.".to_string(),
            Some(SuggestedAction {
                label: "Train this agent".to_string(),
                target: NavigationTarget::TrainAgent { agent_id: None },
            }),
        ),
        ErrorKind::Generic => (GENERIC_TITLE, raw.to_string(), None),
    };

    ClassifiedError {
        kind,
        origin: FailureOrigin::Server,
        title: title.to_string(),
        description,
        raw: raw.to_string(),
        action,
    }
}
