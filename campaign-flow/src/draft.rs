use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a campaign session. Fixed once the remote entity exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Outbound,
    Inbound,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::Outbound => f.write_str("outbound"),
            SessionType::Inbound => f.write_str("inbound"),
        }
    }
}

/// Identifier the backend assigns to a campaign on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub String);

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A contact targeted by an outbound session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Which agent should handle the session.
///
/// `Default` is an explicit decision to let the backend pick its default agent and is
/// distinct from `Undecided`; both are sent to the backend as a null agent id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", content = "agent_id", rename_all = "snake_case")]
pub enum AgentChoice {
    #[default]
    Undecided,
    Default,
    Specific(AgentId),
}

impl AgentChoice {
    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            AgentChoice::Specific(id) => Some(id),
            AgentChoice::Undecided | AgentChoice::Default => None,
        }
    }
}

impl From<Option<AgentId>> for AgentChoice {
    fn from(value: Option<AgentId>) -> Self {
        match value {
            Some(id) => AgentChoice::Specific(id),
            None => AgentChoice::Default,
        }
    }
}

/// In-memory campaign under construction, owned by a single wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardDraft {
    pub session_type: SessionType,
    pub name: String,
    pub goal: String,
    pub ideal_customer_description: String,
    pub leads: Vec<Lead>,
    pub agent: AgentChoice,
    pub(crate) remote_id: Option<RemoteId>,
}

impl WizardDraft {
    pub fn new(session_type: SessionType) -> Self {
        Self {
            session_type,
            ..Self::default()
        }
    }

    pub fn remote_id(&self) -> Option<&RemoteId> {
        self.remote_id.as_ref()
    }

    /// Records the backend id. Only the first assignment sticks.
    pub(crate) fn assign_remote_id(&mut self, id: RemoteId) -> bool {
        if self.remote_id.is_some() {
            return false;
        }
        self.remote_id = Some(id);
        true
    }

    pub fn new_session(&self) -> NewSession {
        NewSession {
            name: self.name.trim().to_string(),
            session_type: self.session_type,
            goal: self.goal.trim().to_string(),
        }
    }

    pub fn session_update(&self) -> SessionUpdate {
        let description = self.ideal_customer_description.trim();
        SessionUpdate {
            name: self.name.trim().to_string(),
            goal: self.goal.trim().to_string(),
            ideal_customer_description: (!description.is_empty())
                .then(|| description.to_string()),
            session_type: self.session_type,
            agent_id: self.agent.agent_id().cloned(),
        }
    }
}

/// Payload for creating a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub name: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub goal: String,
}

/// Full payload for updating an existing campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub name: String,
    pub goal: String,
    pub ideal_customer_description: Option<String>,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub agent_id: Option<AgentId>,
}

/// Raw lead list as picked by the user, parsed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl LeadFile {
    pub fn from_csv(file_name: impl Into<String>, csv: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: csv.into().into_bytes(),
        }
    }

    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "leads.csv".to_string());
        Ok(Self { file_name, content })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub llm_provider: String,
    #[serde(default)]
    pub tts_provider: String,
    #[serde(default)]
    pub stt_provider: String,
    #[serde(default)]
    pub personality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub id: String,
    pub number: String,
    #[serde(default)]
    pub agent_id: Option<AgentId>,
}
