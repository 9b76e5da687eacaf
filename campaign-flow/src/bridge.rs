use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    draft::{
        Agent, AgentId, Lead, LeadFile, NewSession, PhoneNumber, RemoteId, SessionType,
        SessionUpdate,
    },
    error::BridgeError,
};

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Boundary to the campaign backend.
#[async_trait]
pub trait PersistenceBridge: Send + Sync {
    async fn create_session(&self, session: &NewSession) -> BridgeResult<RemoteId>;
    async fn update_session(&self, id: &RemoteId, update: &SessionUpdate) -> BridgeResult<()>;
    async fn upload_leads(&self, id: &RemoteId, file: LeadFile) -> BridgeResult<Vec<Lead>>;
    async fn list_agents(&self) -> BridgeResult<Vec<Agent>>;
    async fn list_phone_numbers(&self) -> BridgeResult<Vec<PhoneNumber>>;
}

/// A call received by [`InMemoryBridge`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    CreateSession(NewSession),
    UpdateSession(RemoteId, SessionUpdate),
    UploadLeads { id: RemoteId, file_name: String },
    ListAgents,
    ListPhoneNumbers,
}

/// Campaign as the in-memory backend keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: RemoteId,
    pub name: String,
    pub session_type: SessionType,
    pub goal: String,
    pub ideal_customer_description: Option<String>,
    pub agent_id: Option<AgentId>,
    pub leads: Vec<Lead>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct ScriptedFailures {
    create: Option<BridgeError>,
    update: Option<BridgeError>,
    upload: Option<BridgeError>,
}

/// In-memory implementation of PersistenceBridge
pub struct InMemoryBridge {
    sessions: Arc<DashMap<RemoteId, StoredSession>>,
    agents: Vec<Agent>,
    phone_numbers: Vec<PhoneNumber>,
    calls: Mutex<Vec<BridgeCall>>,
    failures: Mutex<ScriptedFailures>,
    latency: Option<Duration>,
}

impl InMemoryBridge {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            agents: Vec::new(),
            phone_numbers: Vec::new(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(ScriptedFailures::default()),
            latency: None,
        }
    }

    pub fn with_agents(mut self, agents: Vec<Agent>) -> Self {
        self.agents = agents;
        self
    }

    pub fn with_phone_numbers(mut self, phone_numbers: Vec<PhoneNumber>) -> Self {
        self.phone_numbers = phone_numbers;
        self
    }

    /// Delay every write, so callers can observe in-flight submissions.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn fail_next_create(&self, err: BridgeError) {
        self.failures.lock().await.create = Some(err);
    }

    pub async fn fail_next_update(&self, err: BridgeError) {
        self.failures.lock().await.update = Some(err);
    }

    pub async fn fail_next_upload(&self, err: BridgeError) {
        self.failures.lock().await.upload = Some(err);
    }

    pub async fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().await.clone()
    }

    pub async fn count_creates(&self) -> usize {
        self.count(|c| matches!(c, BridgeCall::CreateSession(_))).await
    }

    pub async fn count_updates(&self) -> usize {
        self.count(|c| matches!(c, BridgeCall::UpdateSession(..))).await
    }

    pub fn session(&self, id: &RemoteId) -> Option<StoredSession> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    async fn count(&self, pred: impl Fn(&BridgeCall) -> bool) -> usize {
        self.calls.lock().await.iter().filter(|&c| pred(c)).count()
    }

    async fn record(&self, call: BridgeCall) {
        self.calls.lock().await.push(call);
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for InMemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceBridge for InMemoryBridge {
    async fn create_session(&self, session: &NewSession) -> BridgeResult<RemoteId> {
        self.record(BridgeCall::CreateSession(session.clone())).await;
        self.simulate_latency().await;
        if let Some(err) = self.failures.lock().await.create.take() {
            return Err(err);
        }
        if session.name.trim().is_empty() {
            return Err(BridgeError::ValidationFailed("name is required".to_string()));
        }

        let id = RemoteId(Uuid::new_v4().to_string());
        let now = Utc::now();
        self.sessions.insert(
            id.clone(),
            StoredSession {
                id: id.clone(),
                name: session.name.clone(),
                session_type: session.session_type,
                goal: session.goal.clone(),
                ideal_customer_description: None,
                agent_id: None,
                leads: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_session(&self, id: &RemoteId, update: &SessionUpdate) -> BridgeResult<()> {
        self.record(BridgeCall::UpdateSession(id.clone(), update.clone()))
            .await;
        self.simulate_latency().await;
        if let Some(err) = self.failures.lock().await.update.take() {
            return Err(err);
        }

        let mut stored = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| BridgeError::ServerError(format!("campaign {} not found", id)))?;
        if stored.session_type != update.session_type {
            return Err(BridgeError::ValidationFailed(
                "campaign type cannot be changed".to_string(),
            ));
        }
        stored.name = update.name.clone();
        stored.goal = update.goal.clone();
        stored.ideal_customer_description = update.ideal_customer_description.clone();
        stored.agent_id = update.agent_id.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn upload_leads(&self, id: &RemoteId, file: LeadFile) -> BridgeResult<Vec<Lead>> {
        self.record(BridgeCall::UploadLeads {
            id: id.clone(),
            file_name: file.file_name.clone(),
        })
        .await;
        self.simulate_latency().await;
        if let Some(err) = self.failures.lock().await.upload.take() {
            return Err(err);
        }

        let leads = parse_leads_csv(&file.content)?;
        let mut stored = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| BridgeError::ServerError(format!("campaign {} not found", id)))?;
        stored.leads = leads.clone();
        stored.updated_at = Utc::now();
        Ok(leads)
    }

    async fn list_agents(&self) -> BridgeResult<Vec<Agent>> {
        self.record(BridgeCall::ListAgents).await;
        Ok(self.agents.clone())
    }

    async fn list_phone_numbers(&self) -> BridgeResult<Vec<PhoneNumber>> {
        self.record(BridgeCall::ListPhoneNumbers).await;
        Ok(self.phone_numbers.clone())
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header-driven lead reader: `phone` is required, `name` and `email` are optional.
/// Header names match case-insensitively and rows without a phone are skipped.
fn parse_leads_csv(content: &[u8]) -> BridgeResult<Vec<Lead>> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| BridgeError::ValidationFailed(format!("unreadable lead file header: {e}")))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let phone_col = column("phone").ok_or_else(|| {
        BridgeError::ValidationFailed("lead file must contain a 'phone' column".to_string())
    })?;
    let name_col = column("name");
    let email_col = column("email");

    let mut leads = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            BridgeError::ValidationFailed(format!("lead file row {}: {}", row + 2, e))
        })?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let Some(phone) = field(Some(phone_col)) else {
            continue;
        };
        leads.push(Lead {
            name: field(name_col).unwrap_or_default(),
            phone,
            email: field(email_col),
        });
    }
    Ok(leads)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session(name: &str) -> NewSession {
        NewSession {
            name: name.to_string(),
            session_type: SessionType::Outbound,
            goal: String::new(),
        }
    }

    #[tokio::test]
    async fn create_then_update() {
        let bridge = InMemoryBridge::new();
        let id = bridge.create_session(&new_session("Q1 Sales")).await.unwrap();

        let update = SessionUpdate {
            name: "Q1 Sales".to_string(),
            goal: "Qualify book buyers".to_string(),
            ideal_customer_description: None,
            session_type: SessionType::Outbound,
            agent_id: Some(AgentId::from("a1")),
        };
        bridge.update_session(&id, &update).await.unwrap();

        let stored = bridge.session(&id).unwrap();
        assert_eq!(stored.goal, "Qualify book buyers");
        assert_eq!(stored.agent_id, Some(AgentId::from("a1")));
        assert_eq!(bridge.count_creates().await, 1);
        assert_eq!(bridge.count_updates().await, 1);
    }

    #[tokio::test]
    async fn update_rejects_type_change() {
        let bridge = InMemoryBridge::new();
        let id = bridge.create_session(&new_session("Q1")).await.unwrap();
        let update = SessionUpdate {
            name: "Q1".to_string(),
            goal: String::new(),
            ideal_customer_description: None,
            session_type: SessionType::Inbound,
            agent_id: None,
        };
        let err = bridge.update_session(&id, &update).await.unwrap_err();
        assert!(matches!(err, BridgeError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn scripted_failure_applies_once() {
        let bridge = InMemoryBridge::new();
        bridge
            .fail_next_create(BridgeError::ServerError("boom".to_string()))
            .await;
        assert!(bridge.create_session(&new_session("A")).await.is_err());
        assert!(bridge.create_session(&new_session("A")).await.is_ok());
        assert_eq!(bridge.count_creates().await, 2);
    }

    #[tokio::test]
    async fn upload_parses_csv() {
        let bridge = InMemoryBridge::new();
        let id = bridge.create_session(&new_session("Q1")).await.unwrap();
        let file = LeadFile::from_csv(
            "leads.csv",
            "Name, Phone, Email\nAda,+15550100,ada@example.com\nGrace,+15550101,\n,,\n",
        );

        let leads = bridge.upload_leads(&id, file).await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].email.as_deref(), Some("ada@example.com"));
        assert_eq!(leads[1].email, None);
        assert_eq!(bridge.session(&id).unwrap().leads.len(), 2);
    }

    #[test]
    fn csv_without_phone_column_is_rejected() {
        let err = parse_leads_csv(b"name,email\nAda,ada@example.com\n").unwrap_err();
        assert!(matches!(err, BridgeError::ValidationFailed(msg) if msg.contains("phone")));
        assert!(parse_leads_csv(b"").is_err());
    }

    #[test]
    fn quoted_commas_stay_in_one_field() {
        let leads = parse_leads_csv(
            b"name,phone,email\n\"Lovelace, Ada\",+15550100,ada@example.com\n",
        )
        .unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Lovelace, Ada");
        assert_eq!(leads[0].phone, "+15550100");
        assert_eq!(leads[0].email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let leads = parse_leads_csv("\u{feff}phone,name\n+15550100,Ada\n".as_bytes()).unwrap();
        assert_eq!(
            leads,
            vec![Lead {
                name: "Ada".to_string(),
                phone: "+15550100".to_string(),
                email: None,
            }]
        );
    }

    #[test]
    fn non_utf8_row_is_rejected() {
        let err = parse_leads_csv(b"phone,name\n+15550100,\xff\xfe\n").unwrap_err();
        assert!(matches!(err, BridgeError::ValidationFailed(msg) if msg.contains("row 2")));
    }

    #[tokio::test]
    async fn listings_are_best_effort() {
        let bridge = InMemoryBridge::new();
        assert!(bridge.list_agents().await.unwrap().is_empty());
        assert!(bridge.list_phone_numbers().await.unwrap().is_empty());
        assert_eq!(
            bridge.calls().await,
            vec![BridgeCall::ListAgents, BridgeCall::ListPhoneNumbers]
        );
    }
}
