//! HTTP/JSON implementation of [`PersistenceBridge`] for the campaign REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, multipart};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    auth::CredentialSource,
    bridge::{BridgeResult, PersistenceBridge},
    config::ApiConfig,
    draft::{Agent, Lead, LeadFile, NewSession, PhoneNumber, RemoteId, SessionUpdate},
    error::BridgeError,
};

#[derive(Deserialize)]
struct CreatedSession {
    id: RemoteId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LeadUploadResponse {
    Wrapped { leads: Vec<Lead> },
    Bare(Vec<Lead>),
}

pub struct HttpBridge {
    client: Client,
    config: ApiConfig,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpBridge {
    pub fn new(config: ApiConfig, credentials: Arc<dyn CredentialSource>) -> BridgeResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BridgeError::NetworkError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> BridgeResult<RequestBuilder> {
        let token = self
            .credentials
            .bearer_token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(BridgeError::AuthRequired)?;
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> BridgeResult<Response> {
        let response = self.authorize(request)?.send().await.map_err(|e| {
            error!(error = %e, "campaign API unreachable");
            BridgeError::NetworkError(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, body = %body, "campaign API rejected request");
        Err(error_from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> BridgeResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BridgeError::ServerError(format!("unexpected response body: {}", e)))
    }
}

#[async_trait]
impl PersistenceBridge for HttpBridge {
    async fn create_session(&self, session: &NewSession) -> BridgeResult<RemoteId> {
        let request = self
            .client
            .post(self.config.endpoint("campaigns"))
            .json(session);
        let created: CreatedSession = self.send_json(request).await?;
        Ok(created.id)
    }

    async fn update_session(&self, id: &RemoteId, update: &SessionUpdate) -> BridgeResult<()> {
        let request = self
            .client
            .put(self.config.endpoint(&format!("campaigns/{}", id)))
            .json(update);
        self.send(request).await?;
        Ok(())
    }

    async fn upload_leads(&self, id: &RemoteId, file: LeadFile) -> BridgeResult<Vec<Lead>> {
        let part = multipart::Part::bytes(file.content)
            .file_name(file.file_name)
            .mime_str("text/csv")
            .map_err(|e| BridgeError::ValidationFailed(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);
        let request = self
            .client
            .post(self.config.endpoint(&format!("campaigns/{}/leads", id)))
            .multipart(form);

        let leads = match self.send_json::<LeadUploadResponse>(request).await? {
            LeadUploadResponse::Wrapped { leads } | LeadUploadResponse::Bare(leads) => leads,
        };
        Ok(leads)
    }

    async fn list_agents(&self) -> BridgeResult<Vec<Agent>> {
        self.send_json(self.client.get(self.config.endpoint("agents")))
            .await
    }

    async fn list_phone_numbers(&self) -> BridgeResult<Vec<PhoneNumber>> {
        self.send_json(self.client.get(self.config.endpoint("phone-numbers")))
            .await
    }
}

/// Map a non-success response onto the bridge taxonomy.
fn error_from_response(status: StatusCode, body: &str) -> BridgeError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return BridgeError::AuthRequired;
    }
    let message = extract_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    if status.is_client_error() {
        BridgeError::ValidationFailed(message)
    } else {
        BridgeError::ServerError(message)
    }
}

fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return Some(body.to_string());
    };
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| json.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| Some(body.to_string()))
}
