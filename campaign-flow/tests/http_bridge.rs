#![cfg(feature = "http")]

use campaign_flow::{
    AgentId, ApiConfig, BridgeError, ErrorKind, FailureOrigin, HttpBridge, LeadFile,
    NavigationTarget, NewSession, PersistenceBridge, RemoteId, SessionType, SessionUpdate,
    StaticCredentials, StepOutcome, WizardController, WizardStatus,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, header, header_regex, method, path},
};

fn http_bridge(server: &MockServer) -> HttpBridge {
    let config = ApiConfig::new(server.uri()).unwrap();
    HttpBridge::new(config, Arc::new(StaticCredentials::new("tok"))).unwrap()
}

fn new_session(name: &str) -> NewSession {
    NewSession {
        name: name.to_string(),
        session_type: SessionType::Outbound,
        goal: "Qualify book buyers".to_string(),
    }
}

#[tokio::test]
async fn create_posts_payload_and_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/campaigns"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({
            "name": "Q1 Sales",
            "type": "outbound",
            "goal": "Qualify book buyers",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "c-42" })))
        .expect(1)
        .mount(&server)
        .await;

    let id = http_bridge(&server)
        .create_session(&new_session("Q1 Sales"))
        .await
        .unwrap();
    assert_eq!(id, RemoteId::from("c-42"));
}

#[tokio::test]
async fn update_puts_to_the_campaign_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/campaigns/c-42"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({
            "name": "Q1 Sales",
            "goal": "Qualify book buyers",
            "ideal_customer_description": null,
            "type": "outbound",
            "agent_id": "a1",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let update = SessionUpdate {
        name: "Q1 Sales".to_string(),
        goal: "Qualify book buyers".to_string(),
        ideal_customer_description: None,
        session_type: SessionType::Outbound,
        agent_id: Some(AgentId::from("a1")),
    };
    http_bridge(&server)
        .update_session(&RemoteId::from("c-42"), &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn lead_upload_is_multipart_with_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/campaigns/c-42/leads"))
        .and(header("authorization", "Bearer tok"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains(r#"name="file"; filename="leads.csv""#))
        .and(body_string_contains("+15550100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "leads": [{ "name": "Ada", "phone": "+15550100" }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let leads = http_bridge(&server)
        .upload_leads(
            &RemoteId::from("c-42"),
            LeadFile::from_csv("leads.csv", "name,phone\nAda,+15550100\n"),
        )
        .await
        .unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].phone, "+15550100");
}

#[tokio::test]
async fn rejected_status_codes_map_to_bridge_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/phone-numbers"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let bridge = http_bridge(&server);
    assert_eq!(bridge.list_agents().await.unwrap_err(), BridgeError::AuthRequired);
    assert_eq!(
        bridge.list_phone_numbers().await.unwrap_err(),
        BridgeError::ServerError("upstream down".to_string())
    );
}

#[tokio::test]
async fn rejected_create_reaches_the_wizard_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Agent a1 has no phone number assigned",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = WizardController::new(
        Arc::new(http_bridge(&server)),
        Arc::new(StaticCredentials::new("tok")),
    );
    controller.set_name("Q1 Sales").await.unwrap();
    controller.select_agent(Some(AgentId::from("a1"))).await.unwrap();

    let StepOutcome::Failed(err) = controller.next().await.unwrap() else {
        panic!("expected the create to fail");
    };
    assert_eq!(err.kind, ErrorKind::MissingPhoneNumber);
    assert_eq!(err.origin, FailureOrigin::Rejected);
    assert_eq!(err.raw, "Agent a1 has no phone number assigned");
    assert_eq!(
        err.action.map(|a| a.target),
        Some(NavigationTarget::AssignPhoneNumber {
            agent_id: Some(AgentId::from("a1"))
        })
    );
    assert!(matches!(
        controller.status().await,
        WizardStatus::Error { step: 0, .. }
    ));
}

#[tokio::test]
async fn expired_token_asks_for_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let controller = WizardController::new(
        Arc::new(http_bridge(&server)),
        Arc::new(StaticCredentials::new("tok")),
    );
    controller.set_name("Q1 Sales").await.unwrap();
    assert_eq!(controller.next().await.unwrap(), StepOutcome::LoginRequired);
    assert_eq!(controller.status().await, WizardStatus::Editing { step: 0 });
}
