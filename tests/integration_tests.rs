//! Integration tests for the SSP Connector HTTP surface.

mod test_utils;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, redirect::Policy};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde_json::{Value, json};
use ssp_connector::config::AppConfig;
use ssp_connector::models::configuration;
use ssp_connector::server::{AppState, create_app};
use tokio::net::TcpListener;
use uuid::Uuid;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// Starts the app on a random port over the given database.
async fn start_test_server(db: DatabaseConnection, platform_base_url: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    let config = AppConfig {
        platform_base_url: platform_base_url.to_string(),
        ..AppConfig::default()
    };
    let state = AppState::new(Arc::new(config), db);
    let app = create_app(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Client that does not follow redirects, so 303 responses stay observable.
fn client() -> Client {
    Client::builder().redirect(Policy::none()).build().unwrap()
}

#[tokio::test]
async fn root_endpoint_reports_service_identity() {
    let db = test_utils::setup_test_db().await.unwrap();
    let server_url = start_test_server(db, "https://platform.test").await;

    let response = client()
        .get(format!("{}/", server_url))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body.get("service").unwrap().as_str().unwrap(),
        "ssp-connector"
    );
    assert!(body.get("version").is_some());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let db = test_utils::setup_test_db().await.unwrap();
    let server_url = start_test_server(db, "https://platform.test").await;

    let response = client()
        .get(format!("{}/openapi.json", server_url))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body.get("openapi").is_some());
    assert_eq!(
        body["info"]["title"].as_str().unwrap(),
        "SSP Connector API"
    );
}

#[tokio::test]
async fn create_configuration_returns_201_and_hides_secrets() {
    let db = test_utils::setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/odoo/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "account_id": 42,
            "sso_token": "issued-key"
        })))
        .mount(&mock_server)
        .await;

    let server_url = start_test_server(db, &mock_server.uri()).await;
    let company_id = Uuid::new_v4();

    let response = client()
        .post(format!("{}/configurations", server_url))
        .json(&json!({
            "company_id": company_id,
            "company_name": "Acme",
            "admin_email": "ada@acme.test",
            "requested_by": "ada"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "connected");
    assert_eq!(body["account_id"], "42");
    assert_eq!(body["has_api_key"], true);
    // Secrets never appear in responses.
    assert!(body.get("api_key").is_none());
    assert!(body.get("communication_token").is_none());

    // Second creation for the same company conflicts.
    let response = client()
        .post(format!("{}/configurations", server_url))
        .json(&json!({
            "company_id": company_id,
            "company_name": "Acme",
            "admin_email": "ada@acme.test"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn create_configuration_with_invalid_email_is_400() {
    let db = test_utils::setup_test_db().await.unwrap();
    let server_url = start_test_server(db, "https://platform.test").await;

    let response = client()
        .post(format!("{}/configurations", server_url))
        .json(&json!({
            "company_id": Uuid::new_v4(),
            "company_name": "Acme",
            "admin_email": "not-an-email"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn get_configuration_404_when_absent_then_200_after_insert() {
    let db = test_utils::setup_test_db().await.unwrap();
    let company_id = Uuid::new_v4();
    let server_url = start_test_server(db.clone(), "https://platform.test").await;

    let response = client()
        .get(format!("{}/configurations/{}", server_url, company_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);

    test_utils::insert_configuration(&db, company_id, Some("issued-key"), "connected")
        .await
        .unwrap();

    let response = client()
        .get(format!("{}/configurations/{}", server_url, company_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["company_id"], company_id.to_string());
    assert_eq!(body["status"], "connected");
    assert_eq!(body["has_api_key"], true);
    assert!(body.get("api_key").is_none());
}

#[tokio::test]
async fn deactivate_configuration_returns_204_then_404() {
    let db = test_utils::setup_test_db().await.unwrap();
    let company_id = Uuid::new_v4();
    test_utils::insert_configuration(&db, company_id, Some("issued-key"), "connected")
        .await
        .unwrap();
    let server_url = start_test_server(db, "https://platform.test").await;

    let response = client()
        .delete(format!("{}/configurations/{}", server_url, company_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 204);

    let response = client()
        .get(format!("{}/configurations/{}", server_url, company_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);

    let response = client()
        .delete(format!("{}/configurations/{}", server_url, company_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn entry_point_endpoint_reports_action() {
    let db = test_utils::setup_test_db().await.unwrap();
    let company_id = Uuid::new_v4();
    let server_url = start_test_server(db.clone(), "https://platform.test").await;

    let response = client()
        .get(format!(
            "{}/configurations/{}/entry-point",
            server_url, company_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["action"], "create_configuration");

    test_utils::insert_configuration(&db, company_id, Some("issued-key"), "connected")
        .await
        .unwrap();

    let response = client()
        .get(format!(
            "{}/configurations/{}/entry-point",
            server_url, company_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["action"], "dashboard");
    assert_eq!(
        body["sso_url"],
        "https://platform.test/sso/odoo?token=issued-key"
    );
}

#[tokio::test]
async fn dashboard_redirects_through_sso_when_registered() {
    let db = test_utils::setup_test_db().await.unwrap();
    let company_id = Uuid::new_v4();
    test_utils::insert_configuration(&db, company_id, Some("issued-key"), "connected")
        .await
        .unwrap();
    let server_url = start_test_server(db, "https://platform.test").await;

    let response = client()
        .get(format!("{}/dashboard/{}", server_url, company_id))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 303);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://platform.test/sso/odoo?token=issued-key"
    );
}

#[tokio::test]
async fn dashboard_404_without_configuration_409_without_key() {
    let db = test_utils::setup_test_db().await.unwrap();
    let server_url = start_test_server(db.clone(), "https://platform.test").await;

    let missing = Uuid::new_v4();
    let response = client()
        .get(format!("{}/dashboard/{}", server_url, missing))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "NO_CONFIGURATION");

    let unregistered = Uuid::new_v4();
    test_utils::insert_configuration(&db, unregistered, None, "error")
        .await
        .unwrap();
    let response = client()
        .get(format!("{}/dashboard/{}", server_url, unregistered))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "NOT_REGISTERED");
}

#[tokio::test]
async fn register_endpoint_maps_conflict_to_409() {
    let db = test_utils::setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/odoo/register"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&mock_server)
        .await;

    let server_url = start_test_server(db, &mock_server.uri()).await;
    let company_id = Uuid::new_v4();

    // Creation swallows the failure and reports an error status.
    let response = client()
        .post(format!("{}/configurations", server_url))
        .json(&json!({
            "company_id": company_id,
            "company_name": "Acme",
            "admin_email": "ada@acme.test"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "error");

    // A manual retry surfaces the conflict.
    let response = client()
        .post(format!(
            "{}/configurations/{}/register",
            server_url, company_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "ALREADY_REGISTERED");
}

#[tokio::test]
async fn test_connection_endpoint_returns_notification() {
    let db = test_utils::setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/odoo/test-connection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&mock_server)
        .await;

    let company_id = Uuid::new_v4();
    test_utils::insert_configuration(&db, company_id, Some("issued-key"), "error")
        .await
        .unwrap();
    // The stored record targets its own platform URL, so point it at the mock.
    let server_url = start_test_server(db.clone(), &mock_server.uri()).await;

    let record = configuration::Entity::find()
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let mut active: configuration::ActiveModel = record.into();
    active.platform_base_url = Set(mock_server.uri());
    active.update(&db).await.unwrap();

    let response = client()
        .post(format!(
            "{}/configurations/{}/test-connection",
            server_url, company_id
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["type"], "success");

    // A recovered test advances the record back to connected.
    let response = client()
        .get(format!("{}/configurations/{}", server_url, company_id))
        .send()
        .await
        .expect("Failed to execute request");
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "connected");
}
