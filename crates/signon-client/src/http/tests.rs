// crates/signon-client/src/http/tests.rs
// ============================================================================
// Module: HTTP Action API Tests
// Description: Unit tests for the reqwest-backed action API.
// Purpose: Validate URL building, auth headers, status mapping and paging.
// Dependencies: signon-client, axum
// ============================================================================

//! ## Overview
//! Runs the HTTP client against an in-memory axum server that answers from a
//! scripted route table and records every request it receives.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use serde_json::Value;
use serde_json::json;
use signon_core::ActionId;
use signon_core::EnvironmentId;
use signon_core::SignOnPolicyId;
use signon_core::minimal_login_action;
use tokio::sync::oneshot;

use super::ClientSettings;
use super::HttpSignOnPolicyActionApi;
use crate::api::ActionPages;
use crate::api::SignOnPolicyActionApi;
use crate::error::ClientError;
use crate::retry::CancelSignal;
use crate::token::StaticTokenSource;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const ACTIONS_PATH: &str = "/v1/environments/env1/signOnPolicies/pol1/actions";

struct ScriptedRoute {
    method: Method,
    path: String,
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

struct RecordedRequest {
    method: Method,
    #[allow(dead_code, reason = "Recorded for debugging; not every test asserts on it.")]
    path: String,
    authorization: Option<String>,
    body: String,
}

#[derive(Default)]
struct ServerState {
    routes: Mutex<Vec<ScriptedRoute>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ServerState {
    fn route(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.routes.lock().unwrap().push(ScriptedRoute {
            method,
            path: path.to_string(),
            status,
            body: if body.is_null() { String::new() } else { body.to_string() },
            delay: None,
        });
    }
}

async fn scripted_handler(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(axum::http::HeaderName, &'static str); 1], String) {
    let path = uri.path_and_query().map_or_else(|| uri.path().to_string(), ToString::to_string);
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    });
    let scripted = {
        let routes = state.routes.lock().unwrap();
        routes
            .iter()
            .find(|route| route.method == method && route.path == path)
            .map(|route| (route.status, route.body.clone(), route.delay))
    };
    let (status, body, delay) =
        scripted.unwrap_or((StatusCode::NOT_FOUND, String::new(), None));
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    (status, [(CONTENT_TYPE, "application/json")], body)
}

async fn spawn_server(state: Arc<ServerState>) -> (String, oneshot::Sender<()>) {
    let app = Router::new().fallback(scripted_handler).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    (format!("http://{addr}"), shutdown_tx)
}

fn client_for(base_url: &str) -> HttpSignOnPolicyActionApi {
    let settings = ClientSettings {
        connect_timeout: Duration::from_millis(500),
        request_timeout: Duration::from_secs(5),
        ..ClientSettings::new(format!("{base_url}/v1/"))
    };
    HttpSignOnPolicyActionApi::new(&settings, Arc::new(StaticTokenSource::new("token-123")))
        .expect("client")
}

fn ids() -> (EnvironmentId, SignOnPolicyId) {
    (EnvironmentId::new("env1"), SignOnPolicyId::new("pol1"))
}

fn stored_login(id: &str, priority: u32) -> Value {
    json!({
        "id": id,
        "type": "LOGIN",
        "priority": priority,
        "recovery": { "enabled": true }
    })
}

// ============================================================================
// SECTION: Construction
// ============================================================================

#[test]
fn base_url_trimmed_on_construction() {
    let client = client_for("http://example.local");
    assert_eq!(client.base_url().as_str(), "http://example.local/v1");
}

#[test]
fn unsupported_base_url_rejected() {
    for raw in ["ftp://example.local", "not a url", "mailto:ops@example.local"] {
        let result =
            HttpSignOnPolicyActionApi::new(&ClientSettings::new(raw), Arc::new(StaticTokenSource::new("t")));
        assert!(matches!(result, Err(ClientError::InvalidRequest(_))), "{raw} accepted");
    }
}

#[test]
fn action_urls_escape_identifiers() {
    let client = client_for("http://example.local");
    let url = client
        .action_url(
            &EnvironmentId::new("env 1"),
            &SignOnPolicyId::new("pol1"),
            &ActionId::new("a/b"),
        )
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://example.local/v1/environments/env%201/signOnPolicies/pol1/actions/a%2Fb"
    );
}

// ============================================================================
// SECTION: Verbs
// ============================================================================

#[tokio::test]
async fn create_posts_action_with_bearer_token() {
    let state = Arc::new(ServerState::default());
    state.route(Method::POST, ACTIONS_PATH, StatusCode::CREATED, stored_login("act1", 2));
    let (base_url, shutdown_tx) = spawn_server(Arc::clone(&state)).await;
    let client = client_for(&base_url);
    let (environment_id, policy_id) = ids();

    let created = client
        .create_action(&environment_id, &policy_id, &minimal_login_action(2), &CancelSignal::new())
        .await
        .expect("create");
    assert_eq!(created.id.as_ref().map(ActionId::as_str), Some("act1"));

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer token-123"));
    let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(sent["type"], json!("LOGIN"));
    assert_eq!(sent["priority"], json!(2));
    drop(requests);
    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn read_maps_not_found_with_envelope() {
    let state = Arc::new(ServerState::default());
    state.route(
        Method::GET,
        &format!("{ACTIONS_PATH}/gone"),
        StatusCode::NOT_FOUND,
        json!({ "id": "err-1", "code": "NOT_FOUND", "message": "Unable to find action" }),
    );
    let (base_url, shutdown_tx) = spawn_server(state).await;
    let client = client_for(&base_url);
    let (environment_id, policy_id) = ids();

    let err = client
        .read_action(&environment_id, &policy_id, &ActionId::new("gone"), &CancelSignal::new())
        .await
        .expect_err("not found");
    assert!(err.is_not_found());
    assert_eq!(err.envelope().map(|envelope| envelope.code.as_str()), Some("NOT_FOUND"));
    let response = err.response().expect("response");
    assert_eq!(response.status, 404);
    assert!(response.url.ends_with(&format!("{ACTIONS_PATH}/gone")));
    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn update_and_delete_use_action_path() {
    let state = Arc::new(ServerState::default());
    let path = format!("{ACTIONS_PATH}/act1");
    state.route(Method::PUT, &path, StatusCode::OK, stored_login("act1", 5));
    state.route(Method::DELETE, &path, StatusCode::NO_CONTENT, Value::Null);
    let (base_url, shutdown_tx) = spawn_server(Arc::clone(&state)).await;
    let client = client_for(&base_url);
    let (environment_id, policy_id) = ids();
    let cancel = CancelSignal::new();
    let action_id = ActionId::new("act1");

    let updated = client
        .update_action(&environment_id, &policy_id, &action_id, &minimal_login_action(5), &cancel)
        .await
        .expect("update");
    assert_eq!(updated.priority, 5);
    client.delete_action(&environment_id, &policy_id, &action_id, &cancel).await.expect("delete");

    let methods: Vec<Method> =
        state.requests.lock().unwrap().iter().map(|request| request.method.clone()).collect();
    assert_eq!(methods, vec![Method::PUT, Method::DELETE]);
    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn undecodable_success_body_is_decode_error() {
    let state = Arc::new(ServerState::default());
    state.route(
        Method::GET,
        &format!("{ACTIONS_PATH}/odd"),
        StatusCode::OK,
        json!({ "id": "odd", "type": "SOMETHING_NEW", "priority": 2 }),
    );
    let (base_url, shutdown_tx) = spawn_server(state).await;
    let client = client_for(&base_url);
    let (environment_id, policy_id) = ids();

    let err = client
        .read_action(&environment_id, &policy_id, &ActionId::new("odd"), &CancelSignal::new())
        .await
        .expect_err("decode");
    assert!(matches!(err, ClientError::Decode(_)));
    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn environment_probe_reads_environment() {
    let state = Arc::new(ServerState::default());
    state.route(
        Method::GET,
        "/v1/environments/env1",
        StatusCode::OK,
        json!({ "id": "env1", "name": "Staging" }),
    );
    let (base_url, shutdown_tx) = spawn_server(state).await;
    let client = client_for(&base_url);

    let environment = client
        .get_environment(&EnvironmentId::new("env1"), &CancelSignal::new())
        .await
        .expect("probe");
    assert_eq!(environment.name.as_deref(), Some("Staging"));

    let err = client
        .get_environment(&EnvironmentId::new("other"), &CancelSignal::new())
        .await
        .expect_err("missing environment");
    assert!(err.is_not_found());
    let _ = shutdown_tx.send(());
}

// ============================================================================
// SECTION: Paging
// ============================================================================

#[tokio::test]
async fn pages_follow_next_links() {
    let state = Arc::new(ServerState::default());
    let (base_url, shutdown_tx) = spawn_server(Arc::clone(&state)).await;
    state.route(
        Method::GET,
        ACTIONS_PATH,
        StatusCode::OK,
        json!({
            "_embedded": { "actions": [stored_login("a1", 1), stored_login("a2", 2)] },
            "_links": { "next": { "href": format!("{base_url}{ACTIONS_PATH}?cursor=2") } }
        }),
    );
    state.route(
        Method::GET,
        &format!("{ACTIONS_PATH}?cursor=2"),
        StatusCode::OK,
        json!({ "_embedded": { "actions": [stored_login("a3", 3)] }, "_links": {} }),
    );
    let client = client_for(&base_url);
    let (environment_id, policy_id) = ids();
    let cancel = CancelSignal::new();

    let mut pages = ActionPages::new();
    let mut priorities = Vec::new();
    while let Some(link) = pages.next_link() {
        let page =
            client.fetch_page(&environment_id, &policy_id, link, &cancel).await.expect("page");
        let listed = pages.advance(page).expect("advance");
        priorities.extend(listed.iter().map(|action| action.priority));
    }
    assert_eq!(priorities, vec![1, 2, 3]);
    let first = pages.first_response().expect("first response");
    assert_eq!(first.status, 200);
    assert!(first.url.ends_with(ACTIONS_PATH));
    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn repeated_paging_link_ends_the_cursor() {
    let state = Arc::new(ServerState::default());
    let (base_url, shutdown_tx) = spawn_server(Arc::clone(&state)).await;
    let looping = format!("{base_url}{ACTIONS_PATH}?cursor=2");
    state.route(
        Method::GET,
        ACTIONS_PATH,
        StatusCode::OK,
        json!({
            "_embedded": { "actions": [stored_login("a1", 1)] },
            "_links": { "next": { "href": &looping } }
        }),
    );
    state.route(
        Method::GET,
        &format!("{ACTIONS_PATH}?cursor=2"),
        StatusCode::OK,
        json!({
            "_embedded": { "actions": [stored_login("a2", 2)] },
            "_links": { "next": { "href": &looping } }
        }),
    );
    let client = client_for(&base_url);
    let (environment_id, policy_id) = ids();
    let cancel = CancelSignal::new();

    let mut pages = ActionPages::new();
    let mut fetched = 0;
    let mut outcome = Ok(Vec::new());
    while let Some(link) = pages.next_link() {
        let page =
            client.fetch_page(&environment_id, &policy_id, link, &cancel).await.expect("page");
        fetched += 1;
        outcome = pages.advance(page);
        if outcome.is_err() {
            break;
        }
    }
    assert_eq!(fetched, 2);
    assert_eq!(outcome, Err(ClientError::PagingLoop(looping)));
    assert!(pages.next_link().is_none());
    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn paging_link_to_other_origin_is_refused() {
    let client = client_for("http://127.0.0.1:9");
    let (environment_id, policy_id) = ids();
    let err = client
        .fetch_page(
            &environment_id,
            &policy_id,
            Some("https://elsewhere.example/v1/actions?cursor=2"),
            &CancelSignal::new(),
        )
        .await
        .expect_err("foreign link");
    assert!(matches!(err, ClientError::InvalidRequest(_)));
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

#[tokio::test]
async fn cancellation_interrupts_in_flight_request() {
    let state = Arc::new(ServerState::default());
    state.routes.lock().unwrap().push(ScriptedRoute {
        method: Method::GET,
        path: format!("{ACTIONS_PATH}/slow"),
        status: StatusCode::OK,
        body: stored_login("slow", 2).to_string(),
        delay: Some(Duration::from_secs(3)),
    });
    let (base_url, shutdown_tx) = spawn_server(state).await;
    let client = client_for(&base_url);
    let (environment_id, policy_id) = ids();
    let cancel = CancelSignal::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client
        .read_action(&environment_id, &policy_id, &ActionId::new("slow"), &cancel)
        .await
        .expect_err("cancelled");
    assert_eq!(err, ClientError::Cancelled);
    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn cancelled_signal_skips_the_request() {
    let state = Arc::new(ServerState::default());
    let (base_url, shutdown_tx) = spawn_server(Arc::clone(&state)).await;
    let client = client_for(&base_url);
    let (environment_id, policy_id) = ids();
    let cancel = CancelSignal::new();
    cancel.cancel();

    let err = client
        .delete_action(&environment_id, &policy_id, &ActionId::new("act1"), &cancel)
        .await
        .expect_err("cancelled");
    assert_eq!(err, ClientError::Cancelled);
    assert!(state.requests.lock().unwrap().is_empty());
    let _ = shutdown_tx.send(());
}
