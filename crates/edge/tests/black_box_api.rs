use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use taskloom_auth::{Claims, TokenIssuer};
use taskloom_edge::{build_app, EdgeServices, InMemoryStoreClient};
use taskloom_events::{EventLog, EventProducer, InMemoryEventLog, NullProducer, RedisStreamsEventLog};

const JWT_SECRET: &str = "test-secret";

// Fast hashing in tests; production uses the default cost.
const TEST_PASSWORD_COST: u32 = 4;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_producer(Arc::new(NullProducer)).await
    }

    async fn spawn_with_producer(producer: Arc<dyn EventProducer>) -> Self {
        // Same router as prod, in-memory store fake, ephemeral port.
        let services = Arc::new(
            EdgeServices::new(
                Arc::new(InMemoryStoreClient::new()),
                producer,
                TokenIssuer::new(JWT_SECRET.as_bytes()),
            )
            .with_password_cost(TEST_PASSWORD_COST),
        );

        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> (String, i64) {
    let res = client
        .post(format!("{}/register", base_url))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    (
        body["token"].as_str().unwrap().to_string(),
        body["user_id"].as_i64().unwrap(),
    )
}

async fn create_task(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    body: serde_json::Value,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/create", base_url))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn registration_issues_a_working_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/register", srv.base_url))
        .json(&json!({ "username": "alice", "password": "correcthorse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["user_id"], 1);
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.split('.').count(), 3);

    // The fresh principal sees an empty list, not an error.
    let res = client
        .get(format!("{}/get", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let tasks: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "alice", "correcthorse").await;

    let res = client
        .post(format!("{}/register", srv.base_url))
        .json(&json!({ "username": "alice", "password": "correcthorse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(res.text().await.unwrap().contains("Username already exists"));
}

#[tokio::test]
async fn weak_credentials_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/register", srv.base_url))
        .json(&json!({ "username": "bob", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("at least 8 characters"));

    let res = client
        .post(format!("{}/register", srv.base_url))
        .json(&json!({ "username": "ab", "password": "longenough" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("at least 3 characters"));

    let res = client
        .post(format!("{}/register", srv.base_url))
        .json(&json!({ "username": "", "password": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Over bcrypt's input limit: client-side validation failure, not a 500.
    let res = client
        .post(format!("{}/register", srv.base_url))
        .json(&json!({ "username": "carol", "password": "x".repeat(73) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("72 bytes"));
}

#[tokio::test]
async fn login_roundtrip_and_generic_failures() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "alice", "correcthorse").await;

    // Happy path issues a usable token.
    let res = client
        .post(format!("{}/login", srv.base_url))
        .json(&json!({ "username": "alice", "password": "correcthorse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let res = client
        .get(format!("{}/tasks", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Unknown user and wrong password are byte-identical to observers.
    let unknown_user = client
        .post(format!("{}/login", srv.base_url))
        .json(&json!({ "username": "mallory", "password": "correcthorse" }))
        .send()
        .await
        .unwrap();
    let wrong_password = client
        .post(format!("{}/login", srv.base_url))
        .json(&json!({ "username": "alice", "password": "wronghorse" }))
        .send()
        .await
        .unwrap();

    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = unknown_user.bytes().await.unwrap();
    let wrong_body = wrong_password.bytes().await.unwrap();
    assert_eq!(unknown_body, wrong_body);
}

#[tokio::test]
async fn cross_user_isolation_on_mutations_and_reads() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (alice_token, _) = register(&client, &srv.base_url, "alice", "correcthorse").await;
    let (bob_token, _) = register(&client, &srv.base_url, "bob", "correcthorse").await;

    let task = create_task(&client, &srv.base_url, &alice_token, json!({ "name": "t1" })).await;
    let id = task["id"].as_i64().unwrap();
    assert_eq!(id, 1);

    // Bob cannot delete Alice's task.
    let res = client
        .delete(format!("{}/delete/{}", srv.base_url, id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Nor complete it.
    let res = client
        .put(format!("{}/complete/{}", srv.base_url, id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Nor read it, by id or by name.
    let res = client
        .get(format!("{}/getbyid/{}", srv.base_url, id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/getbyname/t1", srv.base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The task is still visible to Alice.
    let tasks: Vec<serde_json::Value> = client
        .get(format!("{}/get", srv.base_url))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["name"], "t1");
}

#[tokio::test]
async fn mutations_emit_audit_events() {
    let log = Arc::new(InMemoryEventLog::new());
    let mut sub = log.subscribe();
    let srv = TestServer::spawn_with_producer(log).await;
    let client = reqwest::Client::new();

    let (token, user_id) = register(&client, &srv.base_url, "alice", "correcthorse").await;

    let task = create_task(&client, &srv.base_url, &token, json!({ "name": "buy milk" })).await;
    let res = client
        .put(format!("{}/complete/{}", srv.base_url, task["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Emission is fire-and-forget; wait for both events to land.
    let mut actions = Vec::new();
    for _ in 0..2 {
        let value = tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("audit event not emitted")
            .expect("event log closed");
        let event: serde_json::Value = serde_json::from_str(&value).unwrap();
        assert_eq!(event["user_id"].as_i64().unwrap(), user_id);
        assert_eq!(event["status"], "SUCCESS");
        actions.push(event["action"].as_str().unwrap().to_string());
    }
    actions.sort();
    assert_eq!(actions, vec!["COMPLETE_TASK", "CREATE_TASK"]);
}

#[tokio::test]
async fn failed_mutations_emit_error_events_without_changing_status() {
    let log = Arc::new(InMemoryEventLog::new());
    let mut sub = log.subscribe();
    let srv = TestServer::spawn_with_producer(log).await;
    let client = reqwest::Client::new();

    let (token, user_id) = register(&client, &srv.base_url, "alice", "correcthorse").await;

    let res = client
        .delete(format!("{}/delete/999", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let value = tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("audit event not emitted")
        .expect("event log closed");
    let event: serde_json::Value = serde_json::from_str(&value).unwrap();
    assert_eq!(event["action"], "DELETE_TASK");
    assert_eq!(event["status"], "ERROR");
    assert_eq!(event["user_id"].as_i64().unwrap(), user_id);
}

#[tokio::test]
async fn auth_gate_rejects_bad_credentials() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv.base_url, "alice", "correcthorse").await;

    // No header.
    let res = client
        .get(format!("{}/get", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res
        .text()
        .await
        .unwrap()
        .contains("Authorization header required"));

    // Wrong scheme.
    let res = client
        .get(format!("{}/get", srv.base_url))
        .header("Authorization", format!("Token {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Tampered token: any appended suffix breaks the signature.
    let res = client
        .get(format!("{}/get", srv.base_url))
        .bearer_auth(format!("{token}x"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res
        .text()
        .await
        .unwrap()
        .contains("Invalid or expired token"));
}

#[tokio::test]
async fn foreign_and_expired_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mint = |secret: &str, offset_secs: i64| {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            user_id: taskloom_core::UserId::new(1),
            username: "alice".to_string(),
            iat: now - 3600,
            exp: now + offset_secs,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    };

    // Signed with another process's secret.
    let res = client
        .get(format!("{}/get", srv.base_url))
        .bearer_auth(mint("another-secret", 3600))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Expired.
    let res = client
        .get(format!("{}/get", srv.base_url))
        .bearer_auth(mint(JWT_SECRET, -60))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn broker_outage_does_not_affect_mutations() {
    // Unreachable broker: emission fails, requests don't.
    let producer =
        RedisStreamsEventLog::new("redis://127.0.0.1:1", "task-events").expect("url parses");
    let srv = TestServer::spawn_with_producer(Arc::new(producer)).await;
    let client = reqwest::Client::new();

    let (token, _) = register(&client, &srv.base_url, "alice", "correcthorse").await;
    let task = create_task(&client, &srv.base_url, &token, json!({ "name": "t1" })).await;
    assert_eq!(task["name"], "t1");

    // The task really persisted.
    let tasks: Vec<serde_json::Value> = client
        .get(format!("{}/get", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
}

#[tokio::test]
async fn completion_filter_and_repeat_completion() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv.base_url, "alice", "correcthorse").await;

    let open = create_task(&client, &srv.base_url, &token, json!({ "name": "open" })).await;
    let done = create_task(&client, &srv.base_url, &token, json!({ "name": "done" })).await;

    let res = client
        .put(format!("{}/complete/{}", srv.base_url, done["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let completed: Vec<serde_json::Value> = client
        .get(format!("{}/get?complete=true", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["name"], "done");

    let uncompleted: Vec<serde_json::Value> = client
        .get(format!("{}/get?complete=false", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(uncompleted.len(), 1);
    assert_eq!(uncompleted[0]["id"], open["id"]);

    // Completion is single-shot.
    let res = client
        .put(format!("{}/complete/{}", srv.base_url, done["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn collections_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv.base_url, "alice", "correcthorse").await;

    // Defaults applied when color/icon are omitted.
    let res = client
        .post(format!("{}/collections", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "work" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let collection: serde_json::Value = res.json().await.unwrap();
    assert_eq!(collection["color"], "#2564cf");
    assert_eq!(collection["icon"], "📁");
    let collection_id = collection["id"].as_i64().unwrap();

    let task = create_task(
        &client,
        &srv.base_url,
        &token,
        json!({ "name": "t1", "collection_id": collection_id }),
    )
    .await;

    let members: Vec<serde_json::Value> = client
        .get(format!(
            "{}/collections/{}/tasks",
            srv.base_url, collection_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(members.len(), 1);

    // Deleting the collection unlinks, never deletes, its tasks.
    let res = client
        .delete(format!("{}/collections/{}", srv.base_url, collection_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let survivor: serde_json::Value = client
        .get(format!("{}/getbyid/{}", srv.base_url, task["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(survivor["collection_id"].is_null());
}

#[tokio::test]
async fn preflight_bypasses_auth_and_allows_any_origin() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .request(reqwest::Method::OPTIONS, format!("{}/create", srv.base_url))
        .header("Origin", "http://example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "authorization,content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn validation_failures_skip_store_and_events() {
    let log = Arc::new(InMemoryEventLog::new());
    let mut sub = log.subscribe();
    let srv = TestServer::spawn_with_producer(log).await;
    let client = reqwest::Client::new();

    let (token, _) = register(&client, &srv.base_url, "alice", "correcthorse").await;

    let res = client
        .post(format!("{}/create", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(format!("{}/delete/not-a-number", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Give any stray emission a moment, then confirm silence.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sub.try_recv().is_err());
}
