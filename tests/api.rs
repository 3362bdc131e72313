use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use minutes::auth::{self, TokenSigner};
use minutes::{api, db::Database};
use minutes_core::models::{CreateRecordingInput, CreateUserInput};

struct TestPortal {
    server: TestServer,
    db: Database,
    admin_id: i64,
    member_id: i64,
    _dir: tempfile::TempDir,
}

fn seed_user(db: &Database, first_name: &str, role: Option<&str>, email: &str, password: &str) -> i64 {
    db.create_user(CreateUserInput {
        first_name: first_name.into(),
        last_name: None,
        role: role.map(Into::into),
        email: Some(email.into()),
        password_hash: Some(auth::hash_password(password).unwrap()),
    })
    .unwrap()
    .id
}

fn setup() -> TestPortal {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("test.db")).unwrap();
    db.migrate().unwrap();

    let admin_id = seed_user(&db, "Ada", Some("admin"), "ada@example.com", "admin-pass");
    let member_id = seed_user(&db, "Bo", Some("member"), "bo@example.com", "member-pass");

    let signer = TokenSigner::new(b"test-secret", 24);
    let server = TestServer::new(api::create_router(db.clone(), signer)).unwrap();
    TestPortal {
        server,
        db,
        admin_id,
        member_id,
        _dir: dir,
    }
}

async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let res = server
        .post("/api/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn healthz_is_public() {
    let portal = setup();
    let res = portal.server.get("/healthz").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.text(), "ok");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let portal = setup();

    let res = portal
        .server
        .post("/api/login")
        .json(&json!({ "email": "ada@example.com", "password": "wrong" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = portal
        .server
        .post("/api/login")
        .json(&json!({ "email": "nobody@example.com", "password": "admin-pass" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = portal
        .server
        .post("/api/login")
        .json(&json!({ "email": "", "password": "" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_without_credentials_cannot_log_in() {
    let portal = setup();
    portal
        .db
        .create_user(CreateUserInput {
            first_name: "Guest".into(),
            last_name: None,
            role: None,
            email: Some("guest@example.com".into()),
            password_hash: None,
        })
        .unwrap();

    let res = portal
        .server
        .post("/api/login")
        .json(&json!({ "email": "guest@example.com", "password": "anything" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_requires_a_valid_bearer_token() {
    let portal = setup();

    let res = portal.server.get("/api/todos?user_id=1").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = portal
        .server
        .get("/api/todos?user_id=1")
        .authorization_bearer("garbage")
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let expired = TokenSigner::new(b"test-secret", -1).issue(portal.member_id).unwrap();
    let res = portal
        .server
        .get("/api/todos?user_id=1")
        .authorization_bearer(expired)
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_todos_requires_an_owner_filter() {
    let portal = setup();
    let token = login(&portal.server, "bo@example.com", "member-pass").await;

    let res = portal
        .server
        .get("/api/todos")
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "user_id is required");
}

#[tokio::test]
async fn create_rejects_legacy_status_tokens() {
    let portal = setup();
    let token = login(&portal.server, "bo@example.com", "member-pass").await;

    for status in ["pending", "in_progress", "completed", ""] {
        let res = portal
            .server
            .post("/api/todos")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Test todo",
                "status": status,
                "user_id": portal.member_id,
            }))
            .await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST, "status {status:?}");
    }

    let res = portal
        .server
        .get(&format!("/api/todos?user_id={}", portal.member_id))
        .authorization_bearer(&token)
        .await;
    let body: Value = res.json();
    assert_eq!(body["todos"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn todo_lifecycle_with_audit_trail() {
    let portal = setup();
    let member_token = login(&portal.server, "bo@example.com", "member-pass").await;

    // Create: absent recording references must stay absent, never 0.
    let res = portal
        .server
        .post("/api/todos")
        .authorization_bearer(&member_token)
        .json(&json!({
            "name": "Test todo",
            "desc": "Test desc",
            "status": "not_started",
            "user_id": portal.member_id,
            "created_at_recording_id": 0,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    let todo_id = body["todo"]["id"].as_i64().unwrap();
    assert_eq!(body["todo"]["status"], "not_started");
    assert_eq!(body["todo"]["desc"], "Test desc");
    assert!(body["todo"].get("created_at_recording_id").is_none());

    // Update to done.
    let res = portal
        .server
        .put(&format!("/api/todos/{todo_id}"))
        .authorization_bearer(&member_token)
        .json(&json!({
            "name": "Test todo",
            "desc": "Test desc",
            "status": "done",
            "user_id": portal.member_id,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["todo"]["status"], "done");

    // Two ledger entries, newest first.
    let res = portal
        .server
        .get(&format!("/api/todos/{todo_id}/history"))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["change_kind"], "update");
    assert_eq!(history[0]["status"], "done");
    assert_eq!(history[0]["actor_user_id"].as_i64(), Some(portal.member_id));
    assert_eq!(history[1]["change_kind"], "create");
    assert_eq!(history[1]["status"], "not_started");

    // Members cannot delete; nothing changes.
    let res = portal
        .server
        .delete(&format!("/api/todos/{todo_id}"))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    assert!(portal.db.get_todo(todo_id).unwrap().is_some());
    assert_eq!(portal.db.list_todo_history(todo_id).unwrap().len(), 2);

    // Admins can; the ledger goes with the row.
    let admin_token = login(&portal.server, "ada@example.com", "admin-pass").await;
    let res = portal
        .server
        .delete(&format!("/api/todos/{todo_id}"))
        .authorization_bearer(&admin_token)
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = portal
        .server
        .get(&format!("/api/todos/{todo_id}"))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = portal
        .server
        .get(&format!("/api/todos/{todo_id}/history"))
        .authorization_bearer(&member_token)
        .await;
    let body: Value = res.json();
    assert_eq!(body["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn todos_can_be_listed_by_originating_recording() {
    let portal = setup();
    let recording = portal
        .db
        .create_recording(CreateRecordingInput {
            name: "Planning call".into(),
            audio_url: None,
            transcript: Some("Transcript".into()),
            summary: Some("Summary".into()),
            duration: Some(120),
            notes: None,
        })
        .unwrap();

    let token = login(&portal.server, "bo@example.com", "member-pass").await;
    let res = portal
        .server
        .post("/api/todos")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Follow up",
            "status": "partial",
            "user_id": portal.member_id,
            "created_at_recording_id": recording.id,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let res = portal
        .server
        .get(&format!("/api/todos?recording_id={}", recording.id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let todos = body["todos"].as_array().unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["created_at_recording_id"].as_i64(), Some(recording.id));
    assert_eq!(todos[0]["created_at_recording_name"], "Planning call");
}

#[tokio::test]
async fn recordings_report_audio_availability() {
    let portal = setup();
    let silent = portal
        .db
        .create_recording(CreateRecordingInput {
            name: "Test recording".into(),
            audio_url: None,
            transcript: Some("Transcript".into()),
            summary: Some("Summary".into()),
            duration: Some(120),
            notes: None,
        })
        .unwrap();

    let token = login(&portal.server, "bo@example.com", "member-pass").await;
    let res = portal
        .server
        .get("/api/recordings")
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let recordings = body["recordings"].as_array().unwrap();
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0]["has_audio"], false);

    let res = portal
        .server
        .get(&format!("/api/recordings/{}", silent.id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["recording"]["name"], "Test recording");

    let res = portal
        .server
        .get("/api/recordings/4242")
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_recordings_is_admin_only() {
    let portal = setup();
    let recording = portal
        .db
        .create_recording(CreateRecordingInput {
            name: "Doomed".into(),
            audio_url: None,
            transcript: None,
            summary: None,
            duration: None,
            notes: None,
        })
        .unwrap();

    let member_token = login(&portal.server, "bo@example.com", "member-pass").await;
    let res = portal
        .server
        .delete(&format!("/api/recordings/{}", recording.id))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let admin_token = login(&portal.server, "ada@example.com", "admin-pass").await;
    let res = portal
        .server
        .delete(&format!("/api/recordings/{}", recording.id))
        .authorization_bearer(&admin_token)
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    assert!(portal.db.get_recording(recording.id).unwrap().is_none());
}

#[tokio::test]
async fn user_listing_exposes_names_and_roles_only() {
    let portal = setup();
    let token = login(&portal.server, "bo@example.com", "member-pass").await;

    let res = portal
        .server
        .get("/api/users")
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["id"].as_i64(), Some(portal.admin_id));
    assert_eq!(users[0]["role"], "admin");
    assert!(users[0].get("email").is_none());
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn explicit_actor_is_recorded_in_the_ledger() {
    let portal = setup();
    let admin_token = login(&portal.server, "ada@example.com", "admin-pass").await;

    let res = portal
        .server
        .post("/api/todos")
        .authorization_bearer(&admin_token)
        .json(&json!({
            "name": "Delegated todo",
            "status": "not_started",
            "user_id": portal.member_id,
            "actor_user_id": portal.admin_id,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    let todo_id = body["todo"]["id"].as_i64().unwrap();

    let res = portal
        .server
        .get(&format!("/api/todos/{todo_id}/history"))
        .authorization_bearer(&admin_token)
        .await;
    let body: Value = res.json();
    let history = body["history"].as_array().unwrap();
    assert_eq!(history[0]["actor_user_id"].as_i64(), Some(portal.admin_id));
    assert_eq!(history[0]["user_id"].as_i64(), Some(portal.member_id));
}
