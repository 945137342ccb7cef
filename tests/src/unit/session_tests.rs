use mentora_core::api::auth::{Credentials, PasswordChange, ProfileUpdate, RegisterRequest};
use mentora_core::http::{ApiClient, Method, ScriptedTransport};
use mentora_core::session::{Role, SessionStore, TOKEN_KEY, USER_KEY};
use mentora_core::storage::{FileStore, KeyValueStore, MemoryStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

const BASE_URL: &str = "http://test/api/v1";

fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn scripted_client() -> (Arc<ScriptedTransport>, ApiClient) {
    let transport = Arc::new(ScriptedTransport::new());
    let client = ApiClient::with_transport(transport.clone(), BASE_URL);
    (transport, client)
}

fn script_login(transport: &ScriptedTransport) {
    transport.respond(
        Method::POST,
        "auth/login",
        json!({"token": "tok123", "user": {"id": 1, "role": "student", "username": "a"}}),
    );
}

#[test]
fn login_installs_and_persists_the_session() {
    let runtime = test_runtime();
    let (transport, client) = scripted_client();
    script_login(&transport);
    let storage = Arc::new(MemoryStore::new());
    let session = SessionStore::initialize(client, storage.clone());

    let outcome = runtime.block_on(session.login(&Credentials::new("a", "p")));

    assert!(outcome.success);
    assert!(session.is_authenticated());
    assert_eq!(session.token(), "tok123");
    assert_eq!(session.user().map(|user| user.role), Some(Role::Student));
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok123"));
    let persisted_user = storage.get(USER_KEY).expect("user persisted");
    assert!(persisted_user.contains("\"student\""));
}

#[test]
fn rejected_login_leaves_state_untouched() {
    let runtime = test_runtime();
    let (transport, client) = scripted_client();
    transport.fail(Method::POST, "auth/login", 401, "invalid credentials");
    let storage = Arc::new(MemoryStore::new());
    let session = SessionStore::initialize(client, storage.clone());

    let outcome = runtime.block_on(session.login(&Credentials::new("a", "wrong")));

    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("invalid credentials"));
    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);
    assert_eq!(storage.get(TOKEN_KEY), None);
}

#[test]
fn transport_failure_becomes_a_generic_outcome() {
    let runtime = test_runtime();
    // Nothing scripted: the transport answers 404 with a non-user message.
    let (_transport, client) = scripted_client();
    let session = SessionStore::initialize(client, Arc::new(MemoryStore::new()));

    let outcome = runtime.block_on(session.login(&Credentials::new("a", "p")));

    assert!(!outcome.success);
    assert!(outcome.message.is_some());
}

#[test]
fn session_round_trips_through_a_reload() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let storage = Arc::new(FileStore::open(dir.path().join("storage.json")));

    let (transport, client) = scripted_client();
    script_login(&transport);
    let session = SessionStore::initialize(client, storage.clone());
    let outcome = runtime.block_on(session.login(&Credentials::new("a", "p")));
    assert!(outcome.success);
    let token_before = session.token();
    let user_before = session.user();

    // A fresh store over the same backing file is the reload.
    let (_transport, client) = scripted_client();
    let reloaded = SessionStore::initialize(client, storage);

    assert_eq!(reloaded.token(), token_before);
    assert_eq!(reloaded.user(), user_before);
    assert!(reloaded.is_authenticated());
}

#[test]
fn logout_is_idempotent() {
    let runtime = test_runtime();
    let (transport, client) = scripted_client();
    script_login(&transport);
    let storage = Arc::new(MemoryStore::new());
    let session = SessionStore::initialize(client, storage.clone());
    runtime.block_on(session.login(&Credentials::new("a", "p")));

    session.logout();
    session.logout();

    assert!(!session.is_authenticated());
    assert_eq!(session.token(), "");
    assert_eq!(session.user(), None);
    assert_eq!(storage.get(TOKEN_KEY), None);
    assert_eq!(storage.get(USER_KEY), None);
}

#[test]
fn update_profile_merges_only_returned_fields() {
    let runtime = test_runtime();
    let (transport, client) = scripted_client();
    transport.respond(
        Method::POST,
        "auth/login",
        json!({
            "token": "tok123",
            "user": {"id": 1, "role": "student", "name": "old", "email": "a@b.c"}
        }),
    );
    transport.respond(Method::PUT, "user/profile", json!({"name": "X"}));
    let session = SessionStore::initialize(client, Arc::new(MemoryStore::new()));
    runtime.block_on(session.login(&Credentials::new("a", "p")));

    let outcome = runtime.block_on(session.update_profile(&ProfileUpdate {
        name: Some("X".to_string()),
        ..ProfileUpdate::default()
    }));

    assert!(outcome.success);
    let user = session.user().expect("user");
    assert_eq!(user.name.as_deref(), Some("X"));
    assert_eq!(user.email.as_deref(), Some("a@b.c"));
    assert_eq!(user.id, 1);
}

#[test]
fn failed_profile_update_changes_nothing() {
    let runtime = test_runtime();
    let (transport, client) = scripted_client();
    script_login(&transport);
    transport.fail(Method::PUT, "user/profile", 500, "update failed upstream");
    let session = SessionStore::initialize(client, Arc::new(MemoryStore::new()));
    runtime.block_on(session.login(&Credentials::new("a", "p")));
    let before = session.user();

    let outcome = runtime.block_on(session.update_profile(&ProfileUpdate::default()));

    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("update failed upstream"));
    assert_eq!(session.user(), before);
}

#[test]
fn change_password_never_touches_local_state() {
    let runtime = test_runtime();
    let (transport, client) = scripted_client();
    script_login(&transport);
    transport.respond_empty(Method::PUT, "user/password");
    let session = SessionStore::initialize(client, Arc::new(MemoryStore::new()));
    runtime.block_on(session.login(&Credentials::new("a", "p")));
    let token_before = session.token();

    let outcome = runtime.block_on(session.change_password(&PasswordChange {
        old_password: "p".to_string(),
        new_password: "q".to_string(),
    }));

    assert!(outcome.success);
    assert_eq!(session.token(), token_before);
}

#[test]
fn register_does_not_create_a_session() {
    let runtime = test_runtime();
    let (transport, client) = scripted_client();
    transport.respond_empty(Method::POST, "auth/register");
    let session = SessionStore::initialize(client, Arc::new(MemoryStore::new()));

    let outcome = runtime.block_on(session.register(&RegisterRequest {
        username: "a".to_string(),
        password: "p".to_string(),
        email: None,
        role: None,
    }));

    assert!(outcome.success);
    assert!(!session.is_authenticated());
}

#[test]
fn stored_token_without_a_valid_user_degrades_to_anonymous() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(TOKEN_KEY, "stale").expect("set");
    storage.set(USER_KEY, "{not json").expect("set");

    let (_transport, client) = scripted_client();
    let session = SessionStore::initialize(client, storage.clone());

    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);
    // The stale pair is gone from storage too.
    assert_eq!(storage.get(TOKEN_KEY), None);
    assert_eq!(storage.get(USER_KEY), None);
}
