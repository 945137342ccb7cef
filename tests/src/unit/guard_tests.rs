use mentora_core::api::auth::Credentials;
use mentora_core::http::{ApiClient, Method, ScriptedTransport};
use mentora_core::router::{decide, NavigationDecision};
use mentora_core::session::SessionStore;
use mentora_core::storage::MemoryStore;
use serde_json::json;
use std::sync::Arc;

fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn signed_in_session(role: &str) -> SessionStore {
    let runtime = test_runtime();
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond(
        Method::POST,
        "auth/login",
        json!({"token": "tok123", "user": {"id": 1, "role": role}}),
    );
    let client = ApiClient::with_transport(transport, "http://test/api/v1");
    let session = SessionStore::initialize(client, Arc::new(MemoryStore::new()));
    let outcome = runtime.block_on(session.login(&Credentials::new("a", "p")));
    assert!(outcome.success);
    session
}

#[test]
fn anonymous_user_is_sent_to_login_from_protected_routes() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = ApiClient::with_transport(transport, "http://test/api/v1");
    let session = SessionStore::initialize(client, Arc::new(MemoryStore::new()));

    for path in ["/dashboard", "/dashboard/chat/3", "/teacher/analytics"] {
        assert_eq!(
            decide(path, &session.snapshot()),
            NavigationDecision::Redirect("/login".to_string()),
            "path {path}"
        );
    }
}

#[test]
fn student_reaching_for_admin_lands_on_dashboard() {
    let session = signed_in_session("student");
    assert_eq!(
        decide("/dashboard/admin", &session.snapshot()),
        NavigationDecision::Redirect("/dashboard".to_string())
    );
}

#[test]
fn signed_in_teacher_visiting_login_goes_home() {
    let session = signed_in_session("teacher");
    assert_eq!(
        decide("/login", &session.snapshot()),
        NavigationDecision::Redirect("/teacher/dashboard".to_string())
    );
}

#[test]
fn signed_in_student_visiting_login_goes_to_dashboard() {
    let session = signed_in_session("student");
    assert_eq!(
        decide("/login", &session.snapshot()),
        NavigationDecision::Redirect("/dashboard".to_string())
    );
}

#[test]
fn admin_passes_the_admin_gate() {
    let session = signed_in_session("admin");
    assert_eq!(
        decide("/dashboard/admin", &session.snapshot()),
        NavigationDecision::Allow
    );
}

#[test]
fn teacher_routes_allow_teachers() {
    let session = signed_in_session("teacher");
    assert_eq!(
        decide("/teacher/lesson-plan", &session.snapshot()),
        NavigationDecision::Allow
    );
}

#[test]
fn logout_downgrades_the_guard_decision() {
    let session = signed_in_session("student");
    assert_eq!(
        decide("/dashboard/profile", &session.snapshot()),
        NavigationDecision::Allow
    );

    session.logout();

    assert_eq!(
        decide("/dashboard/profile", &session.snapshot()),
        NavigationDecision::Redirect("/login".to_string())
    );
}
