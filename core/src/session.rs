use crate::api::auth;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::storage::KeyValueStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Platform roles. The guard only ever distinguishes these three.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

/// The signed-in user. Unknown server fields are kept in `extra` so a
/// partial profile update cannot silently drop them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Uniform result of every mutating session operation. Callers branch on
/// this; they never see a raised transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// What the navigation guard reads: authentication status plus role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub role: Option<Role>,
}

impl SessionSnapshot {
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            role: None,
        }
    }

    pub fn authenticated(role: Role) -> Self {
        Self {
            is_authenticated: true,
            role: Some(role),
        }
    }
}

#[derive(Default)]
struct SessionState {
    token: String,
    user: Option<UserProfile>,
}

/// The single owner of authentication state. Token and user move together:
/// installed as a pair by `login`, cleared as a pair by `logout`, and the
/// durable copy is rewritten after every change.
#[derive(Clone)]
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    inner: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    /// Read-through initialization. A stored token whose user record is
    /// absent or undecodable degrades the whole pair to the empty session;
    /// startup never fails on bad persisted state.
    pub fn initialize(api: ApiClient, storage: Arc<dyn KeyValueStore>) -> Self {
        let token = storage.get(TOKEN_KEY).unwrap_or_default();
        let user = storage
            .get(USER_KEY)
            .and_then(|raw| match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!(%err, "discarding malformed persisted user record");
                    None
                }
            });

        let state = match (token.is_empty(), user) {
            (false, Some(user)) => SessionState { token, user: Some(user) },
            (true, None) => SessionState::default(),
            _ => {
                // Half a session is worse than none.
                storage.remove(TOKEN_KEY).ok();
                storage.remove(USER_KEY).ok();
                SessionState::default()
            }
        };

        if !state.token.is_empty() {
            api.set_token(&state.token);
        }

        Self {
            api,
            storage,
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn is_authenticated(&self) -> bool {
        !self.inner.read().token.is_empty()
    }

    pub fn token(&self) -> String {
        self.inner.read().token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner.read().user.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read();
        SessionSnapshot {
            is_authenticated: !inner.token.is_empty(),
            role: inner.user.as_ref().map(|user| user.role),
        }
    }

    /// Authenticate and install the session. Single attempt; prior state is
    /// untouched on failure.
    pub async fn login(&self, credentials: &auth::Credentials) -> ActionOutcome {
        let payload = match auth::login(&self.api, credentials).await {
            Ok(payload) => payload,
            Err(err) => return failure(&err, "login failed"),
        };

        self.api.set_token(&payload.token);
        {
            let mut inner = self.inner.write();
            inner.token = payload.token.clone();
            inner.user = Some(payload.user.clone());
        }
        self.persist(&payload.token, &payload.user);
        ActionOutcome::ok()
    }

    /// Create an account. Never touches the session: the user still logs in.
    pub async fn register(&self, request: &auth::RegisterRequest) -> ActionOutcome {
        match auth::register(&self.api, request).await {
            Ok(message) => match message {
                Some(message) => ActionOutcome::ok_with(message),
                None => ActionOutcome::ok(),
            },
            Err(err) => failure(&err, "registration failed"),
        }
    }

    /// Clear the session locally. No remote call; always succeeds, and a
    /// second call is a no-op.
    pub fn logout(&self) {
        self.api.clear_token();
        {
            let mut inner = self.inner.write();
            inner.token.clear();
            inner.user = None;
        }
        if let Err(err) = self.storage.remove(TOKEN_KEY) {
            tracing::warn!(%err, "failed to remove persisted token");
        }
        if let Err(err) = self.storage.remove(USER_KEY) {
            tracing::warn!(%err, "failed to remove persisted user");
        }
    }

    /// Push a partial profile update and shallow-merge the returned fields
    /// over the current user. Fields the server does not echo back are kept.
    pub async fn update_profile(&self, update: &auth::ProfileUpdate) -> ActionOutcome {
        let patch = match auth::update_profile(&self.api, update).await {
            Ok(patch) => patch,
            Err(err) => return failure(&err, "profile update failed"),
        };

        let mut inner = self.inner.write();
        let current = inner
            .user
            .as_ref()
            .map(|user| serde_json::to_value(user).unwrap_or_else(|_| Value::Object(Default::default())))
            .unwrap_or_else(|| Value::Object(Default::default()));
        let merged_value = merge_objects(current, patch);
        let merged: UserProfile = match serde_json::from_value(merged_value) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(%err, "profile update response did not merge into a valid user");
                return ActionOutcome::fail("profile update failed");
            }
        };
        inner.user = Some(merged.clone());
        let token = inner.token.clone();
        drop(inner);

        self.persist(&token, &merged);
        ActionOutcome::ok()
    }

    /// Change the password server-side. Local state never changes.
    pub async fn change_password(&self, change: &auth::PasswordChange) -> ActionOutcome {
        match auth::change_password(&self.api, change).await {
            Ok(()) => ActionOutcome::ok(),
            Err(err) => failure(&err, "password change failed"),
        }
    }

    fn persist(&self, token: &str, user: &UserProfile) {
        if let Err(err) = self.storage.set(TOKEN_KEY, token) {
            tracing::warn!(%err, "failed to persist session token");
        }
        match serde_json::to_string(user) {
            Ok(serialized) => {
                if let Err(err) = self.storage.set(USER_KEY, &serialized) {
                    tracing::warn!(%err, "failed to persist user record");
                }
            }
            Err(err) => tracing::warn!(%err, "failed to serialize user record"),
        }
    }
}

fn failure(err: &ApiError, fallback: &str) -> ActionOutcome {
    match err.user_message() {
        Some(message) => ActionOutcome::fail(message),
        None => ActionOutcome::fail(fallback),
    }
}

fn merge_objects(base: Value, patch: Value) -> Value {
    let Value::Object(mut base) = base else {
        return patch;
    };
    let Value::Object(patch) = patch else {
        return Value::Object(base);
    };
    for (key, value) in patch {
        base.insert(key, value);
    }
    Value::Object(base)
}
