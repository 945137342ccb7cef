use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::session::{Role, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// What a successful login hands back: the credential and the signed-in
/// user, installed together by the session store.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

pub async fn login(api: &ApiClient, credentials: &Credentials) -> ApiResult<LoginPayload> {
    api.post("/auth/login", credentials).await
}

pub async fn register(api: &ApiClient, request: &RegisterRequest) -> ApiResult<Option<String>> {
    api.post_for_message("/auth/register", request).await
}

pub async fn get_profile(api: &ApiClient) -> ApiResult<UserProfile> {
    api.get("/user/profile").await
}

/// Returns the updated fields as sent by the server; the session store owns
/// merging them into the current user.
pub async fn update_profile(api: &ApiClient, update: &ProfileUpdate) -> ApiResult<Value> {
    api.put("/user/profile", update).await
}

pub async fn change_password(api: &ApiClient, change: &PasswordChange) -> ApiResult<()> {
    api.put_unit("/user/password", change).await
}
