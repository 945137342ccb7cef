use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::stream::ChatStream;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A tutoring conversation. Listing endpoints omit `messages`; the detail
/// endpoint includes them.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSession {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LearningAdvice {
    pub content: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

pub async fn list_sessions(api: &ApiClient) -> ApiResult<Vec<ChatSession>> {
    api.get("/chat/sessions").await
}

pub async fn create_session(api: &ApiClient, session: &NewSession) -> ApiResult<ChatSession> {
    api.post("/chat/sessions", session).await
}

pub async fn get_session(api: &ApiClient, id: i64) -> ApiResult<ChatSession> {
    api.get(&format!("/chat/sessions/{id}")).await
}

pub async fn delete_session(api: &ApiClient, id: i64) -> ApiResult<()> {
    api.delete(&format!("/chat/sessions/{id}")).await
}

/// Send a message into a session and get the assistant reply in one shot.
/// For incremental delivery use [`stream_reply`] instead.
pub async fn send_message(
    api: &ApiClient,
    session_id: i64,
    content: impl Into<String>,
) -> ApiResult<ChatMessage> {
    let body = OutgoingMessage {
        content: content.into(),
    };
    api.post(&format!("/chat/sessions/{session_id}/messages"), &body)
        .await
}

pub async fn learning_advice(api: &ApiClient) -> ApiResult<LearningAdvice> {
    api.get("/chat/advice").await
}

/// Open a server-push stream for one reply. Each call is an independent
/// connection; the current token rides along in the query string.
pub fn stream_reply(api: &ApiClient, message: &str) -> ApiResult<ChatStream> {
    ChatStream::open(api.base_url(), message, api.token().as_deref())
}
