use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use parking_lot::RwLock;
pub use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Response envelope every platform endpoint wraps its payload in.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// One file part for multipart uploads.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A fully described request, ready for a transport to execute.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub file: Option<FilePart>,
    pub token: Option<String>,
}

impl ApiRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.trim_start_matches('/').to_string(),
            query: Vec::new(),
            body: None,
            file: None,
            token: None,
        }
    }
}

/// Request execution seam. The production implementation speaks HTTP via
/// reqwest; tests and smoke runs inject [`ScriptedTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> ApiResult<Envelope>;
}

/// reqwest-backed transport with bearer-token injection.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> ApiResult<Envelope> {
        let url = format!("{}/{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(file) = request.file {
            let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
            builder = builder.multipart(reqwest::multipart::Form::new().part(file.field, part));
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            // Prefer the envelope message; fall back to the raw body.
            let message = serde_json::from_str::<Envelope>(&text)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or(text);
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Typed client over a transport: per-request token injection plus the verb
/// helpers the API modules are written against.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Arc<RwLock<Option<String>>>,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), &config.base_url))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self {
            transport,
            token: Arc::new(RwLock::new(None)),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    async fn send(&self, mut request: ApiRequest) -> ApiResult<Envelope> {
        request.token = self.token();
        self.transport.execute(request).await
    }

    async fn expect_data<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let envelope = self.send(request).await?;
        let data = envelope.data.ok_or(ApiError::MissingData)?;
        Ok(serde_json::from_value(data)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.expect_data(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> ApiResult<T> {
        let mut request = ApiRequest::new(Method::GET, path);
        request.query = query;
        self.expect_data(request).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let mut request = ApiRequest::new(Method::POST, path);
        request.body = Some(serde_json::to_value(body)?);
        self.expect_data(request).await
    }

    /// POST where the caller wants the envelope message, not the payload
    /// (registration-style endpoints).
    pub async fn post_for_message<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<Option<String>> {
        let mut request = ApiRequest::new(Method::POST, path);
        request.body = Some(serde_json::to_value(body)?);
        Ok(self.send(request).await?.message)
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.expect_data(ApiRequest::new(Method::POST, path)).await
    }

    pub async fn post_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> ApiResult<T> {
        let mut request = ApiRequest::new(Method::POST, path);
        request.query = query;
        self.expect_data(request).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let mut request = ApiRequest::new(Method::PUT, path);
        request.body = Some(serde_json::to_value(body)?);
        self.expect_data(request).await
    }

    /// PUT whose response payload the caller does not need.
    pub async fn put_unit<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let mut request = ApiRequest::new(Method::PUT, path);
        request.body = Some(serde_json::to_value(body)?);
        self.send(request).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(ApiRequest::new(Method::DELETE, path))
            .await
            .map(|_| ())
    }

    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<T> {
        let mut request = ApiRequest::new(Method::POST, path);
        request.file = Some(FilePart {
            field: "file".to_string(),
            file_name: file_name.to_string(),
            bytes,
        });
        self.expect_data(request).await
    }
}

/// In-process transport answering from a scripted route table. Used by the
/// integration tests and the xtask smoke run; unmatched requests get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: RwLock<HashMap<(String, String), ScriptedResponse>>,
    requests: RwLock<Vec<ApiRequest>>,
}

#[derive(Clone)]
enum ScriptedResponse {
    Success { message: Option<String>, data: Option<Value> },
    Failure { status: u16, message: String },
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, data: Value) {
        self.routes.write().insert(
            route_key(&method, path),
            ScriptedResponse::Success {
                message: None,
                data: Some(data),
            },
        );
    }

    pub fn respond_empty(&self, method: Method, path: &str) {
        self.routes.write().insert(
            route_key(&method, path),
            ScriptedResponse::Success {
                message: None,
                data: None,
            },
        );
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) {
        self.routes.write().insert(
            route_key(&method, path),
            ScriptedResponse::Failure {
                status,
                message: message.to_string(),
            },
        );
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.read().clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.read().last().cloned()
    }
}

fn route_key(method: &Method, path: &str) -> (String, String) {
    (
        method.as_str().to_string(),
        path.trim_start_matches('/').to_string(),
    )
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> ApiResult<Envelope> {
        let key = route_key(&request.method, &request.path);
        let scripted = self.routes.read().get(&key).cloned();
        self.requests.write().push(request);
        match scripted {
            Some(ScriptedResponse::Success { message, data }) => Ok(Envelope {
                code: 0,
                message,
                data,
            }),
            Some(ScriptedResponse::Failure { status, message }) => {
                Err(ApiError::Server { status, message })
            }
            None => Err(ApiError::Server {
                status: 404,
                message: "not found".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn injects_token_into_requests() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::GET, "user/profile", json!({"id": 1}));
        let client = ApiClient::with_transport(transport.clone(), "http://test/api/v1");
        client.set_token("tok123");

        let _: Value = client.get("/user/profile").await.expect("profile");

        let recorded = transport.last_request().expect("request recorded");
        assert_eq!(recorded.token.as_deref(), Some("tok123"));
        assert_eq!(recorded.path, "user/profile");
    }

    #[tokio::test]
    async fn surfaces_server_message_on_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail(Method::POST, "auth/login", 401, "invalid credentials");
        let client = ApiClient::with_transport(transport, "http://test/api/v1");

        let result: ApiResult<Value> = client.post("/auth/login", &json!({})).await;
        match result {
            Err(ApiError::Server { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid credentials");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_data_is_an_error_for_typed_reads() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_empty(Method::GET, "chat/advice");
        let client = ApiClient::with_transport(transport, "http://test/api/v1");

        let result: ApiResult<Value> = client.get("/chat/advice").await;
        assert!(matches!(result, Err(ApiError::MissingData)));
    }
}
