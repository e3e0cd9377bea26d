//! Authenticated HTTP calls against the client service.

use crate::credential::Credential;
use crate::error::ServiceError;
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Fixed Basic-Auth user the client service expects.
pub const AUTH_USER: &str = "riot";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// Body that was not valid JSON, kept verbatim.
    Text(String),
    Empty,
}

impl Payload {
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return Payload::Empty;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(body.to_string()),
        }
    }

    /// Deserialize a JSON object payload. Empty, `null` and non-object bodies
    /// read as absent.
    pub fn decode<T: DeserializeOwned>(self, path: &str) -> Result<Option<T>, ServiceError> {
        match self {
            Payload::Json(value) if value.is_object() => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ServiceError::Decode {
                    path: path.to_string(),
                    reason: e.to_string(),
                }),
            _ => Ok(None),
        }
    }
}

#[async_trait]
pub trait ServiceClient: Send + Sync {
    async fn call(
        &self,
        credential: &Credential,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Payload, ServiceError>;
}

/// reqwest-backed client for the loopback service.
///
/// Certificate validation is disabled because the service presents a
/// self-signed certificate; requests only ever target `127.0.0.1`.
#[derive(Clone)]
pub struct HttpServiceClient {
    client: reqwest::Client,
}

impl HttpServiceClient {
    pub fn new() -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::Init(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    async fn call(
        &self,
        credential: &Credential,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Payload, ServiceError> {
        let url = format!("{}{}", credential.base_url(), path);
        debug!("Client service request {} {}", method, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth(AUTH_USER, Some(credential.token()));
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        debug!("Client service response {} {} -> {}", method, path, status);

        if status.as_u16() >= 400 {
            let body = match Payload::from_body(&text) {
                Payload::Json(value) => value,
                Payload::Text(raw) => Value::String(raw),
                Payload::Empty => Value::Null,
            };
            return Err(ServiceError::Status {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(Payload::from_body(&text))
    }
}
