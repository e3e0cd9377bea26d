//! Credential discovery and request client bundled for the automations.

use crate::credential::{Credential, CredentialProvider};
use crate::error::ServiceError;
use crate::service::{Payload, ServiceClient};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Shared handle to the client service.
///
/// Any 401 seen through this handle invalidates the cached credential so the
/// next caller rediscovers the rotated token.
#[derive(Clone)]
pub struct ClientConnection {
    credentials: Arc<CredentialProvider>,
    client: Arc<dyn ServiceClient>,
}

impl ClientConnection {
    pub fn new(credentials: Arc<CredentialProvider>, client: Arc<dyn ServiceClient>) -> Self {
        Self {
            credentials,
            client,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialProvider> {
        &self.credentials
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.credentials.acquire().await
    }

    pub async fn request(
        &self,
        credential: &Credential,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Payload, ServiceError> {
        let result = self.client.call(credential, method, path, body).await;
        if let Err(err) = &result {
            if err.is_unauthorized() {
                warn!("Client service rejected credential on {}, rediscovering", path);
                self.credentials.invalidate();
            }
        }
        result
    }

    /// GET and decode; `Ok(None)` when the body is empty or not an object.
    pub async fn get<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<Option<T>, ServiceError> {
        self.request(credential, Method::GET, path, None)
            .await?
            .decode(path)
    }

    pub async fn post(&self, credential: &Credential, path: &str) -> Result<Payload, ServiceError> {
        self.request(credential, Method::POST, path, None).await
    }

    pub async fn patch(
        &self,
        credential: &Credential,
        path: &str,
        body: Value,
    ) -> Result<Payload, ServiceError> {
        self.request(credential, Method::PATCH, path, Some(body))
            .await
    }
}
