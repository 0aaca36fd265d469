use async_trait::async_trait;
use dockyard_core::{ProxyConfig, Removal};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::api::{DataPlaneApi, ServerEntry};
use crate::error::ProxyError;

/// HAProxy Data Plane API client.
pub struct HaproxyClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: SecretString,
}

impl std::fmt::Debug for HaproxyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HaproxyClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RawConfiguration {
    #[serde(rename = "_version")]
    version: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Transaction {
    id: Option<String>,
}

impl HaproxyClient {
    /// Client authenticated with the configured password.
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let password = config.password()?;
        Self::with_credentials(config, password)
    }

    pub fn with_credentials(config: &ProxyConfig, password: SecretString) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProxyError::Client { source: e })?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/{}",
                config.url.trim_end_matches('/'),
                config.api_prefix.trim_matches('/')
            ),
            username: config.username.clone(),
            password,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{path}", self.base_url))
            .basic_auth(&self.username, Some(self.password.expose_secret()))
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ProxyError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProxyError::Http {
                operation,
                source: e,
            })?;
        tracing::debug!(operation, status = %response.status(), "data plane response");
        Ok(response)
    }

    async fn expect_success(
        operation: &'static str,
        response: Response,
    ) -> Result<Response, ProxyError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ProxyError::Status {
            operation,
            status,
            body,
        })
    }
}

#[async_trait]
impl DataPlaneApi for HaproxyClient {
    async fn configuration_version(&self) -> Result<u64, ProxyError> {
        const OP: &str = "read configuration version";
        let response = self
            .send(OP, self.request(Method::GET, "configuration/raw"))
            .await?;
        let raw: RawConfiguration = Self::expect_success(OP, response)
            .await?
            .json()
            .await
            .map_err(|e| ProxyError::Http {
                operation: OP,
                source: e,
            })?;
        Ok(raw.version.unwrap_or(1))
    }

    async fn begin_transaction(&self, version: u64) -> Result<String, ProxyError> {
        const OP: &str = "open transaction";
        let response = self
            .send(
                OP,
                self.request(Method::POST, "transactions")
                    .query(&[("version", version)]),
            )
            .await?;
        let transaction: Transaction = Self::expect_success(OP, response)
            .await?
            .json()
            .await
            .map_err(|e| ProxyError::Http {
                operation: OP,
                source: e,
            })?;
        transaction
            .id
            .filter(|id| !id.is_empty())
            .ok_or(ProxyError::MissingTransactionId)
    }

    async fn backend_exists(&self, name: &str) -> Result<bool, ProxyError> {
        const OP: &str = "read backend";
        let response = self
            .send(
                OP,
                self.request(Method::GET, &format!("configuration/backends/{name}")),
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::expect_success(OP, response).await?;
        Ok(true)
    }

    async fn delete_backend(
        &self,
        transaction_id: &str,
        name: &str,
    ) -> Result<Removal, ProxyError> {
        const OP: &str = "delete backend";
        let response = self
            .send(
                OP,
                self.request(Method::DELETE, &format!("configuration/backends/{name}"))
                    .query(&[("transaction_id", transaction_id)]),
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Removal::NotFound);
        }
        Self::expect_success(OP, response).await?;
        Ok(Removal::Removed)
    }

    async fn create_backend(&self, transaction_id: &str, name: &str) -> Result<(), ProxyError> {
        const OP: &str = "create backend";
        let response = self
            .send(
                OP,
                self.request(Method::POST, "configuration/backends")
                    .query(&[("transaction_id", transaction_id)])
                    .json(&json!({
                        "forwardfor": { "enabled": "enabled" },
                        "name": name,
                    })),
            )
            .await?;
        Self::expect_success(OP, response).await?;
        Ok(())
    }

    async fn create_server(
        &self,
        transaction_id: &str,
        backend: &str,
        server: &ServerEntry,
    ) -> Result<(), ProxyError> {
        const OP: &str = "create server";
        let response = self
            .send(
                OP,
                self.request(Method::POST, "configuration/servers")
                    .query(&[("transaction_id", transaction_id), ("backend", backend)])
                    .json(&json!({
                        "address": server.address,
                        "check": "enabled",
                        "name": server.name,
                        "port": server.port,
                    })),
            )
            .await?;
        Self::expect_success(OP, response).await?;
        Ok(())
    }

    async fn commit_transaction(&self, transaction_id: &str) -> Result<(), ProxyError> {
        const OP: &str = "commit transaction";
        let response = self
            .send(
                OP,
                self.request(Method::PUT, &format!("transactions/{transaction_id}")),
            )
            .await?;
        Self::expect_success(OP, response).await?;
        Ok(())
    }

    async fn abort_transaction(&self, transaction_id: &str) -> Result<(), ProxyError> {
        const OP: &str = "abort transaction";
        let response = self
            .send(
                OP,
                self.request(Method::DELETE, &format!("transactions/{transaction_id}")),
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::expect_success(OP, response).await?;
        Ok(())
    }
}
