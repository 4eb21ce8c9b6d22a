//! Remnawave client implementation.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::error::RemnawaveError;
use crate::models::{CreateUserRequest, Envelope, PanelUser, UpdateUserRequest};

/// Configuration for the Remnawave client.
#[derive(Debug, Clone)]
pub struct RemnawaveConfig {
    /// Panel origin (e.g., "https://panel.example.com")
    pub base_url: Url,

    /// API token issued in the panel settings
    pub api_key: String,

    /// Total request timeout (default: 30s). Ignored by `with_http_client`.
    pub timeout: Option<Duration>,
}

/// Client for the panel's user endpoints.
#[derive(Clone)]
pub struct RemnawaveClient {
    config: RemnawaveConfig,
    http_client: Client,
}

impl RemnawaveClient {
    /// Create a new client with its own HTTP connection pool.
    pub fn new(config: RemnawaveConfig) -> Result<Self, RemnawaveError> {
        let timeout = config.timeout.unwrap_or(Duration::from_secs(30));
        let http_client = Client::builder().timeout(timeout).build()?;
        Self::with_http_client(config, http_client)
    }

    /// Create a client that reuses an already configured `reqwest::Client`.
    pub fn with_http_client(
        config: RemnawaveConfig,
        http_client: Client,
    ) -> Result<Self, RemnawaveError> {
        if config.api_key.trim().is_empty() {
            return Err(RemnawaveError::Config("api_key is required".into()));
        }

        if config.base_url.cannot_be_a_base() {
            return Err(RemnawaveError::Config(format!(
                "base_url is not a valid origin: {}",
                config.base_url
            )));
        }

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Fetch a panel user by UUID. Returns `None` if the panel does not know it.
    pub async fn get_user_by_uuid(&self, uuid: Uuid) -> Result<Option<PanelUser>, RemnawaveError> {
        let response = self
            .request(Method::GET, &format!("users/{uuid}"))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        self.handle_response(response).await.map(Some)
    }

    /// Fetch all panel users bound to a Telegram id.
    pub async fn get_users_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> Result<Vec<PanelUser>, RemnawaveError> {
        let response = self
            .request(Method::GET, &format!("users/by-telegram-id/{telegram_id}"))
            .send()
            .await?;

        // Older panels answer 404 instead of an empty list.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        self.handle_response(response).await
    }

    /// Provision a new panel user.
    pub async fn create_user(&self, req: &CreateUserRequest) -> Result<PanelUser, RemnawaveError> {
        tracing::debug!(username = %req.username, "Creating panel user");

        let response = self.request(Method::POST, "users").json(req).send().await?;

        self.handle_response(response).await
    }

    /// Update an existing panel user. Fails with a 404 `Api` error if it is gone.
    pub async fn update_user(&self, req: &UpdateUserRequest) -> Result<PanelUser, RemnawaveError> {
        tracing::debug!(uuid = %req.uuid, "Updating panel user");

        let response = self.request(Method::PATCH, "users").json(req).send().await?;

        self.handle_response(response).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, self.endpoint(path))
            .bearer_auth(&self.config.api_key)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, RemnawaveError> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(RemnawaveError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.response)
    }
}

/// Pull `message` out of an error body, falling back to the raw text.
fn error_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { message: Some(msg) }) => msg,
        _ => String::from_utf8_lossy(body).into_owned(),
    }
}
