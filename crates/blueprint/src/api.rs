use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::json;
use uuid::Uuid;

use crate::errors::{ClientError, ClientResult};
use crate::models::chat::Chat;

pub const DEFAULT_HOST: &str = "http://localhost:8000";

/// Connection settings for the assistant backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout: Duration::from_secs(600), // 10 minutes timeout
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("BLUEPRINT_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Self {
            host,
            ..Self::default()
        }
    }
}

/// HTTP client for the assistant backend: one streamed generation endpoint
/// plus the token-gated chat persistence API.
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    /// Kick off one generation. The caller drives the chunked body; a non-OK
    /// status is a transport failure before any frame arrives.
    pub async fn generate_stream(&self, product_idea: &str) -> ClientResult<reqwest::Response> {
        let response = self
            .client
            .post(self.url("/api/generate-architecture-stream/"))
            .json(&json!({ "product_idea": product_idea }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response),
            status => Err(ClientError::Status(status)),
        }
    }

    /// Fetch every persisted chat, newest metadata included. Absent
    /// timestamps and message lists deserialize to defaults.
    pub async fn fetch_chats(&self, token: &str) -> ClientResult<Vec<Chat>> {
        let response = self
            .client
            .get(self.url("/chats"))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ClientError::Auth(format!("chat load rejected: {}", response.status())))
            }
            status => Err(ClientError::Status(status)),
        }
    }

    /// Idempotent upsert of one chat's full message log.
    pub async fn save_chat(&self, token: &str, chat: &Chat) -> ClientResult<()> {
        let response = self
            .client
            .post(self.url("/chat/save"))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({
                "chat_id": chat.id,
                "title": chat.title,
                "messages": chat.messages,
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ClientError::Auth(format!("chat save rejected: {}", response.status())))
            }
            status => Err(ClientError::Status(status)),
        }
    }

    /// Remove one persisted chat.
    pub async fn delete_chat(&self, token: &str, chat_id: Uuid) -> ClientResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/chat/{}/delete", chat_id)))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ClientError::Auth(format!("chat delete rejected: {}", response.status())))
            }
            status => Err(ClientError::Status(status)),
        }
    }
}
