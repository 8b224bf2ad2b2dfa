use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info};

use super::messages::{FetchResponse, OutgoingMessage, SendMessageRequest, SendMessageResponse};
use crate::config::BackendConfig;
use crate::error::{AvatarError, Result};

/// The chat/TTS service the avatar talks to
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Submit a user turn; returns the id of the session that will carry the reply
    async fn send_message(&self, message: OutgoingMessage) -> Result<String>;

    /// Ask for the next audio segment of a session
    async fn fetch_segment(&self, session_id: &str) -> Result<FetchResponse>;
}

/// HTTP client for the chat backend
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AvatarError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Chat backend at {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check_status(response: Response, endpoint: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AvatarError::ProtocolViolation(format!(
            "{} returned {}: {}",
            endpoint,
            status,
            body.chars().take(200).collect::<String>()
        )))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_message(&self, message: OutgoingMessage) -> Result<String> {
        let request = self.client.post(self.url("/send-message"));
        let kind = message.kind();

        let request = match message {
            OutgoingMessage::Text(text) => request.json(&SendMessageRequest { message: text }),
            OutgoingMessage::Voice(wav) => {
                let part = Part::bytes(wav)
                    .file_name("input.wav")
                    .mime_str("audio/wav")?;
                request.multipart(Form::new().part("audio", part))
            }
        };

        let response = request.send().await?;
        let response = Self::check_status(response, "send-message").await?;
        let body = response.bytes().await?;
        let parsed: SendMessageResponse = serde_json::from_slice(&body)?;

        if parsed.session_id.is_empty() {
            return Err(AvatarError::ProtocolViolation(
                "send-message returned an empty session id".to_string(),
            ));
        }

        info!("Sent {} message, session {}", kind, parsed.session_id);
        Ok(parsed.session_id)
    }

    async fn fetch_segment(&self, session_id: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(self.url("/chat/fetch"))
            .query(&[("sessionId", session_id)])
            .send()
            .await?;
        let response = Self::check_status(response, "chat/fetch").await?;
        let body = response.bytes().await?;
        let parsed: FetchResponse = serde_json::from_slice(&body)?;

        debug!(
            "Fetched session {}: has_more={}, audio={}",
            session_id,
            parsed.has_more,
            parsed.audio.as_ref().map(|a| a.len()).unwrap_or(0)
        );

        Ok(parsed)
    }
}
