use serde::{Deserialize, Serialize};

/// Response of `GET /chat/fetch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// `false` once the session is exhausted
    pub has_more: bool,
    /// Hex-encoded WAV bytes, `null` while the server has nothing ready
    #[serde(default)]
    pub audio: Option<String>,
    /// Caption for the segment
    #[serde(default)]
    pub en_sub: String,
}

impl FetchResponse {
    pub fn pending() -> Self {
        Self {
            has_more: true,
            audio: None,
            en_sub: String::new(),
        }
    }

    pub fn exhausted() -> Self {
        Self {
            has_more: false,
            audio: None,
            en_sub: String::new(),
        }
    }

    pub fn segment(audio_hex: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            has_more: true,
            audio: Some(audio_hex.into()),
            en_sub: caption.into(),
        }
    }
}

/// JSON body of a text `POST /send-message`
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// Response of `POST /send-message`
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// A user turn to hand to the chat backend
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingMessage {
    Text(String),
    /// Recorded WAV bytes, sent as a multipart upload
    Voice(Vec<u8>),
}

impl OutgoingMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            OutgoingMessage::Text(_) => "text",
            OutgoingMessage::Voice(_) => "voice",
        }
    }
}
