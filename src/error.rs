//! Error types for avatar-sync

use thiserror::Error;

/// Errors raised while driving the avatar
#[derive(Error, Debug)]
pub enum AvatarError {
    /// Fetch or transport failure talking to the chat backend
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Malformed or unexpected response from the chat backend
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Bad audio or animation payload
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// Missing or broken model/clip asset
    #[error("Asset load failure: {0}")]
    AssetLoadFailure(String),

    /// A send was attempted while another session is still open
    #[error("Session already active: {0}")]
    SessionBusy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The avatar view has been closed
    #[error("Avatar view closed")]
    Closed,
}

impl AvatarError {
    /// Whether this error leaves the server-side session in an unknown state.
    ///
    /// Sessions hit by these errors are abandoned, never retried.
    pub fn abandons_session(&self) -> bool {
        matches!(
            self,
            AvatarError::NetworkFailure(_) | AvatarError::ProtocolViolation(_)
        )
    }
}

impl From<reqwest::Error> for AvatarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AvatarError::ProtocolViolation(err.to_string())
        } else {
            AvatarError::NetworkFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AvatarError {
    fn from(err: serde_json::Error) -> Self {
        AvatarError::ProtocolViolation(format!("Invalid response body: {}", err))
    }
}

impl From<hex::FromHexError> for AvatarError {
    fn from(err: hex::FromHexError) -> Self {
        AvatarError::DecodeFailure(format!("Invalid hex payload: {}", err))
    }
}

impl From<hound::Error> for AvatarError {
    fn from(err: hound::Error) -> Self {
        AvatarError::DecodeFailure(format!("Invalid WAV payload: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AvatarError>;
