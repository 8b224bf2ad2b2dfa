//! Chat backend client
//!
//! The avatar consumes two endpoints of the chat/TTS service:
//! - POST /send-message - submit a text or voice turn, returns a session id
//! - GET /chat/fetch?sessionId=<id> - poll for the next synthesized segment

pub mod client;
pub mod messages;

pub use client::{ChatBackend, HttpBackend};
pub use messages::{FetchResponse, OutgoingMessage, SendMessageRequest, SendMessageResponse};
