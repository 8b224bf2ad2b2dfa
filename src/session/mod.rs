//! Session management
//!
//! A session is one reply of the chat backend, identified by an opaque id.
//! This module provides:
//! - `SessionSlot` - the single "current session id", filled by the send path
//! - `SessionStream` - polls the backend for the session's audio segments
//! - `SessionStats` - per-session counters

mod slot;
mod stats;
mod stream;

pub use slot::{SessionLease, SessionSlot};
pub use stats::SessionStats;
pub use stream::{SessionStream, StreamEnd, StreamItem};
