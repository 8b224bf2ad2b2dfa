use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// When the first poll was issued
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Fetch requests sent to the backend
    pub polls_issued: usize,

    /// Segments played to completion
    pub segments_played: usize,

    /// Segments dropped because their audio could not be decoded
    pub segments_skipped: usize,
}

impl SessionStats {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            started_at: Utc::now(),
            duration_secs: 0.0,
            polls_issued: 0,
            segments_played: 0,
            segments_skipped: 0,
        }
    }

    /// Stamp the elapsed wall-clock time
    pub fn finish(&mut self) {
        let duration = Utc::now().signed_duration_since(self.started_at);
        self.duration_secs = duration.num_milliseconds() as f64 / 1000.0;
    }
}
