use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::slot::SessionLease;
use crate::audio::AudioSegment;
use crate::backend::ChatBackend;
use crate::config::BackendConfig;
use crate::error::{AvatarError, Result};

/// Outcome of asking the stream for its next segment
#[derive(Debug)]
pub enum StreamItem {
    Segment(AudioSegment),
    End(StreamEnd),
}

/// Why a session stream stopped producing segments
#[derive(Debug)]
pub enum StreamEnd {
    /// The server reported `has_more == false`
    Exhausted,
    /// Transport or protocol failure; the session was abandoned
    Abandoned(AvatarError),
}

impl StreamEnd {
    pub fn is_clean(&self) -> bool {
        matches!(self, StreamEnd::Exhausted)
    }

    pub fn error(&self) -> Option<&AvatarError> {
        match self {
            StreamEnd::Exhausted => None,
            StreamEnd::Abandoned(e) => Some(e),
        }
    }
}

/// Consumer-paced segment stream for one session.
///
/// Nothing is fetched until [`SessionStream::next_segment`] is called, and each
/// call returns as soon as one segment (or the end of the stream) is known.
pub struct SessionStream {
    backend: Arc<dyn ChatBackend>,
    lease: SessionLease,
    poll_interval: Duration,
    max_empty_polls: Option<u32>,
    next_index: usize,
    polls_issued: usize,
    finished: bool,
}

impl SessionStream {
    pub fn new(backend: Arc<dyn ChatBackend>, lease: SessionLease, config: &BackendConfig) -> Self {
        Self {
            backend,
            lease,
            poll_interval: config.poll_interval(),
            max_empty_polls: config.max_empty_polls,
            next_index: 0,
            polls_issued: 0,
            finished: false,
        }
    }

    pub fn session_id(&self) -> &str {
        self.lease.session_id()
    }

    pub fn polls_issued(&self) -> usize {
        self.polls_issued
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Sleep for one poll interval
    pub async fn wait_poll_interval(&self) {
        tokio::time::sleep(self.poll_interval).await;
    }

    /// Poll until the server hands over a segment or ends the session
    pub async fn next_segment(&mut self) -> StreamItem {
        if self.finished {
            return StreamItem::End(StreamEnd::Exhausted);
        }

        let mut empty_polls: u32 = 0;

        loop {
            self.polls_issued += 1;

            let response = match self.backend.fetch_segment(self.lease.session_id()).await {
                Ok(r) => r,
                Err(e) => {
                    error!("Fetch failed for session {}: {}", self.session_id(), e);
                    return self.finish(StreamEnd::Abandoned(e));
                }
            };

            if !response.has_more {
                info!("Session {} exhausted", self.session_id());
                return self.finish(StreamEnd::Exhausted);
            }

            match response.audio.as_deref() {
                Some(audio_hex) if !audio_hex.is_empty() => {
                    match AudioSegment::from_hex(
                        self.next_index,
                        audio_hex,
                        response.en_sub,
                        response.has_more,
                    ) {
                        Ok(segment) => {
                            info!(
                                "Segment {} received for session {} ({} bytes)",
                                segment.index,
                                self.session_id(),
                                segment.payload.len()
                            );
                            self.next_index += 1;
                            return StreamItem::Segment(segment);
                        }
                        Err(e) => {
                            warn!("{}; treating as not ready", e);
                        }
                    }
                }
                _ => {
                    debug!("No audio ready yet for session {}", self.session_id());
                }
            }

            empty_polls += 1;
            if let Some(max) = self.max_empty_polls {
                if empty_polls >= max {
                    error!(
                        "No audio for session {} after {} polls, abandoning",
                        self.session_id(),
                        empty_polls
                    );
                    return self.finish(StreamEnd::Abandoned(AvatarError::ProtocolViolation(
                        format!("No audio after {} polls", empty_polls),
                    )));
                }
            }

            self.wait_poll_interval().await;
        }
    }

    fn finish(&mut self, end: StreamEnd) -> StreamItem {
        self.finished = true;
        self.lease.release();
        StreamItem::End(end)
    }

    /// Adapt into a `Stream` of segments.
    ///
    /// A clean exhaustion ends the stream; an abandoned session yields its
    /// error as the final item.
    pub fn into_stream(self) -> impl Stream<Item = Result<AudioSegment>> + Send {
        stream::unfold(self, |mut session| async move {
            if session.is_finished() {
                return None;
            }
            match session.next_segment().await {
                StreamItem::Segment(segment) => Some((Ok(segment), session)),
                StreamItem::End(StreamEnd::Exhausted) => None,
                StreamItem::End(StreamEnd::Abandoned(e)) => Some((Err(e), session)),
            }
        })
    }
}
