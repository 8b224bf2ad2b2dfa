use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::output::AudioOutput;
use crate::session::{SessionStats, SessionStream, StreamEnd, StreamItem};

/// Notifications from a playback driver to the avatar view
#[derive(Debug)]
pub enum PlaybackEvent {
    /// A segment has started playing
    SegmentStarted {
        session_id: String,
        index: usize,
        caption: String,
        duration: Duration,
    },
    /// A segment finished playing; the next fetch starts right after
    SegmentFinished { session_id: String, index: usize },
    /// The session stream ended, cleanly or not
    StreamEnded {
        session_id: String,
        end: StreamEnd,
        stats: SessionStats,
    },
}

/// Plays one session's segments strictly in order.
///
/// The driver alternates between fetching and playing: segment N+1 is not
/// requested until segment N has finished.
pub struct PlaybackDriver {
    stream: SessionStream,
    output: Arc<dyn AudioOutput>,
    events: mpsc::Sender<PlaybackEvent>,
    stats: SessionStats,
}

impl PlaybackDriver {
    pub fn new(
        stream: SessionStream,
        output: Arc<dyn AudioOutput>,
        events: mpsc::Sender<PlaybackEvent>,
    ) -> Self {
        let stats = SessionStats::new(stream.session_id());
        Self {
            stream,
            output,
            events,
            stats,
        }
    }

    pub fn session_id(&self) -> &str {
        self.stream.session_id()
    }

    /// Run until the stream ends, the view goes away, or `cancel` fires.
    ///
    /// Returns the session statistics, or `None` when cancelled.
    pub async fn run(mut self, cancel: CancellationToken) -> Option<SessionStats> {
        let session_id = self.session_id().to_string();
        info!(
            "Playback driver started for session {} on {}",
            session_id,
            self.output.name()
        );

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Playback driver for session {} cancelled", session_id);
                    return None;
                }
                item = self.stream.next_segment() => item,
            };
            self.stats.polls_issued = self.stream.polls_issued();

            let segment = match item {
                StreamItem::Segment(segment) => segment,
                StreamItem::End(end) => {
                    self.stats.finish();
                    info!(
                        "Session {} ended: {} segments played, {} skipped, {} polls, {:.1}s",
                        session_id,
                        self.stats.segments_played,
                        self.stats.segments_skipped,
                        self.stats.polls_issued,
                        self.stats.duration_secs
                    );
                    let stats = self.stats.clone();
                    let _ = self
                        .events
                        .send(PlaybackEvent::StreamEnded {
                            session_id: session_id.clone(),
                            end,
                            stats: stats.clone(),
                        })
                        .await;
                    return Some(stats);
                }
            };

            let clip = match segment.decode() {
                Ok(clip) => clip,
                Err(e) => {
                    warn!(
                        "Segment {} of session {} is not playable ({}); polling again",
                        segment.index, session_id, e
                    );
                    self.stats.segments_skipped += 1;
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return None,
                        _ = self.stream.wait_poll_interval() => {}
                    }
                    continue;
                }
            };

            let index = segment.index;
            let started = PlaybackEvent::SegmentStarted {
                session_id: session_id.clone(),
                index,
                caption: segment.caption,
                duration: clip.duration(),
            };
            if self.events.send(started).await.is_err() {
                warn!("Avatar view gone, stopping playback for session {}", session_id);
                return None;
            }

            info!("Playing segment {} of session {}", index, session_id);
            let played = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                played = self.output.play(clip) => played,
            };
            if let Err(e) = played {
                error!("Playback of segment {} failed: {}", index, e);
            }
            self.stats.segments_played += 1;

            let finished = PlaybackEvent::SegmentFinished {
                session_id: session_id.clone(),
                index,
            };
            if self.events.send(finished).await.is_err() {
                warn!("Avatar view gone, stopping playback for session {}", session_id);
                return None;
            }
        }
    }
}
