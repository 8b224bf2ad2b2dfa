use tokio::time::Instant;
use tracing::trace;

use super::assets::{AvatarModel, SceneRenderer};
use crate::animation::AnimationStateMachine;
use crate::lipsync::LipSyncDriver;

/// Everything a frame touches
pub struct Frame<'a> {
    pub model: &'a mut dyn AvatarModel,
    pub animation: &'a mut AnimationStateMachine,
    pub lipsync: &'a LipSyncDriver,
    /// Seconds into the segment being played, if one is playing
    pub playback_time: Option<f32>,
}

/// Per-frame driver: model update, lip-sync, mixer advance, draw
pub struct RenderLoop {
    renderer: Box<dyn SceneRenderer>,
    last_frame: Option<Instant>,
    frames: u64,
}

impl RenderLoop {
    pub fn new(renderer: Box<dyn SceneRenderer>) -> Self {
        Self {
            renderer,
            last_frame: None,
            frames: 0,
        }
    }

    /// Frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn delta(&mut self, now: Instant) -> f32 {
        let dt = match self.last_frame {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_frame = Some(now);
        dt
    }

    /// Run one frame. Without a model only the clock advances.
    ///
    /// Returns the frame delta in seconds.
    pub fn tick(&mut self, now: Instant, frame: Option<Frame<'_>>) -> f32 {
        let dt = self.delta(now);
        let Some(frame) = frame else {
            return dt;
        };

        frame.model.update(dt);
        if let Some(t) = frame.playback_time {
            frame.lipsync.apply(&mut *frame.model, t);
        }
        frame.animation.update(dt);
        frame.model.apply_pose(frame.animation.mixer());
        self.renderer.render(&*frame.model);

        self.frames += 1;
        trace!("Frame {} ({:.4}s)", self.frames, dt);
        dt
    }
}
