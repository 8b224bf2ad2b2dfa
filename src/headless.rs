//! Headless collaborators.
//!
//! Lets the avatar run without a GPU, a sound card or asset files: audio
//! "plays" for exactly its duration, the model is a bag of morph weights and
//! clips are synthesized on request.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::animation::{AnimationClip, AnimationMixer};
use crate::audio::{AudioOutput, PcmClip};
use crate::config::AnimationConfig;
use crate::error::Result;
use crate::lipsync::{MorphTargets, MouthShape};
use crate::view::{AssetLoader, AvatarModel, SceneRenderer};

/// Audio output that waits out each clip's duration
#[derive(Debug, Default)]
pub struct TimedOutput;

#[async_trait]
impl AudioOutput for TimedOutput {
    async fn play(&self, clip: PcmClip) -> Result<()> {
        let duration = clip.duration();
        debug!(
            "Playing {:.2}s ({}Hz, {} channels)",
            duration.as_secs_f32(),
            clip.sample_rate,
            clip.channels
        );
        drop(clip);
        tokio::time::sleep(duration).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "timed"
    }
}

/// Model made of named morph channels and nothing else
#[derive(Debug, Clone)]
pub struct HeadlessModel {
    channels: Vec<String>,
    weights: Vec<f32>,
    pose_weight: f32,
    pose_layers: usize,
    disposed: bool,
}

impl HeadlessModel {
    pub fn new(channels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let channels: Vec<String> = channels.into_iter().map(Into::into).collect();
        let weights = vec![0.0; channels.len()];
        Self {
            channels,
            weights,
            pose_weight: 0.0,
            pose_layers: 0,
            disposed: false,
        }
    }

    /// A model carrying the five VRM mouth channels plus blink
    pub fn vrm() -> Self {
        Self::new(
            MouthShape::ALL
                .iter()
                .map(|s| s.channel())
                .chain(["Fcl_EYE_Close"]),
        )
    }

    pub fn morph_weight(&self, channel: &str) -> Option<f32> {
        self.morph_index(channel).map(|i| self.weights[i])
    }

    /// Summed weight of the last applied pose
    pub fn pose_weight(&self) -> f32 {
        self.pose_weight
    }

    pub fn pose_layers(&self) -> usize {
        self.pose_layers
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl MorphTargets for HeadlessModel {
    fn morph_index(&self, channel: &str) -> Option<usize> {
        self.channels.iter().position(|c| c == channel)
    }

    fn set_morph_weight(&mut self, index: usize, weight: f32) {
        if let Some(w) = self.weights.get_mut(index) {
            *w = weight;
        }
    }
}

impl AvatarModel for HeadlessModel {
    fn update(&mut self, _dt: f32) {}

    fn apply_pose(&mut self, mixer: &AnimationMixer) {
        self.pose_weight = mixer.total_weight();
        self.pose_layers = mixer.actions().count();
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Synthesizes a looping clip for every requested name
pub struct HeadlessAssets {
    config: AnimationConfig,
    clip_duration: f32,
}

impl HeadlessAssets {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            clip_duration: 2.0,
        }
    }
}

#[async_trait]
impl AssetLoader for HeadlessAssets {
    async fn load_model(&self) -> Result<Box<dyn AvatarModel>> {
        info!("Loading headless model for {}", self.config.model_path);
        Ok(Box::new(HeadlessModel::vrm()))
    }

    async fn load_clip(&self, clip_name: &str) -> Result<AnimationClip> {
        debug!("Loading clip {}", self.config.clip_path(clip_name));
        Ok(AnimationClip::new(clip_name, self.clip_duration))
    }
}

/// Renderer that only logs frame throughput
pub struct LogRenderer {
    frames: u64,
    report_every: Duration,
    frames_per_report: u64,
}

impl LogRenderer {
    pub fn new(fps: u32) -> Self {
        let report_every = Duration::from_secs(5);
        Self {
            frames: 0,
            report_every,
            frames_per_report: (fps.max(1) as u64) * report_every.as_secs(),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl SceneRenderer for LogRenderer {
    fn render(&mut self, _model: &dyn AvatarModel) {
        self.frames += 1;
        if self.frames % self.frames_per_report == 0 {
            debug!(
                "Rendered {} frames (~{:?} per report)",
                self.frames, self.report_every
            );
        }
    }
}
