use async_trait::async_trait;

use crate::animation::{AnimationClip, AnimationMixer};
use crate::error::Result;
use crate::lipsync::MorphTargets;

/// A loaded, rigged avatar model
pub trait AvatarModel: MorphTargets + Send {
    /// Per-frame model housekeeping (spring bones, look-at, ...)
    fn update(&mut self, dt: f32);

    /// Pose the skeleton from the mixer's weighted actions
    fn apply_pose(&mut self, mixer: &AnimationMixer);

    /// Release GPU/scene resources
    fn dispose(&mut self) {}
}

/// Model and clip loading
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load_model(&self) -> Result<Box<dyn AvatarModel>>;

    /// Load the clip asset with the given name
    async fn load_clip(&self, clip_name: &str) -> Result<AnimationClip>;
}

/// Draws the scene once per frame
pub trait SceneRenderer: Send {
    fn render(&mut self, model: &dyn AvatarModel);
}
