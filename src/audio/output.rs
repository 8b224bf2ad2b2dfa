use async_trait::async_trait;

use super::segment::PcmClip;
use crate::error::Result;

/// Audio playback device trait
///
/// Implementations own whatever buffers the device needs for a clip and
/// release them before `play` returns.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play a clip to completion
    ///
    /// Resolves once playback has ended.
    async fn play(&self, clip: PcmClip) -> Result<()>;

    /// Get output name for logging
    fn name(&self) -> &str;
}
