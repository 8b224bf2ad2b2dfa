//! Avatar body animation
//!
//! - `AnimationStateMachine` - idle / talking / custom pose, with pending-state coalescing
//! - `AnimationMixer` - crossfades between skeletal clips
//! - `AnimationClip` / `ClipRequest` - loaded clips and the loads that produce them

mod clip;
mod mixer;
mod state;

pub use clip::{AnimationClip, ClipRequest};
pub use mixer::{ActiveAction, AnimationMixer};
pub use state::{AnimationState, AnimationStateMachine};
