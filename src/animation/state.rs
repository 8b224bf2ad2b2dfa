use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::clip::{AnimationClip, ClipRequest};
use super::mixer::AnimationMixer;
use crate::config::AnimationConfig;
use crate::error::Result;

/// Discrete avatar animation state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnimationState {
    Idle,
    Talking,
    /// Named filler pose shown after prolonged inactivity
    CustomPose(String),
}

impl AnimationState {
    /// Name of the clip asset backing this state
    pub fn clip_name<'a>(&'a self, config: &'a AnimationConfig) -> &'a str {
        match self {
            AnimationState::Idle => &config.idle_clip,
            AnimationState::Talking => &config.talking_clip,
            AnimationState::CustomPose(name) => name,
        }
    }

    pub fn is_custom_pose(&self) -> bool {
        matches!(self, AnimationState::CustomPose(_))
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationState::Idle => write!(f, "idle"),
            AnimationState::Talking => write!(f, "talking"),
            AnimationState::CustomPose(name) => write!(f, "pose:{}", name),
        }
    }
}

/// Owns the avatar's animation state and the mixer that shows it.
///
/// Transitions are the only way to change the state. Each transition asks the
/// caller to load the target clip (via the returned [`ClipRequest`]); the
/// loaded clip is handed back through [`AnimationStateMachine::apply_clip`].
///
/// Until the model is ready, transitions only update a single pending slot:
/// a newer transition overwrites an older pending one, so at most one load is
/// issued once the model arrives.
pub struct AnimationStateMachine {
    state: AnimationState,
    pending: Option<AnimationState>,
    model_ready: bool,
    latest_request: u64,
    shown: Option<AnimationState>,
    mixer: AnimationMixer,
    fade_secs: f32,
}

impl AnimationStateMachine {
    /// Start in `Idle`, with the idle clip pending until the model is ready
    pub fn new(fade_secs: f32) -> Self {
        Self {
            state: AnimationState::Idle,
            pending: Some(AnimationState::Idle),
            model_ready: false,
            latest_request: 0,
            shown: None,
            mixer: AnimationMixer::new(),
            fade_secs,
        }
    }

    /// The intended state (may be ahead of what is shown)
    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// The state whose clip is currently faded in, if any
    pub fn shown_state(&self) -> Option<&AnimationState> {
        self.shown.as_ref()
    }

    pub fn pending(&self) -> Option<&AnimationState> {
        self.pending.as_ref()
    }

    pub fn is_model_ready(&self) -> bool {
        self.model_ready
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Move to `target`; returns the clip load to start, if one is due now
    pub fn transition(&mut self, target: AnimationState) -> Option<ClipRequest> {
        if target == self.state {
            return None;
        }

        info!("Animation {} -> {}", self.state, target);
        self.state = target.clone();

        if !self.model_ready {
            if let Some(replaced) = self.pending.replace(target) {
                debug!("Pending animation {} superseded", replaced);
            }
            return None;
        }

        Some(self.issue(target))
    }

    /// The model finished loading: flush the pending state
    pub fn model_ready(&mut self) -> Option<ClipRequest> {
        self.model_ready = true;
        let pending = self.pending.take()?;
        Some(self.issue(pending))
    }

    fn issue(&mut self, state: AnimationState) -> ClipRequest {
        self.latest_request += 1;
        ClipRequest {
            id: self.latest_request,
            state,
        }
    }

    /// Apply the result of a clip load.
    ///
    /// Failures are logged and leave the current animation as it is. Results
    /// of superseded requests are dropped. Returns whether the mixer changed.
    pub fn apply_clip(&mut self, request: &ClipRequest, loaded: Result<AnimationClip>) -> bool {
        let clip = match loaded {
            Ok(clip) => clip,
            Err(e) => {
                error!("Failed loading clip for {}: {}", request, e);
                return false;
            }
        };

        if !self.model_ready {
            debug!("Dropping clip {} loaded without a model", request);
            return false;
        }
        if request.id != self.latest_request {
            debug!(
                "Dropping stale clip {} (latest is #{})",
                request, self.latest_request
            );
            return false;
        }

        self.mixer.crossfade_to(Arc::new(clip), self.fade_secs);
        self.shown = Some(request.state.clone());
        true
    }

    /// Advance the mixer by one frame
    pub fn update(&mut self, dt: f32) {
        self.mixer.update(dt);
    }

    /// Stop all actions; the model is going away
    pub fn stop(&mut self) {
        self.mixer.stop_all();
        self.model_ready = false;
        self.shown = None;
    }
}
