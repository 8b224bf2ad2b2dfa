use std::fmt;

use super::state::AnimationState;

/// A loaded skeletal animation clip.
///
/// Track data stays with the model collaborator; the mixer only needs the
/// name to address it and the duration to loop it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Length in seconds
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }

    /// Wrap a playhead into the clip (clips loop forever)
    pub fn wrap_time(&self, time: f32) -> f32 {
        if self.duration > 0.0 {
            time.rem_euclid(self.duration)
        } else {
            0.0
        }
    }
}

/// A request to load the clip for a state, tagged so stale results can be told apart
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub id: u64,
    pub state: AnimationState,
}

impl fmt::Display for ClipRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.id, self.state)
    }
}
