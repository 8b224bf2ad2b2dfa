// Skeletal animation mixer with crossfading
//
// The mixer holds one incoming action plus any actions still fading out.
// During a fade window of length D, with progress s = elapsed / D:
//   incoming weight      = s
//   each outgoing weight = w_i * (1 - s)
// where w_i is the outgoing action's weight when the fade began. Since the
// weights summed to 1 at that moment, they keep summing to 1 throughout and
// settle at {0, 1} when s reaches 1, at which point outgoing actions are released.

use std::sync::Arc;
use tracing::debug;

use super::clip::AnimationClip;

/// A clip being played by the mixer
#[derive(Debug, Clone)]
pub struct ActiveAction {
    clip: Arc<AnimationClip>,
    time: f32,
    weight: f32,
    /// Weight at the start of the current fade (outgoing actions only)
    fade_from: f32,
}

impl ActiveAction {
    fn new(clip: Arc<AnimationClip>, weight: f32) -> Self {
        Self {
            clip,
            time: 0.0,
            weight,
            fade_from: weight,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Playhead in seconds, wrapped into the clip
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }
}

#[derive(Debug, Clone, Copy)]
struct FadeWindow {
    elapsed: f32,
    duration: f32,
}

impl FadeWindow {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Default)]
pub struct AnimationMixer {
    incoming: Option<ActiveAction>,
    outgoing: Vec<ActiveAction>,
    fade: Option<FadeWindow>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `clip` from frame zero, fading out whatever is playing.
    ///
    /// With nothing playing the clip starts at full weight immediately.
    pub fn crossfade_to(&mut self, clip: Arc<AnimationClip>, fade_secs: f32) {
        let Some(previous) = self.incoming.take() else {
            debug!("Starting clip {} at full weight", clip.name);
            self.incoming = Some(ActiveAction::new(clip, 1.0));
            return;
        };

        debug!(
            "Crossfading {} -> {} over {:.2}s",
            previous.clip.name, clip.name, fade_secs
        );

        self.outgoing.push(previous);
        for action in &mut self.outgoing {
            action.fade_from = action.weight;
        }

        self.incoming = Some(ActiveAction::new(clip, 0.0));
        self.fade = Some(FadeWindow {
            elapsed: 0.0,
            duration: fade_secs.max(0.0),
        });
        self.apply_fade();
    }

    /// Advance playheads and fades by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);

        for action in self.incoming.iter_mut().chain(self.outgoing.iter_mut()) {
            action.time = action.clip.wrap_time(action.time + dt);
        }

        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
        }
        self.apply_fade();
    }

    fn apply_fade(&mut self) {
        let Some(fade) = self.fade else {
            return;
        };

        let s = fade.progress();
        if let Some(incoming) = &mut self.incoming {
            incoming.weight = s;
        }
        for action in &mut self.outgoing {
            action.weight = action.fade_from * (1.0 - s);
        }

        if s >= 1.0 {
            for action in self.outgoing.drain(..) {
                debug!("Released clip {}", action.clip.name);
            }
            self.fade = None;
        }
    }

    /// Stop every action immediately
    pub fn stop_all(&mut self) {
        self.incoming = None;
        self.outgoing.clear();
        self.fade = None;
    }

    /// The action being faded in (or fully playing)
    pub fn current(&self) -> Option<&ActiveAction> {
        self.incoming.as_ref()
    }

    /// All live actions, incoming first
    pub fn actions(&self) -> impl Iterator<Item = &ActiveAction> {
        self.incoming.iter().chain(self.outgoing.iter())
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Sum of all action weights
    pub fn total_weight(&self) -> f32 {
        self.actions().map(|a| a.weight).sum()
    }
}
