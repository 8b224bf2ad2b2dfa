//! Approximate lip-sync.
//!
//! There is no phoneme analysis: while a segment plays, a single intensity
//! oscillates with playback time and is written, scaled per shape, into the
//! model's mouth morph channels.

use tracing::debug;

use crate::config::LipSyncConfig;

/// The five VRM mouth shapes driven during speech
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouthShape {
    A,
    O,
    U,
    E,
    I,
}

impl MouthShape {
    pub const ALL: [MouthShape; 5] = [
        MouthShape::A,
        MouthShape::O,
        MouthShape::U,
        MouthShape::E,
        MouthShape::I,
    ];

    /// Morph target name on VRoid-style models
    pub fn channel(self) -> &'static str {
        match self {
            MouthShape::A => "Fcl_MTH_A",
            MouthShape::O => "Fcl_MTH_O",
            MouthShape::U => "Fcl_MTH_U",
            MouthShape::E => "Fcl_MTH_E",
            MouthShape::I => "Fcl_MTH_I",
        }
    }
}

/// Morph-target access on a rigged model.
///
/// Channels are resolved to indices once; per-frame writes go by index.
pub trait MorphTargets {
    fn morph_index(&self, channel: &str) -> Option<usize>;
    fn set_morph_weight(&mut self, index: usize, weight: f32);
}

/// Mouth openness at playback time `t` seconds, in [0, 1]
pub fn mouth_intensity(frequency: f32, t: f32) -> f32 {
    (((frequency * t).sin() + 1.0) / 2.0).clamp(0.0, 1.0)
}

pub struct LipSyncDriver {
    frequency: f32,
    coefficients: [f32; 5],
    bindings: [Option<usize>; 5],
    active: bool,
}

impl LipSyncDriver {
    pub fn new(config: &LipSyncConfig) -> Self {
        Self {
            frequency: config.frequency,
            coefficients: config.coefficients,
            bindings: [None; 5],
            active: false,
        }
    }

    /// Resolve mouth channels on a newly loaded model.
    ///
    /// Shapes the model lacks stay unbound and are skipped on every frame.
    pub fn bind<M: MorphTargets + ?Sized>(&mut self, model: &M) {
        for (slot, shape) in self.bindings.iter_mut().zip(MouthShape::ALL) {
            *slot = model.morph_index(shape.channel());
        }
        debug!(
            "Lip-sync bound {}/5 mouth channels",
            self.bindings.iter().flatten().count()
        );
    }

    pub fn unbind(&mut self) {
        self.bindings = [None; 5];
        self.active = false;
    }

    pub fn bound_channels(&self) -> usize {
        self.bindings.iter().flatten().count()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Write zero into every bound mouth channel
    pub fn close_mouth<M: MorphTargets + ?Sized>(&self, model: &mut M) {
        for index in self.bindings.iter().flatten() {
            model.set_morph_weight(*index, 0.0);
        }
    }

    /// Weight written to `shape` at playback time `t`
    pub fn weight(&self, shape: MouthShape, t: f32) -> f32 {
        mouth_intensity(self.frequency, t) * self.coefficients[shape as usize]
    }

    /// Write this frame's mouth weights. Returns the intensity, or `None` when inactive.
    pub fn apply<M: MorphTargets + ?Sized>(&self, model: &mut M, t: f32) -> Option<f32> {
        if !self.active {
            return None;
        }

        let v = mouth_intensity(self.frequency, t);
        for (binding, coefficient) in self.bindings.iter().zip(self.coefficients) {
            if let Some(index) = binding {
                model.set_morph_weight(*index, v * coefficient);
            }
        }
        Some(v)
    }
}
