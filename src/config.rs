use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Environment variables prefixed with this override file settings,
/// e.g. `AVATAR_SYNC_BACKEND__BASE_URL`.
const ENV_PREFIX: &str = "AVATAR_SYNC";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub animation: AnimationConfig,
    pub lipsync: LipSyncConfig,
    pub inactivity: InactivityConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Delay between polls while the server has no audio ready
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Give up on a session after this many consecutive empty polls.
    /// Unset means poll for as long as the session stays open.
    pub max_empty_polls: Option<u32>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6969".to_string(),
            poll_interval_ms: 500,
            request_timeout_ms: 30_000,
            max_empty_polls: None,
        }
    }
}

impl BackendConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Crossfade duration between skeletal clips
    pub fade_secs: f32,
    pub model_path: String,
    pub clip_dir: String,
    pub idle_clip: String,
    pub talking_clip: String,
    /// Clip shown while the avatar idles without activity
    pub idle_pose: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fade_secs: 0.25,
            model_path: "/models/avatar.vrm".to_string(),
            clip_dir: "/mixamo".to_string(),
            idle_clip: "idle".to_string(),
            talking_clip: "talking".to_string(),
            idle_pose: "batterOnDeck".to_string(),
        }
    }
}

impl AnimationConfig {
    /// Asset path of a clip, e.g. `/mixamo/idle.fbx`
    pub fn clip_path(&self, clip_name: &str) -> String {
        format!("{}/{}.fbx", self.clip_dir.trim_end_matches('/'), clip_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Angular frequency of the mouth oscillation (radians per second)
    pub frequency: f32,
    /// Weight scale per mouth shape, in A/O/U/E/I order
    pub coefficients: [f32; 5],
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            frequency: 5.0,
            coefficients: [0.75, 0.4, 0.25, 0.2, 0.15],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InactivityConfig {
    /// Quiet time before the idle pose starts toggling
    pub delay_secs: u64,
    pub toggle_period_secs: u64,
}

impl Default for InactivityConfig {
    fn default() -> Self {
        Self {
            delay_secs: 30,
            toggle_period_secs: 30,
        }
    }
}

impl InactivityConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn toggle_period(&self) -> Duration {
        Duration::from_secs(self.toggle_period_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

impl RenderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

impl Config {
    /// Load configuration from a file (optional) layered under environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        let cfg: Self = settings
            .try_deserialize()
            .context("Failed to parse config")?;
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            anyhow::bail!("backend.base_url must not be empty");
        }
        if self.backend.poll_interval_ms == 0 {
            anyhow::bail!("backend.poll_interval_ms must be positive");
        }
        if self.animation.fade_secs < 0.0 {
            anyhow::bail!("animation.fade_secs must not be negative");
        }
        if self
            .lipsync
            .coefficients
            .iter()
            .any(|c| !(0.0..1.0).contains(c))
        {
            anyhow::bail!("lipsync.coefficients must each be in [0, 1)");
        }
        if self.inactivity.toggle_period_secs == 0 {
            anyhow::bail!("inactivity.toggle_period_secs must be positive");
        }
        if self.render.fps == 0 {
            anyhow::bail!("render.fps must be positive");
        }
        Ok(())
    }
}
