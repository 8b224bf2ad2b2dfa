#![allow(dead_code)]

use async_trait::async_trait;
use avatar_sync::headless::HeadlessModel;
use avatar_sync::{
    AnimationClip, AnimationMixer, AssetLoader, AudioOutput, AvatarError, AvatarModel, ChatBackend,
    Config, FetchResponse, MorphTargets, OutgoingMessage, PcmClip, Result, SceneRenderer,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const SAMPLE_RATE: u32 = 16000;

/// Config with test-friendly defaults
pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.backend.base_url = "http://stub".to_string();
    cfg.backend.poll_interval_ms = 500;
    cfg
}

/// Mono 16-bit WAV of a sine tone lasting `millis`
pub fn wav_bytes(millis: u64) -> Vec<u8> {
    let frames = (SAMPLE_RATE as u64 * millis / 1000) as usize;
    let samples = (0..frames)
        .map(|i| ((i as f32 * 0.05).sin() * 8000.0) as i16)
        .collect();
    let clip = PcmClip {
        samples,
        sample_rate: SAMPLE_RATE,
        channels: 1,
    };
    clip.to_wav_bytes().unwrap()
}

pub fn wav_hex(millis: u64) -> String {
    hex::encode(wav_bytes(millis))
}

/// Ordered log shared between fakes
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Chat backend that replays scripted responses
pub struct ScriptedBackend {
    fetches: Mutex<VecDeque<Result<FetchResponse>>>,
    fallback: FetchResponse,
    sends: Mutex<VecDeque<Result<String>>>,
    default_session: String,
    sent: Mutex<Vec<OutgoingMessage>>,
    fetch_times: Mutex<Vec<Instant>>,
    log: EventLog,
}

impl ScriptedBackend {
    pub fn new(log: EventLog) -> Self {
        Self {
            fetches: Mutex::new(VecDeque::new()),
            fallback: FetchResponse::pending(),
            sends: Mutex::new(VecDeque::new()),
            default_session: "session-1".to_string(),
            sent: Mutex::new(Vec::new()),
            fetch_times: Mutex::new(Vec::new()),
            log,
        }
    }

    /// Response once the script runs out
    pub fn with_fallback(mut self, fallback: FetchResponse) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.default_session = session_id.to_string();
        self
    }

    pub fn push_fetch(&self, response: FetchResponse) {
        self.fetches.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_fetch_error(&self, error: AvatarError) {
        self.fetches.lock().unwrap().push_back(Err(error));
    }

    pub fn push_send(&self, result: Result<String>) {
        self.sends.lock().unwrap().push_back(result);
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetch_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send_message(&self, message: OutgoingMessage) -> Result<String> {
        self.log.push(format!("send:{}", message.kind()));
        self.sent.lock().unwrap().push(message);
        let scripted = self.sends.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.default_session.clone()))
    }

    async fn fetch_segment(&self, _session_id: &str) -> Result<FetchResponse> {
        self.log.push("fetch");
        self.fetch_times.lock().unwrap().push(Instant::now());
        let scripted = self.fetches.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Audio output that logs start/end and waits out the clip
#[derive(Default)]
pub struct RecordingOutput {
    log: EventLog,
    durations: Mutex<Vec<Duration>>,
}

impl RecordingOutput {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            durations: Mutex::new(Vec::new()),
        }
    }

    pub fn played(&self) -> Vec<Duration> {
        self.durations.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioOutput for RecordingOutput {
    async fn play(&self, clip: PcmClip) -> Result<()> {
        let duration = clip.duration();
        self.log.push("play-start");
        tokio::time::sleep(duration).await;
        self.durations.lock().unwrap().push(duration);
        self.log.push("play-end");
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Avatar model whose state stays observable after it is handed to the view
#[derive(Clone)]
pub struct SharedModel(pub Arc<Mutex<HeadlessModel>>);

impl SharedModel {
    pub fn vrm() -> Self {
        Self(Arc::new(Mutex::new(HeadlessModel::vrm())))
    }

    pub fn morph_weight(&self, channel: &str) -> Option<f32> {
        self.0.lock().unwrap().morph_weight(channel)
    }

    pub fn pose_weight(&self) -> f32 {
        self.0.lock().unwrap().pose_weight()
    }

    pub fn is_disposed(&self) -> bool {
        self.0.lock().unwrap().is_disposed()
    }
}

impl MorphTargets for SharedModel {
    fn morph_index(&self, channel: &str) -> Option<usize> {
        self.0.lock().unwrap().morph_index(channel)
    }

    fn set_morph_weight(&mut self, index: usize, weight: f32) {
        self.0.lock().unwrap().set_morph_weight(index, weight);
    }
}

impl AvatarModel for SharedModel {
    fn update(&mut self, dt: f32) {
        self.0.lock().unwrap().update(dt);
    }

    fn apply_pose(&mut self, mixer: &AnimationMixer) {
        self.0.lock().unwrap().apply_pose(mixer);
    }

    fn dispose(&mut self) {
        self.0.lock().unwrap().dispose();
    }
}

/// Asset loader handing out a shared model and instant clips
pub struct FakeAssets {
    model: SharedModel,
    model_fails: bool,
    failing_clips: HashSet<String>,
    clip_loads: Mutex<Vec<String>>,
}

impl FakeAssets {
    pub fn new(model: SharedModel) -> Self {
        Self {
            model,
            model_fails: false,
            failing_clips: HashSet::new(),
            clip_loads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_model(mut self) -> Self {
        self.model_fails = true;
        self
    }

    pub fn failing_clip(mut self, name: &str) -> Self {
        self.failing_clips.insert(name.to_string());
        self
    }

    pub fn clip_loads(&self) -> Vec<String> {
        self.clip_loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetLoader for FakeAssets {
    async fn load_model(&self) -> Result<Box<dyn AvatarModel>> {
        if self.model_fails {
            return Err(AvatarError::AssetLoadFailure("avatar.vrm missing".to_string()));
        }
        Ok(Box::new(self.model.clone()))
    }

    async fn load_clip(&self, clip_name: &str) -> Result<AnimationClip> {
        self.clip_loads.lock().unwrap().push(clip_name.to_string());
        if self.failing_clips.contains(clip_name) {
            return Err(AvatarError::AssetLoadFailure(format!("{}.fbx missing", clip_name)));
        }
        Ok(AnimationClip::new(clip_name, 1.5))
    }
}

/// Renderer that only counts frames
#[derive(Clone, Default)]
pub struct CountingRenderer(pub Arc<AtomicU64>);

impl CountingRenderer {
    pub fn frames(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl SceneRenderer for CountingRenderer {
    fn render(&mut self, _model: &dyn AvatarModel) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
