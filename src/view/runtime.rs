use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::assets::{AssetLoader, AvatarModel, SceneRenderer};
use super::render::{Frame, RenderLoop};
use crate::animation::{AnimationClip, AnimationState, AnimationStateMachine, ClipRequest};
use crate::audio::{AudioOutput, PlaybackDriver, PlaybackEvent};
use crate::backend::{ChatBackend, OutgoingMessage};
use crate::config::Config;
use crate::error::{AvatarError, Result};
use crate::inactivity::InactivityMonitor;
use crate::lipsync::LipSyncDriver;
use crate::session::{SessionLease, SessionSlot, SessionStats, SessionStream};

const COMMAND_CHANNEL_SIZE: usize = 32;
const EVENT_CHANNEL_SIZE: usize = 32;

/// Input from the UI layer
#[derive(Debug)]
pub enum ViewCommand {
    SendText(String),
    /// Recorded WAV bytes
    SendVoice(Vec<u8>),
    /// The user started recording a voice message
    RecordingStarted,
    Close,
}

/// Snapshot of the view for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub struct ViewStatus {
    /// Active session id, empty when idle
    pub session_id: String,
    pub animation: AnimationState,
    /// Caption of the segment being played
    pub caption: Option<String>,
    pub speaking: bool,
    pub model_loaded: bool,
    pub idle_toggling: bool,
    /// A send request is in flight
    pub send_pending: bool,
    /// Send attempts that have concluded (failed send or finished stream)
    pub turns_completed: u64,
}

impl ViewStatus {
    /// Whether the send control should be enabled
    pub fn can_send(&self) -> bool {
        self.session_id.is_empty() && !self.send_pending
    }
}

impl Default for ViewStatus {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            animation: AnimationState::Idle,
            caption: None,
            speaking: false,
            model_loaded: false,
            idle_toggling: false,
            send_pending: false,
            turns_completed: 0,
        }
    }
}

/// External collaborators the view drives
pub struct Collaborators {
    pub backend: Arc<dyn ChatBackend>,
    pub output: Arc<dyn AudioOutput>,
    pub assets: Arc<dyn AssetLoader>,
    pub renderer: Box<dyn SceneRenderer>,
}

/// Cloneable handle for talking to a running [`AvatarView`]
#[derive(Clone)]
pub struct AvatarHandle {
    commands: mpsc::Sender<ViewCommand>,
    status: watch::Receiver<ViewStatus>,
    session: SessionSlot,
}

impl AvatarHandle {
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.command(ViewCommand::SendText(text.into())).await
    }

    pub async fn send_voice(&self, wav: Vec<u8>) -> Result<()> {
        self.command(ViewCommand::SendVoice(wav)).await
    }

    pub async fn recording_started(&self) -> Result<()> {
        self.command(ViewCommand::RecordingStarted).await
    }

    /// Ask the view to shut down. Closing an already closed view is a no-op.
    pub async fn close(&self) -> Result<()> {
        match self.command(ViewCommand::Close).await {
            Err(AvatarError::Closed) => Ok(()),
            other => other,
        }
    }

    async fn command(&self, command: ViewCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| AvatarError::Closed)
    }

    pub fn status(&self) -> ViewStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewStatus> {
        self.status.clone()
    }

    /// Current session id, empty when idle
    pub fn session_id(&self) -> String {
        self.session.current()
    }

    /// Wait until the status satisfies `predicate`
    pub async fn wait_for(&self, predicate: impl FnMut(&ViewStatus) -> bool) -> Result<ViewStatus> {
        let mut status = self.status.clone();
        let matched = status
            .wait_for(predicate)
            .await
            .map_err(|_| AvatarError::Closed)?;
        Ok(matched.clone())
    }
}

/// Completions of deferred work, delivered back to the view task
enum ViewEvent {
    ModelLoaded(Result<Box<dyn AvatarModel>>),
    ClipLoaded(ClipRequest, Result<AnimationClip>),
    SendCompleted(Result<String>),
}

struct PlayingSegment {
    index: usize,
    started_at: Instant,
    caption: String,
}

struct DriverTask {
    session_id: String,
    handle: JoinHandle<Option<SessionStats>>,
}

/// The avatar view: owns the model, animation, lip-sync, inactivity monitor
/// and the playback of the current session.
///
/// All state lives on the view task; loads, sends and playback run in spawned
/// tasks that report back over channels.
pub struct AvatarView {
    config: Config,
    backend: Arc<dyn ChatBackend>,
    output: Arc<dyn AudioOutput>,
    assets: Arc<dyn AssetLoader>,
    render_loop: RenderLoop,

    model: Option<Box<dyn AvatarModel>>,
    animation: AnimationStateMachine,
    lipsync: LipSyncDriver,
    inactivity: InactivityMonitor,

    session: SessionSlot,
    send_pending: bool,
    playing: Option<PlayingSegment>,
    driver: Option<DriverTask>,
    turns_completed: u64,

    cancel: CancellationToken,
    commands: mpsc::Receiver<ViewCommand>,
    events_tx: mpsc::Sender<ViewEvent>,
    events_rx: mpsc::Receiver<ViewEvent>,
    playback_tx: mpsc::Sender<PlaybackEvent>,
    playback_rx: mpsc::Receiver<PlaybackEvent>,
    status: watch::Sender<ViewStatus>,
}

impl AvatarView {
    pub fn new(config: Config, collaborators: Collaborators) -> (Self, AvatarHandle) {
        let (commands_tx, commands) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (playback_tx, playback_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (status, status_rx) = watch::channel(ViewStatus::default());
        let session = SessionSlot::new();

        let handle = AvatarHandle {
            commands: commands_tx,
            status: status_rx,
            session: session.clone(),
        };

        let view = Self {
            animation: AnimationStateMachine::new(config.animation.fade_secs),
            lipsync: LipSyncDriver::new(&config.lipsync),
            inactivity: InactivityMonitor::new(&config.inactivity),
            render_loop: RenderLoop::new(collaborators.renderer),
            backend: collaborators.backend,
            output: collaborators.output,
            assets: collaborators.assets,
            config,
            model: None,
            session,
            send_pending: false,
            playing: None,
            driver: None,
            turns_completed: 0,
            cancel: CancellationToken::new(),
            commands,
            events_tx,
            events_rx,
            playback_tx,
            playback_rx,
            status,
        };

        (view, handle)
    }

    /// Run until closed
    pub async fn run(mut self) -> Result<()> {
        info!("Avatar view started");

        self.note_activity(Instant::now());
        self.spawn_model_load();
        self.publish_status();

        let mut frames = time::interval(self.config.render.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let idle_deadline = self.inactivity.deadline();

            tokio::select! {
                _ = frames.tick() => {
                    self.render_frame(Instant::now());
                    continue;
                }
                command = self.commands.recv() => match command {
                    Some(ViewCommand::Close) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                Some(event) = self.playback_rx.recv() => self.handle_playback(event),
                _ = sleep_until(idle_deadline) => self.on_idle_deadline(Instant::now()),
            }

            self.publish_status();
        }

        self.shutdown();
        Ok(())
    }

    fn handle_command(&mut self, command: ViewCommand) {
        match command {
            ViewCommand::SendText(text) => {
                if text.trim().is_empty() {
                    debug!("Ignoring empty message");
                    return;
                }
                self.request_send(OutgoingMessage::Text(text));
            }
            ViewCommand::SendVoice(wav) => {
                if wav.is_empty() {
                    warn!("Ignoring empty voice recording");
                    return;
                }
                self.request_send(OutgoingMessage::Voice(wav));
            }
            ViewCommand::RecordingStarted => {
                info!("Recording started");
                self.note_activity(Instant::now());
            }
            ViewCommand::Close => {}
        }
    }

    fn request_send(&mut self, message: OutgoingMessage) {
        if self.session.is_active() {
            info!(
                "Send ignored: session {} is still active",
                self.session.current()
            );
            return;
        }
        if self.send_pending {
            info!("Send ignored: previous send still in flight");
            return;
        }

        self.note_activity(Instant::now());
        self.send_pending = true;

        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = backend.send_message(message) => result,
            };
            let _ = events.send(ViewEvent::SendCompleted(result)).await;
        });
    }

    fn handle_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::SendCompleted(result) => {
                self.send_pending = false;
                match result.and_then(|id| self.session.open(&id)) {
                    Ok(lease) => self.start_driver(lease),
                    Err(e) => {
                        error!("Send failed: {}", e);
                        self.turns_completed += 1;
                    }
                }
            }
            ViewEvent::ModelLoaded(Ok(mut model)) => {
                if self.cancel.is_cancelled() {
                    model.dispose();
                    return;
                }
                info!("Avatar model loaded");
                self.lipsync.bind(model.as_ref());
                self.model = Some(model);
                if let Some(request) = self.animation.model_ready() {
                    self.spawn_clip_load(request);
                }
            }
            ViewEvent::ModelLoaded(Err(e)) => {
                error!(
                    "Failed loading avatar model: {}; animation and lip-sync disabled",
                    e
                );
            }
            ViewEvent::ClipLoaded(request, loaded) => {
                self.animation.apply_clip(&request, loaded);
            }
        }
    }

    fn start_driver(&mut self, lease: SessionLease) {
        if let Some(previous) = self.driver.take() {
            warn!(
                "Replacing playback driver of session {}",
                previous.session_id
            );
            previous.handle.abort();
        }

        let session_id = lease.session_id().to_string();
        let stream = SessionStream::new(Arc::clone(&self.backend), lease, &self.config.backend);
        let driver = PlaybackDriver::new(stream, Arc::clone(&self.output), self.playback_tx.clone());
        let handle = tokio::spawn(driver.run(self.cancel.child_token()));

        self.driver = Some(DriverTask { session_id, handle });
    }

    fn is_current_driver(&self, session_id: &str) -> bool {
        self.driver
            .as_ref()
            .map(|d| d.session_id == session_id)
            .unwrap_or(false)
    }

    fn handle_playback(&mut self, event: PlaybackEvent) {
        let now = Instant::now();

        match event {
            PlaybackEvent::SegmentStarted {
                session_id,
                index,
                caption,
                duration,
            } => {
                if !self.is_current_driver(&session_id) {
                    debug!("Ignoring segment from stale session {}", session_id);
                    return;
                }
                info!(
                    "Segment {} playing ({:.1}s): {}",
                    index,
                    duration.as_secs_f32(),
                    caption
                );
                self.note_activity(now);
                self.transition(AnimationState::Talking);
                self.lipsync.start();
                self.playing = Some(PlayingSegment {
                    index,
                    started_at: now,
                    caption,
                });
            }
            PlaybackEvent::SegmentFinished { session_id, index } => {
                if !self.is_current_driver(&session_id) {
                    debug!("Ignoring segment end from stale session {}", session_id);
                    return;
                }
                debug!("Segment {} finished", index);
                self.stop_speaking();
                self.transition(AnimationState::Idle);
                self.note_activity(now);
            }
            PlaybackEvent::StreamEnded {
                session_id,
                end,
                stats,
            } => {
                if !self.is_current_driver(&session_id) {
                    debug!("Ignoring end of stale session {}", session_id);
                    return;
                }
                match end.error() {
                    None => info!(
                        "Session {} complete ({} segments)",
                        session_id, stats.segments_played
                    ),
                    Some(e) => warn!("Session {} abandoned: {}", session_id, e),
                }
                self.driver = None;
                self.turns_completed += 1;
                self.stop_speaking();
                self.transition(AnimationState::Idle);
                self.note_activity(now);
            }
        }
    }

    fn stop_speaking(&mut self) {
        if let Some(segment) = self.playing.take() {
            debug!("Lip-sync off after segment {}", segment.index);
        }
        self.lipsync.stop();
        if let Some(model) = self.model.as_mut() {
            self.lipsync.close_mouth(model.as_mut());
        }
    }

    /// Any user or playback activity: restart the inactivity countdown and
    /// leave the idle pose if it is showing.
    fn note_activity(&mut self, now: Instant) {
        self.inactivity.arm(now);
        if self.animation.state().is_custom_pose() {
            self.transition(AnimationState::Idle);
        }
    }

    fn on_idle_deadline(&mut self, now: Instant) {
        if !self.inactivity.fire(now) {
            return;
        }

        let next = match self.animation.state() {
            AnimationState::Idle => {
                AnimationState::CustomPose(self.config.animation.idle_pose.clone())
            }
            AnimationState::CustomPose(_) => AnimationState::Idle,
            AnimationState::Talking => {
                debug!("Idle toggle skipped while talking");
                return;
            }
        };
        self.transition(next);
    }

    fn transition(&mut self, target: AnimationState) {
        if let Some(request) = self.animation.transition(target) {
            self.spawn_clip_load(request);
        }
    }

    fn spawn_model_load(&self) {
        let assets = Arc::clone(&self.assets);
        let events = self.events_tx.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            let loaded = tokio::select! {
                _ = cancel.cancelled() => return,
                loaded = assets.load_model() => loaded,
            };

            if cancel.is_cancelled() {
                if let Ok(mut model) = loaded {
                    model.dispose();
                }
                return;
            }

            if let Err(returned) = events.send(ViewEvent::ModelLoaded(loaded)).await {
                if let ViewEvent::ModelLoaded(Ok(mut model)) = returned.0 {
                    model.dispose();
                }
            }
        });
    }

    fn spawn_clip_load(&self, request: ClipRequest) {
        let clip_name = request.state.clip_name(&self.config.animation).to_string();
        let assets = Arc::clone(&self.assets);
        let events = self.events_tx.clone();
        let cancel = self.cancel.child_token();

        debug!("Loading clip {} for {}", clip_name, request);

        tokio::spawn(async move {
            let loaded = tokio::select! {
                _ = cancel.cancelled() => return,
                loaded = assets.load_clip(&clip_name) => loaded,
            };
            if cancel.is_cancelled() {
                return;
            }
            let _ = events.send(ViewEvent::ClipLoaded(request, loaded)).await;
        });
    }

    fn render_frame(&mut self, now: Instant) {
        let playback_time = self
            .playing
            .as_ref()
            .map(|p| now.saturating_duration_since(p.started_at).as_secs_f32());

        let frame = self.model.as_deref_mut().map(|model| Frame {
            model,
            animation: &mut self.animation,
            lipsync: &self.lipsync,
            playback_time,
        });

        self.render_loop.tick(now, frame);
    }

    fn publish_status(&self) {
        let status = ViewStatus {
            session_id: self.session.current(),
            animation: self.animation.state().clone(),
            caption: self.playing.as_ref().map(|p| p.caption.clone()),
            speaking: self.playing.is_some(),
            model_loaded: self.model.is_some(),
            idle_toggling: self.inactivity.is_toggling(),
            send_pending: self.send_pending,
            turns_completed: self.turns_completed,
        };

        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    fn shutdown(&mut self) {
        info!("Avatar view closing");

        self.cancel.cancel();
        if let Some(driver) = self.driver.take() {
            debug!("Abandoning playback of session {}", driver.session_id);
            driver.handle.abort();
        }

        self.playing = None;
        self.lipsync.stop();
        self.lipsync.unbind();
        self.animation.stop();
        self.inactivity.disarm();

        if let Some(mut model) = self.model.take() {
            model.dispose();
        }

        self.publish_status();
        info!(
            "Avatar view closed after {} frames",
            self.render_loop.frames()
        );
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
