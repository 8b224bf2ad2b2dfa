pub mod animation;
pub mod audio;
pub mod backend;
pub mod config;
pub mod error;
pub mod headless;
pub mod inactivity;
pub mod lipsync;
pub mod session;
pub mod view;

pub use animation::{AnimationClip, AnimationMixer, AnimationState, AnimationStateMachine, ClipRequest};
pub use audio::{AudioOutput, AudioSegment, PcmClip, PlaybackDriver, PlaybackEvent};
pub use backend::{ChatBackend, FetchResponse, HttpBackend, OutgoingMessage};
pub use config::Config;
pub use error::{AvatarError, Result};
pub use inactivity::{InactivityMonitor, InactivityPhase};
pub use lipsync::{LipSyncDriver, MorphTargets, MouthShape};
pub use session::{SessionLease, SessionSlot, SessionStats, SessionStream, StreamEnd, StreamItem};
pub use view::{
    AssetLoader, AvatarHandle, AvatarModel, AvatarView, Collaborators, SceneRenderer, ViewCommand,
    ViewStatus,
};
