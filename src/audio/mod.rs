pub mod output;
pub mod playback;
pub mod segment;

pub use output::AudioOutput;
pub use playback::{PlaybackDriver, PlaybackEvent};
pub use segment::{AudioSegment, PcmClip};
