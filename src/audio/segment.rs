use chrono::{DateTime, Utc};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use std::time::Duration;

use crate::error::{AvatarError, Result};

/// One unit of synthesized speech as delivered by a poll response
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Position within the session (0-indexed)
    pub index: usize,
    /// Raw WAV bytes
    pub payload: Vec<u8>,
    /// Subtitle text for this segment
    pub caption: String,
    /// Whether the server reported more segments may follow
    pub has_more: bool,
    pub received_at: DateTime<Utc>,
}

impl AudioSegment {
    /// Build a segment from the hex string carried in a fetch response.
    ///
    /// Empty payloads are rejected as a decode failure.
    pub fn from_hex(index: usize, audio_hex: &str, caption: String, has_more: bool) -> Result<Self> {
        let payload = hex::decode(audio_hex.trim())?;
        if payload.is_empty() {
            return Err(AvatarError::DecodeFailure("Empty audio payload".to_string()));
        }

        Ok(Self {
            index,
            payload,
            caption,
            has_more,
            received_at: Utc::now(),
        })
    }

    /// Decode the WAV payload into playable PCM
    pub fn decode(&self) -> Result<PcmClip> {
        PcmClip::from_wav_bytes(&self.payload)
    }
}

/// Decoded 16-bit PCM audio, interleaved
#[derive(Debug, Clone, PartialEq)]
pub struct PcmClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmClip {
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(AvatarError::DecodeFailure(format!(
                "Unsupported WAV format: {}Hz, {} channels",
                spec.sample_rate, spec.channels
            )));
        }

        let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, bits) if bits <= 16 => {
                let shift = 16 - bits;
                reader
                    .into_samples::<i16>()
                    .map(|s| s.map(|v| v << shift))
                    .collect::<std::result::Result<_, _>>()?
            }
            (SampleFormat::Int, bits) => {
                let shift = bits - 16;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| (v >> shift) as i16))
                    .collect::<std::result::Result<_, _>>()?
            }
            (SampleFormat::Float, _) => reader
                .into_samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect::<std::result::Result<_, _>>()?,
        };

        if samples.is_empty() {
            return Err(AvatarError::DecodeFailure("WAV contains no samples".to_string()));
        }

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// Encode back into a 16-bit WAV file
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }

        Ok(cursor.into_inner())
    }

    /// Playback length
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }
}
