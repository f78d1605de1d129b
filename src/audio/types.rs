//! Collaborator contracts the playback engine drives.
//!
//! The engine never touches rodio directly: it decodes through [`Decode`],
//! controls a loaded song through [`FrameStream`], converts rates through
//! [`Resample`] and hands samples to the device through [`Output`].

use std::path::Path;
use std::time::Duration;

use crate::error::AudioError;

/// Decoded sample data ready to be handed to the device.
pub type SampleSource = Box<dyn rodio::Source + Send>;

/// Native format of a decoded stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Total length in frames, `0` when the container does not say.
    pub total_frames: u64,
}

impl StreamFormat {
    pub fn frames_to_duration(&self, frames: u64) -> Duration {
        frames_to_duration(frames, self.sample_rate)
    }
}

pub fn frames_to_duration(frames: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let rate = u64::from(sample_rate);
    let secs = frames / rate;
    let rem = frames % rate;
    Duration::from_secs(secs) + Duration::from_nanos(rem * 1_000_000_000 / rate)
}

pub fn duration_to_frames(d: Duration, sample_rate: u32) -> u64 {
    (d.as_nanos() * u128::from(sample_rate) / 1_000_000_000) as u64
}

/// Control handle of a loaded song. Positions are frame indices at the
/// stream's native rate.
pub trait FrameStream: Send + Sync {
    fn position(&self) -> u64;

    fn seek(&mut self, frame: u64) -> Result<(), AudioError>;

    /// Total frames, `0` when unknown.
    fn len(&self) -> u64;

    /// Stop producing samples. Idempotent.
    fn close(&mut self);

    /// Whether the sample data has been played out.
    fn is_finished(&self) -> bool {
        let len = self.len();
        len > 0 && self.position().saturating_add(1) >= len
    }
}

/// A successful decode: the control handle, the samples it controls and their format.
pub struct Decoded {
    pub stream: Box<dyn FrameStream>,
    pub source: SampleSource,
    pub format: StreamFormat,
}

pub trait Decode: Send + Sync {
    /// Open and decode `path`. Unsupported or corrupt files are errors.
    fn decode(&self, path: &Path) -> Result<Decoded, AudioError>;
}

pub trait Resample: Send + Sync {
    fn resample(&self, quality: u8, from: u32, to: u32, source: SampleSource) -> SampleSource;
}

/// The process-wide output device. Each method takes the device lock for the
/// duration of the change.
pub trait Output: Send + Sync {
    /// Rate the device was configured with.
    fn sample_rate(&self) -> u32;

    /// Start playing `source`, replacing whatever was playing.
    fn play(&self, source: SampleSource) -> Result<(), AudioError>;

    /// Stop and discard everything queued.
    fn clear(&self);

    fn set_paused(&self, paused: bool);

    /// Amplitude multiplier, see [`super::gain::volume_to_gain`].
    fn set_gain(&self, gain: f32);
}
