//! rodio-backed decoding with a frame-accurate control handle.
//!
//! rodio hands the decoded source to the mixer thread, so the engine can no
//! longer call into it once playback starts. [`TrackedSource`] wraps the
//! decoder and shares a few atomics with [`TrackedStream`], which is what the
//! engine keeps: the source counts frames as the device pulls samples, applies
//! seeks requested through the handle and stops producing once closed.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use lofty::file::AudioFile;
use rodio::Source;
use tracing::{debug, warn};

use super::types::{Decode, Decoded, FrameStream, StreamFormat, duration_to_frames, frames_to_duration};
use crate::error::AudioError;

const NO_SEEK: u64 = u64::MAX;

#[derive(Debug)]
struct Shared {
    frames: AtomicU64,
    pending_seek: AtomicU64,
    closed: AtomicBool,
    finished: AtomicBool,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            frames: AtomicU64::new(0),
            pending_seek: AtomicU64::new(NO_SEEK),
            closed: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        }
    }
}

/// Decodes files with rodio's built-in decoders.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioDecoder;

impl Decode for RodioDecoder {
    fn decode(&self, path: &Path) -> Result<Decoded, AudioError> {
        let file = File::open(path).map_err(|source| AudioError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = rodio::Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let sample_rate = decoder.sample_rate();
        let channels = decoder.channels();
        if sample_rate == 0 || channels == 0 {
            return Err(AudioError::Decode {
                path: path.to_path_buf(),
                reason: "stream has no sample rate or channels".into(),
            });
        }

        let duration = decoder.total_duration().or_else(|| probe_duration(path));
        let total_frames = duration.map_or(0, |d| duration_to_frames(d, sample_rate));
        if total_frames == 0 {
            warn!(path = %path.display(), "stream length unknown");
        }
        debug!(path = %path.display(), sample_rate, channels, total_frames, "decoded");

        let shared = Arc::new(Shared::default());
        let source = TrackedSource::new(decoder, shared.clone());
        Ok(Decoded {
            stream: Box::new(TrackedStream {
                shared,
                len: total_frames,
            }),
            source: Box::new(source),
            format: StreamFormat {
                sample_rate,
                channels,
                total_frames,
            },
        })
    }
}

/// Some containers (VBR mp3 without a header) don't report a length to rodio.
fn probe_duration(path: &Path) -> Option<Duration> {
    let tagged = lofty::read_from_path(path).ok()?;
    let duration = tagged.properties().duration();
    (!duration.is_zero()).then_some(duration)
}

/// Control handle paired with a [`TrackedSource`].
#[derive(Debug)]
pub struct TrackedStream {
    shared: Arc<Shared>,
    len: u64,
}

impl FrameStream for TrackedStream {
    fn position(&self) -> u64 {
        self.shared.frames.load(Ordering::Acquire)
    }

    fn seek(&mut self, frame: u64) -> Result<(), AudioError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(AudioError::Closed);
        }
        // Applied by the source on its next sample. Position moves now so
        // progress reports don't lag behind the request; the source puts it
        // back if the decoder cannot seek.
        self.shared.pending_seek.store(frame, Ordering::Release);
        self.shared.frames.store(frame, Ordering::Release);
        self.shared.finished.store(false, Ordering::Release);
        Ok(())
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn close(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    fn is_finished(&self) -> bool {
        if self.shared.finished.load(Ordering::Acquire) {
            return true;
        }
        self.len > 0 && self.position().saturating_add(1) >= self.len
    }
}

/// Sample source that reports its progress to a [`TrackedStream`].
pub struct TrackedSource<S> {
    inner: S,
    shared: Arc<Shared>,
    /// Samples of the current frame already yielded.
    in_frame: u16,
    /// Frames actually pulled from `inner`. `shared.frames` may run ahead of
    /// this while a requested seek is pending.
    played: u64,
}

impl<S: Source> TrackedSource<S> {
    fn new(inner: S, shared: Arc<Shared>) -> Self {
        Self {
            inner,
            shared,
            in_frame: 0,
            played: 0,
        }
    }

    fn apply_pending_seek(&mut self) {
        let frame = self.shared.pending_seek.swap(NO_SEEK, Ordering::AcqRel);
        if frame == NO_SEEK {
            return;
        }
        let target = frames_to_duration(frame, self.inner.sample_rate());
        match self.inner.try_seek(target) {
            Ok(()) => {
                self.played = frame;
                self.in_frame = 0;
            }
            Err(err) => {
                // The decoder did not move; report where it really is.
                warn!(error = %err, frame, played = self.played, "seek failed");
                self.shared.frames.store(self.played, Ordering::Release);
            }
        }
    }
}

impl<S: Source> Iterator for TrackedSource<S> {
    type Item = rodio::Sample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.shared.closed.load(Ordering::Acquire) {
            return None;
        }
        self.apply_pending_seek();

        let Some(sample) = self.inner.next() else {
            self.shared.finished.store(true, Ordering::Release);
            return None;
        };

        let channels = self.inner.channels().max(1);
        self.in_frame += 1;
        if self.in_frame >= channels {
            self.in_frame = 0;
            self.played += 1;
            self.shared.frames.store(self.played, Ordering::Release);
        }
        Some(sample)
    }
}

impl<S: Source> Source for TrackedSource<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> rodio::ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), rodio::source::SeekError> {
        self.inner.try_seek(pos)?;
        let frame = duration_to_frames(pos, self.inner.sample_rate());
        self.played = frame;
        self.shared.frames.store(frame, Ordering::Release);
        self.shared.finished.store(false, Ordering::Release);
        self.in_frame = 0;
        Ok(())
    }
}

#[cfg(test)]
pub(super) fn tracked<S: Source>(inner: S, len: u64) -> (TrackedStream, TrackedSource<S>) {
    let shared = Arc::new(Shared::default());
    (
        TrackedStream {
            shared: shared.clone(),
            len,
        },
        TrackedSource::new(inner, shared),
    )
}
