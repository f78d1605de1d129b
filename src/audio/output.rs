use std::sync::{Mutex, PoisonError};

use rodio::mixer::Mixer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, info, warn};

use super::types::{Output, SampleSource};
use crate::config::AudioSettings;
use crate::error::AudioError;

/// The opened output device.
///
/// `OutputStream` is tied to the thread that opened it, so the runtime keeps
/// this value alive on the main thread and hands the engine a [`RodioOutput`]
/// that only holds the mixer.
pub struct AudioDevice {
    stream: OutputStream,
    sample_rate: u32,
}

impl AudioDevice {
    pub fn open(settings: &AudioSettings) -> Result<Self, AudioError> {
        let buffer_frames = settings.sample_rate.saturating_mul(settings.buffer_ms) / 1000;
        let configured = OutputStreamBuilder::from_default_device().and_then(|builder| {
            builder
                .with_sample_rate(settings.sample_rate)
                .with_buffer_size(rodio::cpal::BufferSize::Fixed(buffer_frames))
                .open_stream()
        });

        let (mut stream, sample_rate) = match configured {
            Ok(stream) => (stream, settings.sample_rate),
            Err(err) => {
                warn!(
                    error = %err,
                    sample_rate = settings.sample_rate,
                    "configured output unavailable, using device defaults"
                );
                let stream = OutputStreamBuilder::open_default_stream()
                    .map_err(|e| AudioError::Device(e.to_string()))?;
                let rate = stream.config().sample_rate();
                (stream, rate)
            }
        };
        // rodio logs to stderr when the stream is dropped, which tears the TUI.
        stream.log_on_drop(false);
        info!(sample_rate, buffer_frames, "audio output opened");

        Ok(Self {
            stream,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn output(&self) -> RodioOutput {
        RodioOutput::new(self.stream.mixer().clone(), self.sample_rate)
    }
}

struct OutputState {
    sink: Option<Sink>,
    gain: f32,
    paused: bool,
}

/// [`Output`] over a rodio mixer. Each song gets a fresh sink so clearing
/// never races a half-drained queue.
pub struct RodioOutput {
    mixer: Mixer,
    sample_rate: u32,
    state: Mutex<OutputState>,
}

impl RodioOutput {
    pub fn new(mixer: Mixer, sample_rate: u32) -> Self {
        Self {
            mixer,
            sample_rate,
            state: Mutex::new(OutputState {
                sink: None,
                gain: 1.0,
                paused: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OutputState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Output for RodioOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self, source: SampleSource) -> Result<(), AudioError> {
        let mut state = self.lock();
        if let Some(old) = state.sink.take() {
            old.stop();
        }
        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(state.gain);
        sink.append(source);
        sink.play();
        state.sink = Some(sink);
        state.paused = false;
        Ok(())
    }

    fn clear(&self) {
        let mut state = self.lock();
        if let Some(sink) = state.sink.take() {
            sink.stop();
            debug!("output cleared");
        }
    }

    fn set_paused(&self, paused: bool) {
        let mut state = self.lock();
        state.paused = paused;
        if let Some(sink) = &state.sink {
            if paused {
                sink.pause();
            } else {
                sink.play();
            }
        }
    }

    fn set_gain(&self, gain: f32) {
        let mut state = self.lock();
        state.gain = gain;
        if let Some(sink) = &state.sink {
            sink.set_volume(gain);
        }
    }
}
