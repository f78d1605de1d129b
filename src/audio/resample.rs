use rodio::source::UniformSourceIterator;
use tracing::debug;

use super::types::{Resample, SampleSource};

/// Converts sample rate with rodio's built-in converter.
///
/// rodio has a single interpolation algorithm, so `quality` is accepted for
/// the trait's sake and only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioResampler;

impl Resample for RodioResampler {
    fn resample(&self, quality: u8, from: u32, to: u32, source: SampleSource) -> SampleSource {
        debug!(quality, from, to, "resampling stream");
        let channels = source.channels();
        Box::new(UniformSourceIterator::new(source, channels, to))
    }
}
