//! Audio collaborators: decoding, the output device, rate conversion and the
//! volume curve.

mod decode;
mod gain;
mod output;
mod resample;
mod types;

pub use decode::RodioDecoder;
pub use gain::volume_to_gain;
pub use output::{AudioDevice, RodioOutput};
pub use resample::RodioResampler;
pub use types::{
    Decode, Decoded, FrameStream, Output, Resample, SampleSource, StreamFormat,
    duration_to_frames, frames_to_duration,
};
