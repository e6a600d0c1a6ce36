//! # Media Boundary Module
//!
//! Types and traits at the edge of the playback core: the packets the media
//! engine delivers, the decoders that turn them into pixels and PCM, and the
//! sinks that consume the result.

pub mod decoder;
pub mod sink;
pub mod types;

pub use decoder::{AudioDecoder, FrameDecoder, JpegFrameDecoder, Mp3AudioDecoder};
pub use sink::{
    AudioSink, DisplaySink, FitDisplay, NullAudioSink, NullDisplay, SnapshotDisplay, WavAudioSink,
};
pub use types::{AudioClock, AudioCodec, AudioPacket, RgbFrame, Size, VideoCodec, VideoPacket};
