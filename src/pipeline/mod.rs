//! # Pipeline Module
//!
//! The two packet paths out of the media engine.
//!
//! - [`video`]: bounded, drop-on-full hand-off to the decode worker
//! - [`audio`]: synchronous decode-and-forward on the engine thread

pub mod audio;
pub mod video;

pub use audio::AudioPipeline;
pub use video::{FrameDescriptor, VideoPipeline, VideoProducer};
