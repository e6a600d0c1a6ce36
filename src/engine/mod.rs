//! # Media Engine Boundary
//!
//! The media engine demuxes a file and pushes packets into the playback core
//! from its own thread. The core talks to it through two traits:
//!
//! ```text
//! ┌────────────────────┐ play(path, events) ┌────────────────────┐
//! │ PlaybackController │───────────────────▶│    MediaEngine     │
//! │                    │ stop()             │  (engine thread)   │
//! └────────────────────┘                    └─────────┬──────────┘
//!                                                     │ on_video / on_audio
//!                                                     │ on_clock_change
//!                                                     ▼ on_end_of_stream
//!                                           ┌────────────────────┐
//!                                           │    EngineEvents    │
//!                                           │  (session router)  │
//!                                           └────────────────────┘
//! ```
//!
//! Callbacks are invoked synchronously on the engine thread. Packets borrow
//! engine memory only for the duration of the call.

use std::path::Path;
use std::sync::Arc;

use crate::error::PlayerResult;
use crate::media::{AudioClock, AudioPacket, VideoPacket};

pub mod mjpeg_file;

pub use mjpeg_file::MjpegFileEngine;

/// Receiver of everything a playing engine produces.
pub trait EngineEvents: Send + Sync {
    fn on_video(&self, packet: VideoPacket<'_>);

    fn on_audio(&self, packet: AudioPacket<'_>);

    /// New audio format; delivered before any audio packet in that format.
    fn on_clock_change(&self, clock: AudioClock);

    /// The stream has ended or was stopped. Delivered once per successful `play`.
    fn on_end_of_stream(&self);

    /// Called by the controller right before a new `play` starts.
    fn on_play_requested(&self, _path: &Path) {}
}

/// A demuxing engine that plays one file at a time.
pub trait MediaEngine: Send {
    /// Starts playing `path`, delivering packets to `events`.
    ///
    /// Fails with `EngineIo` when the file cannot be opened or played; no
    /// callback is invoked in that case.
    fn play(&mut self, path: &Path, events: Arc<dyn EngineEvents>) -> PlayerResult<()>;

    /// Asks the engine to halt. Returns without waiting; the engine then
    /// delivers end-of-stream from its own thread.
    fn stop(&mut self) -> PlayerResult<()>;
}

impl<E: MediaEngine + ?Sized> MediaEngine for Box<E> {
    fn play(&mut self, path: &Path, events: Arc<dyn EngineEvents>) -> PlayerResult<()> {
        (**self).play(path, events)
    }

    fn stop(&mut self) -> PlayerResult<()> {
        (**self).stop()
    }
}
