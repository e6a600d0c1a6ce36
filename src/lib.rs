//! # Tabplay Playback Core
//!
//! The playback core of a touchscreen video player: it takes the packets a
//! demuxing media engine pushes out of an AVI/MJPEG file and turns them into
//! presented frames and PCM, while a touch gesture machine drives
//! play/pause/stop.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `core`: frame buffer pool, completion signal, pipeline statistics
//! - `media`: packet types, decoder and sink traits with software implementations
//! - `engine`: the media engine boundary and a reference MJPEG file engine
//! - `pipeline`: the bounded video hand-off and the audio forwarder
//! - `player`: playback state machine and selection coordinator
//! - `session`: assembles all of the above around one engine
//! - `input`: maps `tab-touch` gestures to playback actions
//! - `config`: configuration, defaults and validation
//!
//! ## Features
//!
//! - **Bounded memory**: a fixed pool of coded-frame buffers; the engine thread
//!   never blocks, frames are dropped instead
//! - **Backpressure on pause**: the decode worker stalls, the producer sheds
//! - **Clean hand-over**: the coordinator waits for end-of-stream before
//!   starting the next selection
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tabplay::{MjpegFileEngine, PlaybackSessionBuilder, PlayerConfig, QueuedSelections};
//!
//! # fn example() -> Result<(), tabplay::PlayerError> {
//! let session = PlaybackSessionBuilder::new(PlayerConfig::default())
//!     .build(MjpegFileEngine::new(25))?;
//!
//! let files = tabplay::library::list_media(Path::new("/sdcard/videos"), &["avi", "mjpeg"])?;
//! let report = session.coordinator().run(&mut QueuedSelections::new(files));
//! println!("played {} files", report.played);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod input;
pub mod library;
pub mod media;
pub mod pipeline;
pub mod player;
pub mod session;

/// Re-export error types for convenience
pub use error::{ErrorSeverity, HasSeverity, PlayerError, PlayerResult, Recoverable, RecoveryStrategy};

pub use config::{FrameLimit, PanelConfig, PlayerConfig};
pub use core::buffer_pool::{FramePool, PooledBuffer};
pub use core::signal::CompletionSignal;
pub use core::stats::{PipelineStats, StatsSnapshot};
pub use engine::{EngineEvents, MediaEngine, MjpegFileEngine};
pub use input::{ControlAction, GestureControls};
pub use player::{
    ChannelSelections, Coordinator, CoordinatorReport, PlaybackController, PlaybackState,
    QueuedSelections, Selection, SelectionSource,
};
pub use session::{PlaybackSession, PlaybackSessionBuilder};

/// Re-export the gesture machine so callers need a single dependency
pub use tab_touch;
