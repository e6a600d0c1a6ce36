//! # Playback Session Assembly
//!
//! Wires a [`MediaEngine`] to the video and audio pipelines and the playback
//! controller. The builder takes the pluggable pieces (decoders and sinks) and
//! fills in software defaults for anything left unset.
//!
//! ```text
//!                 ┌───────────────┐
//!   MediaEngine ─▶│ SessionEvents │──video──▶ VideoProducer ─▶ decode worker ─▶ display
//!                 │   (router)    │──audio──▶ AudioPipeline ─▶ audio sink
//!                 │               │──EOS────▶ PlaybackStatus ─▶ listener + completion
//!                 └───────────────┘
//! ```
//!
//! The router holds plain handles to the pipelines. Nothing in the graph keeps
//! itself alive through its own callbacks; dropping the session stops the
//! engine and joins the decode worker.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use tabplay::{MjpegFileEngine, PlaybackSessionBuilder, PlayerConfig};
//!
//! let session = PlaybackSessionBuilder::new(PlayerConfig::default())
//!     .build(MjpegFileEngine::new(25))?;
//! session.play(Path::new("/sdcard/clip.mjpeg"))?;
//! session.completion().take();
//! println!("{:?}", session.stats());
//! # Ok::<(), tabplay::PlayerError>(())
//! ```

// Standard library imports
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Internal module imports
use crate::config::PlayerConfig;
use crate::core::buffer_pool::FramePool;
use crate::core::signal::CompletionSignal;
use crate::core::stats::{PipelineStats, StatsSnapshot};
use crate::engine::{EngineEvents, MediaEngine};
use crate::error::PlayerResult;
use crate::input::GestureControls;
use crate::media::{
    AudioClock, AudioDecoder, AudioPacket, AudioSink, DisplaySink, FitDisplay, FrameDecoder,
    JpegFrameDecoder, Mp3AudioDecoder, NullAudioSink, NullDisplay, VideoPacket,
};
use crate::pipeline::{AudioPipeline, VideoPipeline, VideoProducer};
use crate::player::{Coordinator, PlaybackController, PlaybackState, PlaybackStatus};

/// Routes engine callbacks to the pipelines.
struct SessionEvents {
    video: VideoProducer,
    audio: Mutex<AudioPipeline>,
    status: Arc<PlaybackStatus>,
}

impl SessionEvents {
    fn audio(&self) -> MutexGuard<'_, AudioPipeline> {
        self.audio.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineEvents for SessionEvents {
    fn on_video(&self, packet: VideoPacket<'_>) {
        // Drops are logged and counted by the producer.
        let _ = self.video.submit(packet);
    }

    fn on_audio(&self, packet: AudioPacket<'_>) {
        let _ = self.audio().submit(packet);
    }

    fn on_clock_change(&self, clock: AudioClock) {
        self.audio().on_clock_change(clock);
    }

    fn on_end_of_stream(&self) {
        self.status.end_of_stream();
    }

    fn on_play_requested(&self, path: &Path) {
        let flushed = self.video.flush();
        if flushed > 0 {
            log::debug!("discarded {} stale frames before {}", flushed, path.display());
        }
    }
}

type ClockListener = Box<dyn FnMut(AudioClock) + Send>;

/// Builder for [`PlaybackSession`].
pub struct PlaybackSessionBuilder {
    config: PlayerConfig,
    frame_decoder: Option<Box<dyn FrameDecoder>>,
    display: Option<Box<dyn DisplaySink>>,
    audio_decoder: Option<Box<dyn AudioDecoder>>,
    audio_sink: Option<Box<dyn AudioSink>>,
    clock_listener: Option<ClockListener>,
}

impl PlaybackSessionBuilder {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            frame_decoder: None,
            display: None,
            audio_decoder: None,
            audio_sink: None,
            clock_listener: None,
        }
    }

    /// Video decoder. Defaults to [`JpegFrameDecoder`].
    pub fn frame_decoder<D: FrameDecoder + 'static>(mut self, decoder: D) -> Self {
        self.frame_decoder = Some(Box::new(decoder));
        self
    }

    /// Display sink. Defaults to [`NullDisplay`]. Wrapped in a [`FitDisplay`]
    /// when the config names a panel.
    pub fn display<S: DisplaySink + 'static>(mut self, display: S) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    /// Audio decoder for compressed audio. Defaults to [`Mp3AudioDecoder`].
    pub fn audio_decoder<D: AudioDecoder + 'static>(mut self, decoder: D) -> Self {
        self.audio_decoder = Some(Box::new(decoder));
        self
    }

    /// Audio sink. Defaults to [`NullAudioSink`].
    pub fn audio_sink<S: AudioSink + 'static>(mut self, sink: S) -> Self {
        self.audio_sink = Some(Box::new(sink));
        self
    }

    /// Called on the engine thread after the audio sink has been reconfigured.
    pub fn on_clock_change<F>(mut self, listener: F) -> Self
    where
        F: FnMut(AudioClock) + Send + 'static,
    {
        self.clock_listener = Some(Box::new(listener));
        self
    }

    /// Validates the config, starts the decode worker and hands `engine` to
    /// a new controller.
    pub fn build<E: MediaEngine>(self, engine: E) -> PlayerResult<PlaybackSession<E>> {
        self.config.validate()?;
        let config = self.config;

        let stats = Arc::new(PipelineStats::new());
        let status = Arc::new(PlaybackStatus::new());
        let pool = FramePool::new(config.pool_capacity, config.coded_buffer_size)?;

        let decoder = self
            .frame_decoder
            .unwrap_or_else(|| Box::new(JpegFrameDecoder::new()));
        let display = self.display.unwrap_or_else(|| Box::new(NullDisplay));
        let display: Box<dyn DisplaySink> = match config.panel {
            Some(panel) => Box::new(FitDisplay::new(display, panel)),
            None => display,
        };

        let video = VideoPipeline::start(
            &config,
            pool,
            decoder,
            display,
            Arc::clone(&status),
            Arc::clone(&stats),
        )?;

        let audio_decoder = match self.audio_decoder {
            Some(decoder) => Some(decoder),
            None => match Mp3AudioDecoder::new() {
                Ok(decoder) => Some(Box::new(decoder) as Box<dyn AudioDecoder>),
                Err(e) => {
                    log::warn!("MP3 audio disabled: {}", e);
                    None
                }
            },
        };
        let audio_sink = self
            .audio_sink
            .unwrap_or_else(|| Box::new(NullAudioSink::default()));
        let mut audio = AudioPipeline::new(&config, audio_decoder, audio_sink, Arc::clone(&stats));
        if let Some(listener) = self.clock_listener {
            audio.set_clock_listener(listener);
        }

        let events: Arc<dyn EngineEvents> = Arc::new(SessionEvents {
            video: video.producer(),
            audio: Mutex::new(audio),
            status: Arc::clone(&status),
        });
        let controller = Arc::new(PlaybackController::with_events(engine, status, events));

        Ok(PlaybackSession {
            controller,
            video,
            stats,
            config,
        })
    }
}

/// A running playback core: controller, pipelines and shared statistics.
pub struct PlaybackSession<E: MediaEngine> {
    // Dropped first so the engine stops feeding the pipeline before the
    // decode worker is joined.
    controller: Arc<PlaybackController<E>>,
    video: VideoPipeline,
    stats: Arc<PipelineStats>,
    config: PlayerConfig,
}

impl<E: MediaEngine> PlaybackSession<E> {
    pub fn controller(&self) -> Arc<PlaybackController<E>> {
        Arc::clone(&self.controller)
    }

    pub fn play(&self, path: &Path) -> PlayerResult<()> {
        self.controller.play(path)
    }

    pub fn stop(&self) -> PlayerResult<()> {
        self.controller.stop()
    }

    pub fn pause(&self) -> bool {
        self.controller.pause()
    }

    pub fn resume(&self) -> bool {
        self.controller.resume()
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn completion(&self) -> CompletionSignal {
        self.controller.completion()
    }

    pub fn set_play_end_listener<F>(&self, listener: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.controller.set_play_end_listener(listener);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn pool(&self) -> &FramePool {
        self.video.pool()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Coordinator driving this session's controller.
    pub fn coordinator(&self) -> Coordinator<E> {
        Coordinator::new(self.controller(), self.config.selection_poll())
    }

    /// Gesture-to-action mapping for this session's controller.
    pub fn gesture_controls(&self) -> GestureControls<E> {
        GestureControls::new(self.controller())
    }
}
