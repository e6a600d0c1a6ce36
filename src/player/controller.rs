//! # Playback Controller
//!
//! Owns the `Stopped / Playing / Paused` state machine and drives the media
//! engine.
//!
//! ```text
//!            play(path) ok
//!   Stopped ───────────────▶ Playing ◀──── resume() ────┐
//!      ▲                        │                        │
//!      │ stop() / end-of-stream │ pause()                │
//!      │                        ▼                        │
//!      └──────────────────── Paused ─────────────────────┘
//! ```
//!
//! State lives in [`PlaybackStatus`], shared by the controller, the decode
//! worker (which stalls while paused) and the engine's end-of-stream callback.
//! End-of-stream always moves to `Stopped`, runs the play-end listener and
//! gives the completion signal the coordinator waits on.

// Standard library imports
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// Internal module imports
use crate::core::signal::CompletionSignal;
use crate::engine::{EngineEvents, MediaEngine};
use crate::error::PlayerResult;
use crate::media::{AudioClock, AudioPacket, VideoPacket};

/// How long `play` waits for a previous stream's end-of-stream.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlaybackState {
    Stopped = 0,
    Playing = 1,
    Paused = 2,
}

impl PlaybackState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Paused,
            _ => PlaybackState::Stopped,
        }
    }
}

type EndListener = Box<dyn FnMut() + Send>;

/// Playback state shared across threads.
pub struct PlaybackStatus {
    state: AtomicU8,
    /// An engine stream was started and has not delivered end-of-stream yet.
    active: AtomicBool,
    end_listener: Mutex<Option<EndListener>>,
    completion: CompletionSignal,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackStatus {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(PlaybackState::Stopped as u8),
            active: AtomicBool::new(false),
            end_listener: Mutex::new(None),
            completion: CompletionSignal::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_paused(&self) -> bool {
        self.state() == PlaybackState::Paused
    }

    pub(crate) fn set(&self, state: PlaybackState) -> PlaybackState {
        PlaybackState::from_u8(self.state.swap(state as u8, Ordering::AcqRel))
    }

    fn transition(&self, from: PlaybackState, to: PlaybackState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Replaces the play-end listener. It runs on the engine thread.
    pub fn set_play_end_listener<F>(&self, listener: F)
    where
        F: FnMut() + Send + 'static,
    {
        *self.listener_slot() = Some(Box::new(listener));
    }

    /// Handle to the signal given on every end-of-stream.
    pub fn completion(&self) -> CompletionSignal {
        self.completion.clone()
    }

    /// Handles the engine's end-of-stream notification.
    pub fn end_of_stream(&self) {
        let previous = self.set(PlaybackState::Stopped);
        self.active.store(false, Ordering::Release);
        log::info!("end of stream ({:?} -> Stopped)", previous);
        if let Some(listener) = self.listener_slot().as_mut() {
            listener();
        }
        self.completion.give();
    }

    fn listener_slot(&self) -> MutexGuard<'_, Option<EndListener>> {
        self.end_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineEvents for PlaybackStatus {
    fn on_video(&self, _packet: VideoPacket<'_>) {}

    fn on_audio(&self, _packet: AudioPacket<'_>) {}

    fn on_clock_change(&self, _clock: AudioClock) {}

    fn on_end_of_stream(&self) {
        self.end_of_stream();
    }
}

/// Play/pause/stop front end of a [`MediaEngine`].
///
/// All methods take `&self`; share the controller behind an `Arc` between the
/// coordinator and the touch listener.
pub struct PlaybackController<E> {
    engine: Mutex<E>,
    status: Arc<PlaybackStatus>,
    events: Arc<dyn EngineEvents>,
}

impl<E: MediaEngine> PlaybackController<E> {
    /// Controller that only tracks end-of-stream; packets go nowhere.
    pub fn new(engine: E) -> Self {
        let status = Arc::new(PlaybackStatus::new());
        let events: Arc<dyn EngineEvents> = status.clone();
        Self::with_events(engine, status, events)
    }

    /// Controller whose engine delivers to `events`.
    ///
    /// `events` must forward end-of-stream to `status.end_of_stream()`.
    pub fn with_events(engine: E, status: Arc<PlaybackStatus>, events: Arc<dyn EngineEvents>) -> Self {
        Self {
            engine: Mutex::new(engine),
            status,
            events,
        }
    }

    fn engine(&self) -> MutexGuard<'_, E> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts playing `path`.
    ///
    /// A stream that is still running is stopped first and allowed to drain.
    /// Fails with `EngineIo` if the engine cannot open the file; the state is
    /// then `Stopped`.
    pub fn play(&self, path: &Path) -> PlayerResult<()> {
        if self.status.active.load(Ordering::Acquire) {
            if self.status.set(PlaybackState::Stopped) != PlaybackState::Stopped {
                log::info!("stopping current stream before {}", path.display());
            }
            self.engine().stop()?;
            // The engine lock is not held while draining.
            if !self.status.completion.take_timeout(DRAIN_TIMEOUT) {
                log::warn!("previous stream did not end within {:?}", DRAIN_TIMEOUT);
            }
        }

        let mut engine = self.engine();
        self.status.completion.reset();
        self.events.on_play_requested(path);
        // Playing before the engine starts, so an immediate end-of-stream wins.
        self.status.set(PlaybackState::Playing);
        self.status.active.store(true, Ordering::Release);

        match engine.play(path, Arc::clone(&self.events)) {
            Ok(()) => {
                log::info!("Stopped -> Playing: {}", path.display());
                Ok(())
            }
            Err(e) => {
                self.status.active.store(false, Ordering::Release);
                self.status.set(PlaybackState::Stopped);
                Err(e)
            }
        }
    }

    /// Halts playback. No-op when already stopped.
    ///
    /// Returns without waiting for the engine's end-of-stream.
    pub fn stop(&self) -> PlayerResult<()> {
        let previous = self.status.set(PlaybackState::Stopped);
        if previous == PlaybackState::Stopped {
            return Ok(());
        }
        log::info!("{:?} -> Stopped", previous);
        self.engine().stop()
    }

    /// `Playing -> Paused`. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        let changed = self
            .status
            .transition(PlaybackState::Playing, PlaybackState::Paused);
        if changed {
            log::info!("Playing -> Paused");
        }
        changed
    }

    /// `Paused -> Playing`. Returns whether the state changed.
    pub fn resume(&self) -> bool {
        let changed = self
            .status
            .transition(PlaybackState::Paused, PlaybackState::Playing);
        if changed {
            log::info!("Paused -> Playing");
        }
        changed
    }

    /// Pauses when playing, resumes when paused. Returns the resulting state.
    pub fn toggle_pause(&self) -> PlaybackState {
        if !self.pause() {
            self.resume();
        }
        self.state()
    }

    pub fn state(&self) -> PlaybackState {
        self.status.state()
    }

    pub fn set_play_end_listener<F>(&self, listener: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.status.set_play_end_listener(listener);
    }

    pub fn completion(&self) -> CompletionSignal {
        self.status.completion()
    }

    pub fn status(&self) -> Arc<PlaybackStatus> {
        Arc::clone(&self.status)
    }
}
