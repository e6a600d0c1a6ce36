// # Pipeline Statistics Module
//
// Counters describing what the video and audio paths did with each packet,
// including every drop. They are the observable side of the drop-on-full
// policy: a frame the producer sheds is counted, not just logged.
//
// ## Key Metrics
//
// - **Received / queued**: packets offered by the engine and handed to the decoder
// - **Dropped**: split by cause (pool exhausted, unsupported, oversize)
// - **Decoded / presented**: decode worker throughput
// - **Audio**: forwarded packets, decode errors, clock changes

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Shared atomic counters, updated from the engine and decode threads.
///
/// Wrap in an `Arc` and hand a clone to each component.
#[derive(Debug, Default)]
pub struct PipelineStats {
    video_received: AtomicU64,
    video_queued: AtomicU64,
    dropped_pool_exhausted: AtomicU64,
    dropped_unsupported: AtomicU64,
    dropped_oversize: AtomicU64,
    decoded: AtomicU64,
    decode_failures: AtomicU64,
    presented: AtomicU64,
    present_failures: AtomicU64,
    flushed: AtomicU64,
    audio_forwarded: AtomicU64,
    audio_decode_errors: AtomicU64,
    audio_dropped_unsupported: AtomicU64,
    clock_changes: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub video_received: u64,
    pub video_queued: u64,
    pub dropped_pool_exhausted: u64,
    pub dropped_unsupported: u64,
    pub dropped_oversize: u64,
    pub decoded: u64,
    pub decode_failures: u64,
    pub presented: u64,
    pub present_failures: u64,
    pub flushed: u64,
    pub audio_forwarded: u64,
    pub audio_decode_errors: u64,
    pub audio_dropped_unsupported: u64,
    pub clock_changes: u64,
}

impl StatsSnapshot {
    /// Video frames the producer shed before they reached the decoder.
    pub fn video_dropped(&self) -> u64 {
        self.dropped_pool_exhausted + self.dropped_unsupported + self.dropped_oversize
    }
}

macro_rules! counters {
    ($($field:ident => $incr:ident),* $(,)?) => {
        impl PipelineStats {
            $(
                pub fn $incr(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }
            )*

            /// Reads every counter.
            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $($field: self.$field.load(Ordering::Relaxed),)*
                }
            }
        }
    };
}

counters! {
    video_received => record_video_received,
    video_queued => record_video_queued,
    dropped_pool_exhausted => record_pool_exhausted,
    dropped_unsupported => record_unsupported,
    dropped_oversize => record_oversize,
    decoded => record_decoded,
    decode_failures => record_decode_failure,
    presented => record_presented,
    present_failures => record_present_failure,
    flushed => record_flushed,
    audio_forwarded => record_audio_forwarded,
    audio_decode_errors => record_audio_decode_error,
    audio_dropped_unsupported => record_audio_unsupported,
    clock_changes => record_clock_change,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Counts presented frames and logs the rate once per elapsed second.
#[derive(Debug)]
pub struct FpsMeter {
    window_start: Instant,
    frames: u32,
    window: Duration,
    last_fps: f32,
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            window,
            last_fps: 0.0,
        }
    }

    /// Records one presented frame. Returns the rate when a window closes.
    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        log::info!("FPS: {:.1}", fps);
        self.last_fps = fps;
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }

    pub fn last_fps(&self) -> f32 {
        self.last_fps
    }
}
