//! # Video Pipeline
//!
//! Moves coded frames from the engine callback to a dedicated decode worker
//! without ever blocking the engine.
//!
//! ```text
//!  engine thread                               "video-decode" thread
//!  ┌──────────────┐  FrameDescriptor  ┌─────────┐   ┌──────────────┐
//!  │VideoProducer │ ────────────────▶ │ channel │ ─▶│ DecodeWorker │─▶ DisplaySink
//!  │  try_acquire │   (bounded, 4)    └─────────┘   │ decode, drop │
//!  └──────┬───────┘                                 │ buffer early │
//!         │ PooledBuffer                            └──────┬───────┘
//!         ▼                                                │ Drop
//!     FramePool  ◀─────────────────────────────────────────┘
//! ```
//!
//! ## Drop Policy
//!
//! The producer takes a buffer with a zero timeout. When none is free the
//! frame is dropped and counted; the engine thread never waits. A frame
//! that does not fit a buffer, or that is not MJPEG, is dropped the same way.
//!
//! ## Pause
//!
//! While the playback state is `Paused` the worker stops taking frames off the
//! channel and re-presents its last good frame every `pause_poll_ms`. A frame
//! received just as the pause began is held, undecoded, until playback
//! resumes. The channel fills, the pool runs dry and the producer starts
//! dropping. Nothing queues up without bound.
//!
//! Otherwise the worker sleeps in a blocking receive. Dropping the
//! [`VideoPipeline`] closes its shutdown channel, which wakes and ends it.

// Standard library imports
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// External crate imports
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded, select};

// Internal module imports
use crate::config::PlayerConfig;
use crate::core::buffer_pool::{FramePool, PooledBuffer};
use crate::core::stats::{FpsMeter, PipelineStats};
use crate::error::{PlayerError, PlayerResult};
use crate::media::{DisplaySink, FrameDecoder, RgbFrame, Size, VideoCodec, VideoPacket};
use crate::player::PlaybackStatus;

/// One queued coded frame. Owns its pool buffer; dropping it returns the buffer.
#[derive(Debug)]
pub struct FrameDescriptor {
    pub buffer: PooledBuffer,
    /// Dimensions declared by the container.
    pub size: Size,
}

/// Engine-side half of the pipeline. Cheap to clone.
#[derive(Clone)]
pub struct VideoProducer {
    pool: FramePool,
    tx: Sender<FrameDescriptor>,
    drain: Receiver<FrameDescriptor>,
    stats: Arc<PipelineStats>,
    worker_exited: Arc<AtomicBool>,
}

impl VideoProducer {
    /// Queues one coded frame for decoding without blocking.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the frame was queued. Every error means the frame was
    /// dropped and counted:
    ///
    /// - `UnsupportedFormat` for anything but MJPEG
    /// - `PoolExhausted` when no buffer is free
    /// - `FrameTooLarge` when the payload exceeds a buffer
    /// - `Init` when the decode worker is no longer running
    pub fn submit(&self, packet: VideoPacket<'_>) -> PlayerResult<()> {
        self.stats.record_video_received();

        if self.worker_exited.load(Ordering::Acquire) {
            return Err(self.worker_gone());
        }

        if packet.codec != VideoCodec::Mjpeg {
            self.stats.record_unsupported();
            log::error!("Unsupported video format: {}", packet.codec);
            return Err(PlayerError::unsupported_video(packet.codec.to_string()));
        }

        let Some(mut buffer) = self.pool.try_acquire() else {
            self.stats.record_pool_exhausted();
            log::warn!(
                "Frame dropped: no free buffer ({} of {} in flight)",
                self.pool.outstanding(),
                self.pool.capacity()
            );
            return Err(PlayerError::PoolExhausted);
        };

        if let Err(e) = buffer.fill_from(packet.data) {
            self.stats.record_oversize();
            log::warn!("Frame dropped: {}", e);
            return Err(e);
        }

        let descriptor = FrameDescriptor {
            buffer,
            size: packet.size,
        };
        match self.tx.try_send(descriptor) {
            Ok(()) => {
                self.stats.record_video_queued();
                Ok(())
            }
            // Unreachable while channel_capacity >= pool_capacity, which
            // `PlayerConfig::validate` and `VideoPipeline::start` enforce:
            // every queued frame holds a pool buffer.
            Err(TrySendError::Full(_)) => {
                self.stats.record_pool_exhausted();
                log::warn!("Frame dropped: decode queue full");
                Err(PlayerError::PoolExhausted)
            }
            Err(TrySendError::Disconnected(_)) => Err(self.worker_gone()),
        }
    }

    fn worker_gone(&self) -> PlayerError {
        log::warn!("Frame dropped: decode worker has exited");
        PlayerError::init("video pipeline", "decode worker has exited")
    }

    /// Discards every queued frame, returning their buffers. Returns the count.
    pub fn flush(&self) -> usize {
        let mut flushed = 0;
        while let Ok(descriptor) = self.drain.try_recv() {
            drop(descriptor);
            self.stats.record_flushed();
            flushed += 1;
        }
        if flushed > 0 {
            log::debug!("flushed {} queued frames", flushed);
        }
        flushed
    }

    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    /// Frames waiting for the decode worker.
    pub fn queued(&self) -> usize {
        self.tx.len()
    }
}

/// Consumer side: decode, release the coded buffer, present.
struct DecodeWorker<D, S> {
    rx: Receiver<FrameDescriptor>,
    shutdown: Receiver<()>,
    decoder: D,
    display: S,
    /// Last good frame, re-presented while paused.
    frame: RgbFrame,
    /// Decode target; swapped into `frame` on success.
    scratch: RgbFrame,
    has_frame: bool,
    status: Arc<PlaybackStatus>,
    stats: Arc<PipelineStats>,
    fps: FpsMeter,
    pause_poll: Duration,
    exited: Arc<AtomicBool>,
}

impl<D: FrameDecoder, S: DisplaySink> DecodeWorker<D, S> {
    fn run(mut self) {
        log::debug!("decode worker started");
        while self.hold_while_paused() {
            let received = select! {
                recv(self.rx) -> msg => msg.ok(),
                recv(self.shutdown) -> _ => None,
            };
            let Some(descriptor) = received else {
                break;
            };
            if !self.hold_while_paused() {
                break;
            }
            self.handle(descriptor);
        }
        log::debug!("decode worker stopped");
    }

    /// Re-presents the last good frame until the state leaves `Paused`.
    /// Returns `false` once the pipeline is shutting down.
    fn hold_while_paused(&mut self) -> bool {
        while self.status.is_paused() {
            if !matches!(
                self.shutdown.recv_timeout(self.pause_poll),
                Err(RecvTimeoutError::Timeout)
            ) {
                return false;
            }
            if !self.has_frame {
                continue;
            }
            if let Err(e) = self.display.present(self.frame.pixels(), self.frame.size()) {
                log::trace!("re-present failed while paused: {}", e);
            }
        }
        true
    }

    fn handle(&mut self, descriptor: FrameDescriptor) {
        let FrameDescriptor { buffer, size } = descriptor;
        let decoded = self.decoder.decode(buffer.payload(), &mut self.scratch);
        // The coded buffer goes back before presentation.
        drop(buffer);

        if let Err(e) = decoded {
            self.stats.record_decode_failure();
            log::error!("Failed to decode {} frame: {}", size, e);
            return;
        }
        self.stats.record_decoded();
        std::mem::swap(&mut self.frame, &mut self.scratch);
        self.has_frame = true;
        self.present();
    }

    fn present(&mut self) {
        match self.display.present(self.frame.pixels(), self.frame.size()) {
            Ok(()) => {
                self.stats.record_presented();
                self.fps.tick();
            }
            Err(e) => {
                self.stats.record_present_failure();
                log::error!("Failed to present frame: {}", e);
            }
        }
    }
}

impl<D, S> Drop for DecodeWorker<D, S> {
    fn drop(&mut self) {
        self.exited.store(true, Ordering::Release);
    }
}

/// Running video pipeline. Dropping it stops and joins the decode worker.
pub struct VideoPipeline {
    producer: VideoProducer,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl VideoPipeline {
    /// Spawns the `video-decode` worker and returns the pipeline.
    ///
    /// # Parameters
    ///
    /// * `config` - channel capacity, decode limit and pause poll interval
    /// * `pool` - coded-frame buffers shared with the producer
    /// * `status` - playback state, read by the worker to stall while paused
    ///
    /// Fails with `Config` when the channel holds fewer frames than the pool.
    pub fn start<D, S>(
        config: &PlayerConfig,
        pool: FramePool,
        decoder: D,
        display: S,
        status: Arc<PlaybackStatus>,
        stats: Arc<PipelineStats>,
    ) -> PlayerResult<Self>
    where
        D: FrameDecoder + 'static,
        S: DisplaySink + 'static,
    {
        if config.channel_capacity < pool.capacity() {
            return Err(PlayerError::config(
                "channel_capacity",
                format!(
                    "{} is below the pool's {} buffers",
                    config.channel_capacity,
                    pool.capacity()
                ),
            ));
        }
        let (tx, rx) = bounded(config.channel_capacity);
        let (shutdown_tx, shutdown_rx) = bounded(0);
        let exited = Arc::new(AtomicBool::new(false));

        let worker = DecodeWorker {
            rx: rx.clone(),
            shutdown: shutdown_rx,
            decoder,
            display,
            frame: RgbFrame::with_limit(config.max_frame),
            scratch: RgbFrame::with_limit(config.max_frame),
            has_frame: false,
            status,
            stats: Arc::clone(&stats),
            fps: FpsMeter::new(),
            pause_poll: config.pause_poll(),
            exited: Arc::clone(&exited),
        };
        let handle = thread::Builder::new()
            .name("video-decode".into())
            .spawn(move || worker.run())
            .map_err(|e| PlayerError::init("video-decode thread", e))?;

        log::info!(
            "video pipeline started: {} x {} byte buffers, queue depth {}",
            pool.capacity(),
            pool.buffer_size(),
            config.channel_capacity
        );

        Ok(Self {
            producer: VideoProducer {
                pool,
                tx,
                drain: rx,
                stats,
                worker_exited: exited,
            },
            shutdown: Some(shutdown_tx),
            worker: Some(handle),
        })
    }

    pub fn producer(&self) -> VideoProducer {
        self.producer.clone()
    }

    pub fn flush(&self) -> usize {
        self.producer.flush()
    }

    pub fn pool(&self) -> &FramePool {
        self.producer.pool()
    }
}

impl Drop for VideoPipeline {
    fn drop(&mut self) {
        // Disconnecting the shutdown channel wakes the worker.
        drop(self.shutdown.take());
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("video-decode thread panicked");
            }
        }
    }
}
