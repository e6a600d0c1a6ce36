//! # Audio Pipeline
//!
//! Runs on the engine thread. PCM is forwarded to the sink as-is, MP3 is
//! decoded into a scratch buffer first. A failing packet is logged and counted;
//! it never stops playback.

use std::sync::Arc;

use crate::config::PlayerConfig;
use crate::core::stats::PipelineStats;
use crate::error::{PlayerError, PlayerResult};
use crate::media::{AudioClock, AudioCodec, AudioDecoder, AudioPacket, AudioSink};

type ClockListener = Box<dyn FnMut(AudioClock) + Send>;

pub struct AudioPipeline {
    decoder: Option<Box<dyn AudioDecoder>>,
    sink: Box<dyn AudioSink>,
    scratch: Vec<u8>,
    clock: Option<AudioClock>,
    clock_listener: Option<ClockListener>,
    stats: Arc<PipelineStats>,
}

impl AudioPipeline {
    /// Creates the pipeline.
    ///
    /// Without a decoder, compressed packets are dropped as unsupported.
    pub fn new(
        config: &PlayerConfig,
        decoder: Option<Box<dyn AudioDecoder>>,
        sink: Box<dyn AudioSink>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            decoder,
            sink,
            scratch: vec![0; config.pcm_scratch_size],
            clock: None,
            clock_listener: None,
            stats,
        }
    }

    /// Replaces the listener told about every new clock, after the sink.
    pub fn set_clock_listener<F>(&mut self, listener: F)
    where
        F: FnMut(AudioClock) + Send + 'static,
    {
        self.clock_listener = Some(Box::new(listener));
    }

    /// The clock the sink is currently configured for.
    pub fn clock(&self) -> Option<AudioClock> {
        self.clock
    }

    /// Reconfigures the sink for a new clock. Repeats of the current clock are ignored.
    pub fn on_clock_change(&mut self, clock: AudioClock) {
        if self.clock == Some(clock) {
            return;
        }
        self.stats.record_clock_change();
        log::info!("audio clock: {}", clock);
        if let Err(e) = self.sink.reconfigure(clock) {
            e.log();
        }
        self.clock = Some(clock);
        if let Some(listener) = self.clock_listener.as_mut() {
            listener(clock);
        }
    }

    /// Forwards one packet to the sink and returns the PCM bytes written.
    pub fn submit(&mut self, packet: AudioPacket<'_>) -> PlayerResult<usize> {
        let result = self.forward(packet);
        match &result {
            Ok(_) => self.stats.record_audio_forwarded(),
            Err(PlayerError::UnsupportedFormat { .. }) => {
                self.stats.record_audio_unsupported();
                log::error!("Unsupported audio format: {}", packet.codec);
            }
            Err(e) => {
                self.stats.record_audio_decode_error();
                log::error!("Audio packet dropped: {}", e);
            }
        }
        result
    }

    fn forward(&mut self, packet: AudioPacket<'_>) -> PlayerResult<usize> {
        match packet.codec {
            AudioCodec::Pcm => {
                self.sink.write(packet.data)?;
                Ok(packet.data.len())
            }
            AudioCodec::Mp3 => {
                let Some(decoder) = self.decoder.as_mut() else {
                    return Err(PlayerError::unsupported_audio(packet.codec.to_string()));
                };
                let len = decoder.decode(packet.data, &mut self.scratch)?;
                self.sink.write(&self.scratch[..len])?;
                Ok(len)
            }
            AudioCodec::Other(_) => Err(PlayerError::unsupported_audio(packet.codec.to_string())),
        }
    }
}
