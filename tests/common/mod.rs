//! Common test utilities and helpers for the tabplay integration tests
//!
//! Mock engine, recording sinks, scripted decoders and in-memory JPEG
//! generation, shared by every `test_*.rs` file.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;

use tabplay::engine::{EngineEvents, MediaEngine};
use tabplay::media::{
    AudioClock, AudioCodec, AudioPacket, AudioSink, DisplaySink, FrameDecoder, RgbFrame, Size,
    VideoCodec, VideoPacket,
};
use tabplay::{PlayerError, PlayerResult};

/// Generous bound for anything the tests wait on.
pub const WAIT: Duration = Duration::from_secs(3);

/// Polls `done` until it holds or `timeout` elapses. Returns the final result.
pub fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while !done() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

/// Encodes a solid-colour RGB JPEG.
pub fn jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let pixels = rgb.repeat((width * height) as usize);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .encode(&pixels, width, height, ExtendedColorType::Rgb8)
        .expect("encode test jpeg");
    out
}

/// One packet the mock engine delivers.
#[derive(Debug, Clone)]
pub enum Scripted {
    Video(VideoCodec, Vec<u8>),
    Audio(AudioCodec, Vec<u8>),
    Clock(AudioClock),
}

pub fn mjpeg(tag: u8) -> Scripted {
    Scripted::Video(VideoCodec::Mjpeg, vec![tag])
}

/// Engine that replays a packet script from its own thread.
///
/// Paths containing `missing` fail with `EngineIo`. With `hold_open`, the
/// stream stays open after the script until `stop()` is called.
pub struct MockEngine {
    script: Vec<Scripted>,
    interval: Duration,
    hold_open: bool,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    pub plays: Arc<Mutex<Vec<PathBuf>>>,
    pub stops: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script,
            interval: Duration::ZERO,
            hold_open: false,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            plays: Arc::new(Mutex::new(Vec::new())),
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl MediaEngine for MockEngine {
    fn play(&mut self, path: &Path, events: Arc<dyn EngineEvents>) -> PlayerResult<()> {
        self.stop.store(true, Ordering::SeqCst);
        self.join();
        if path.to_string_lossy().contains("missing") {
            return Err(PlayerError::engine_io(path, "no such file"));
        }
        self.plays.lock().unwrap().push(path.to_path_buf());

        let stop = Arc::new(AtomicBool::new(false));
        self.stop = stop.clone();
        let script = self.script.clone();
        let interval = self.interval;
        let hold_open = self.hold_open;
        self.worker = Some(thread::spawn(move || {
            for item in &script {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                match item {
                    Scripted::Video(codec, data) => events.on_video(VideoPacket {
                        codec: *codec,
                        data,
                        size: Size::new(1, 1),
                    }),
                    Scripted::Audio(codec, data) => events.on_audio(AudioPacket {
                        codec: *codec,
                        data,
                    }),
                    Scripted::Clock(clock) => events.on_clock_change(*clock),
                }
                thread::sleep(interval);
            }
            while hold_open && !stop.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            events.on_end_of_stream();
        }));
        Ok(())
    }

    fn stop(&mut self) -> PlayerResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stop.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.join();
    }
}

/// Decodes a coded frame into a 1x1 pixel holding its first byte.
///
/// `0xFF` fails to decode. An optional gate makes each decode wait for a token.
#[derive(Clone, Default)]
pub struct ScriptedDecoder {
    delay: Duration,
    gate: Option<Receiver<()>>,
    pub decoded: Arc<AtomicUsize>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Decoder that blocks before each frame until the returned sender ticks.
    pub fn gated() -> (Self, Sender<()>) {
        let (tx, rx) = unbounded();
        let decoder = Self {
            gate: Some(rx),
            ..Self::default()
        };
        (decoder, tx)
    }
}

impl FrameDecoder for ScriptedDecoder {
    fn decode(&mut self, coded: &[u8], out: &mut RgbFrame) -> PlayerResult<()> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv_timeout(WAIT);
        }
        thread::sleep(self.delay);
        let tag = coded.first().copied().unwrap_or(0);
        if tag == 0xFF {
            return Err(PlayerError::decode("scripted", "poisoned frame"));
        }
        out.prepare(Size::new(1, 1))?.fill(tag);
        self.decoded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Display sink that records the first byte of every presented frame.
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pub frames: Arc<Mutex<Vec<u8>>>,
    pub sizes: Arc<Mutex<Vec<Size>>>,
}

impl RecordingDisplay {
    pub fn count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn tags(&self) -> Vec<u8> {
        self.frames.lock().unwrap().clone()
    }
}

impl DisplaySink for RecordingDisplay {
    fn present(&mut self, pixels: &[u8], size: Size) -> PlayerResult<()> {
        self.frames.lock().unwrap().push(pixels[0]);
        self.sizes.lock().unwrap().push(size);
        Ok(())
    }
}

/// Audio sink that records PCM and clocks.
#[derive(Clone, Default)]
pub struct RecordingAudioSink {
    pub pcm: Arc<Mutex<Vec<u8>>>,
    pub clocks: Arc<Mutex<Vec<AudioClock>>>,
}

impl AudioSink for RecordingAudioSink {
    fn write(&mut self, pcm: &[u8]) -> PlayerResult<()> {
        self.pcm.lock().unwrap().extend_from_slice(pcm);
        Ok(())
    }

    fn reconfigure(&mut self, clock: AudioClock) -> PlayerResult<()> {
        self.clocks.lock().unwrap().push(clock);
        Ok(())
    }
}
