//! # MJPEG File Engine
//!
//! A software [`MediaEngine`] for raw MJPEG elementary streams: files holding
//! concatenated JPEG images. Frames are located by walking the JPEG marker
//! structure from each SOI to its EOI, which also yields the dimensions
//! declared in the SOF header.
//!
//! ## Threading Behavior
//!
//! - **Caller thread**: `play` opens and indexes the file, then returns
//! - **media-engine thread**: delivers one frame per tick at the configured
//!   rate, then end-of-stream
//! - **stop**: raises a flag and returns; the engine thread notices it before
//!   the next frame and delivers end-of-stream
//!
//! ## Audio
//!
//! If a `.wav` file with the same stem sits next to the video (8- or 16-bit
//! integer PCM), its clock is announced first and one video frame's worth of
//! PCM is forwarded after each frame.

// Standard library imports
use std::fs::File;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

// External crate imports
use memmap2::Mmap;

// Internal module imports
use crate::engine::{EngineEvents, MediaEngine};
use crate::error::{PlayerError, PlayerResult};
use crate::media::{AudioClock, AudioCodec, AudioPacket, Size, VideoCodec, VideoPacket};

/// Location and declared size of one JPEG image inside a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIndex {
    pub range: Range<usize>,
    pub size: Size,
}

/// Engine playing MJPEG elementary streams from disk.
pub struct MjpegFileEngine {
    fps: u32,
    stop_flag: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl MjpegFileEngine {
    /// Creates an engine pacing delivery at `fps`. Zero delivers as fast as the
    /// callbacks return.
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Whether the engine thread of the last `play` is still delivering.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("media-engine thread panicked");
            }
        }
    }
}

impl MediaEngine for MjpegFileEngine {
    fn play(&mut self, path: &Path, events: Arc<dyn EngineEvents>) -> PlayerResult<()> {
        // A previous stream must be fully drained before the flag is reused.
        self.stop_flag.store(true, Ordering::Release);
        self.join_worker();

        let file = File::open(path).map_err(|e| PlayerError::engine_io(path, e))?;
        // SAFETY: the mapping is read-only and the file is not modified while playing.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| PlayerError::engine_io(path, e))?;
        let frames = index_frames(&map);
        if frames.is_empty() {
            return Err(PlayerError::engine_io(path, "no JPEG frames found"));
        }
        let audio = load_sibling_wav(path);
        log::info!(
            "playing {} ({} frames{}, {} fps)",
            path.display(),
            frames.len(),
            if audio.is_some() { " + wav" } else { "" },
            self.fps
        );

        self.stop_flag.store(false, Ordering::Release);
        let stop = Arc::clone(&self.stop_flag);
        let fps = self.fps;
        let worker = thread::Builder::new()
            .name("media-engine".into())
            .spawn(move || deliver(map, frames, audio, fps, stop, events))
            .map_err(|e| PlayerError::engine_io(path, e))?;
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> PlayerResult<()> {
        self.stop_flag.store(true, Ordering::Release);
        Ok(())
    }
}

impl Drop for MjpegFileEngine {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        self.join_worker();
    }
}

fn deliver(
    map: Mmap,
    frames: Vec<FrameIndex>,
    audio: Option<(AudioClock, Vec<u8>)>,
    fps: u32,
    stop: Arc<AtomicBool>,
    events: Arc<dyn EngineEvents>,
) {
    let period = (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64));
    let chunk = audio.as_ref().map_or(0, |(clock, _)| {
        let per_second = clock.sample_rate as usize * clock.bytes_per_frame();
        let frame_bytes = clock.bytes_per_frame().max(1);
        (per_second / fps.max(1) as usize) / frame_bytes * frame_bytes
    });
    if let Some((clock, _)) = &audio {
        events.on_clock_change(*clock);
    }

    let start = Instant::now();
    let mut delivered = 0usize;
    for (i, frame) in frames.iter().enumerate() {
        if stop.load(Ordering::Acquire) {
            log::debug!("stop requested after {} frames", delivered);
            break;
        }
        events.on_video(VideoPacket {
            codec: VideoCodec::Mjpeg,
            data: &map[frame.range.clone()],
            size: frame.size,
        });
        delivered += 1;

        if let Some((_, pcm)) = &audio {
            let from = (i * chunk).min(pcm.len());
            let to = ((i + 1) * chunk).min(pcm.len());
            if from < to {
                events.on_audio(AudioPacket {
                    codec: AudioCodec::Pcm,
                    data: &pcm[from..to],
                });
            }
        }

        if let Some(period) = period {
            let deadline = start + period * (i as u32 + 1);
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
        }
    }
    log::debug!("delivered {} of {} frames", delivered, frames.len());
    events.on_end_of_stream();
}

/// Finds every complete JPEG image in `data`.
///
/// Bytes between images are skipped. A trailing image without EOI is ignored.
pub fn index_frames(data: &[u8]) -> Vec<FrameIndex> {
    let mut frames = Vec::new();
    let mut pos = 0;
    while let Some(frame) = next_frame(data, pos) {
        pos = frame.range.end;
        frames.push(frame);
    }
    frames
}

fn be16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

fn is_sof(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

fn next_frame(data: &[u8], from: usize) -> Option<FrameIndex> {
    let len = data.len();
    let mut start = (from..len.saturating_sub(1)).find(|&i| data[i] == 0xFF && data[i + 1] == 0xD8)?;
    let mut size = Size::default();
    let mut i = start + 2;

    while i + 1 < len {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        match marker {
            0xFF => i += 1,
            0xD9 => {
                return Some(FrameIndex {
                    range: start..i + 2,
                    size,
                });
            }
            0xD8 => {
                // SOI inside an image: the previous one was truncated.
                start = i;
                size = Size::default();
                i += 2;
            }
            0x00 | 0x01 | 0xD0..=0xD7 => i += 2,
            _ => {
                if i + 3 >= len {
                    return None;
                }
                let seg_len = be16(data, i + 2) as usize;
                if is_sof(marker) && i + 8 < len {
                    size = Size::new(be16(data, i + 7) as u32, be16(data, i + 5) as u32);
                }
                i += 2 + seg_len;
                if marker == 0xDA {
                    // Entropy-coded data runs until the next non-RST marker.
                    while i + 1 < len {
                        let next = data[i + 1];
                        if data[i] == 0xFF && next != 0x00 && !(0xD0..=0xD7).contains(&next) {
                            break;
                        }
                        i += 1;
                    }
                }
            }
        }
    }
    None
}

fn load_sibling_wav(path: &Path) -> Option<(AudioClock, Vec<u8>)> {
    let wav_path = path.with_extension("wav");
    if wav_path == path || !wav_path.is_file() {
        return None;
    }
    let mut reader = match hound::WavReader::open(&wav_path) {
        Ok(reader) => reader,
        Err(e) => {
            log::warn!("ignoring {}: {}", wav_path.display(), e);
            return None;
        }
    };
    let spec = reader.spec();
    let clock = AudioClock {
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample as u8,
        channels: spec.channels as u8,
    };
    let pcm: Result<Vec<u8>, hound::Error> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(i16::to_le_bytes))
            .collect::<Result<Vec<_>, _>>()
            .map(|v| v.concat()),
        (hound::SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| (v as i16 + 128) as u8))
            .collect(),
        _ => {
            log::warn!(
                "ignoring {}: {}-bit {:?} audio is not supported",
                wav_path.display(),
                spec.bits_per_sample,
                spec.sample_format
            );
            return None;
        }
    };
    match pcm {
        Ok(pcm) => Some((clock, pcm)),
        Err(e) => {
            log::warn!("ignoring {}: {}", wav_path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::CompletionSignal;
    use image::ExtendedColorType;
    use image::codecs::jpeg::JpegEncoder;
    use std::io::Write;
    use std::sync::Mutex;

    fn jpeg(w: u32, h: u32) -> Vec<u8> {
        let mut out = Vec::new();
        JpegEncoder::new(&mut out)
            .encode(&vec![90u8; (w * h * 3) as usize], w, h, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    #[derive(Default)]
    struct Recorder {
        video: Mutex<Vec<Size>>,
        audio: Mutex<usize>,
        clocks: Mutex<Vec<AudioClock>>,
        eos: CompletionSignal,
    }

    impl EngineEvents for Recorder {
        fn on_video(&self, packet: VideoPacket<'_>) {
            assert_eq!(&packet.data[..2], &[0xFF, 0xD8]);
            self.video.lock().unwrap().push(packet.size);
        }
        fn on_audio(&self, packet: AudioPacket<'_>) {
            *self.audio.lock().unwrap() += packet.data.len();
        }
        fn on_clock_change(&self, clock: AudioClock) {
            self.clocks.lock().unwrap().push(clock);
        }
        fn on_end_of_stream(&self) {
            self.eos.give();
        }
    }

    #[test]
    fn test_index_frames_reads_dimensions() {
        let mut stream = b"junk".to_vec();
        stream.extend(jpeg(16, 8));
        stream.extend(jpeg(8, 24));
        stream.extend(&[0xFF, 0xD8, 0xFF]); // truncated tail

        let frames = index_frames(&stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].size, Size::new(16, 8));
        assert_eq!(frames[0].range.start, 4);
        assert_eq!(frames[1].size, Size::new(8, 24));
        assert_eq!(&stream[frames[1].range.end - 2..frames[1].range.end], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_index_frames_empty_input() {
        assert!(index_frames(&[]).is_empty());
        assert!(index_frames(b"no markers here").is_empty());
    }

    #[test]
    fn test_plays_all_frames_then_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mjpeg");
        let mut file = File::create(&path).unwrap();
        for _ in 0..3 {
            file.write_all(&jpeg(8, 8)).unwrap();
        }
        drop(file);

        let recorder = Arc::new(Recorder::default());
        let mut engine = MjpegFileEngine::new(0);
        engine.play(&path, recorder.clone()).unwrap();

        assert!(recorder.eos.take_timeout(Duration::from_secs(5)));
        assert_eq!(recorder.video.lock().unwrap().len(), 3);
        assert!(recorder.clocks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sibling_wav_announces_clock_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mjpeg");
        std::fs::write(&path, [jpeg(8, 8), jpeg(8, 8)].concat()).unwrap();

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(dir.path().join("clip.wav"), spec).unwrap();
        for s in 0..100i16 {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let recorder = Arc::new(Recorder::default());
        let mut engine = MjpegFileEngine::new(10);
        engine.play(&path, recorder.clone()).unwrap();
        assert!(recorder.eos.take_timeout(Duration::from_secs(5)));

        assert_eq!(recorder.clocks.lock().unwrap().len(), 1);
        // 100 Hz mono 16-bit at 10 fps: 20 bytes per frame
        assert_eq!(*recorder.audio.lock().unwrap(), 40);
    }

    #[test]
    fn test_missing_or_empty_file_is_engine_io() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MjpegFileEngine::new(0);
        let recorder: Arc<dyn EngineEvents> = Arc::new(Recorder::default());

        let err = engine
            .play(&dir.path().join("missing.avi"), recorder.clone())
            .unwrap_err();
        assert_eq!(err.category(), "engine_io");

        let empty = dir.path().join("empty.mjpeg");
        std::fs::write(&empty, b"nothing").unwrap();
        let err = engine.play(&empty, recorder).unwrap_err();
        assert_eq!(err.category(), "engine_io");
    }

    #[test]
    fn test_stop_ends_stream_early() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.mjpeg");
        std::fs::write(&path, jpeg(8, 8).repeat(200)).unwrap();

        let recorder = Arc::new(Recorder::default());
        let mut engine = MjpegFileEngine::new(100);
        engine.play(&path, recorder.clone()).unwrap();
        thread::sleep(Duration::from_millis(30));
        engine.stop().unwrap();

        assert!(recorder.eos.take_timeout(Duration::from_secs(5)));
        assert!(recorder.video.lock().unwrap().len() < 200);
    }
}
