//! # Display and Audio Sinks
//!
//! Output boundary of the pipelines. Both sinks are synchronous: `present` and
//! `write` return once the device (or file) has accepted the data.
//!
//! | Sink | Output |
//! |------|--------|
//! | [`NullDisplay`] | discards frames |
//! | [`SnapshotDisplay`] | every n-th frame as PNG |
//! | [`FitDisplay`] | fits frames to a panel, then forwards |
//! | [`NullAudioSink`] | discards PCM |
//! | [`WavAudioSink`] | one WAV file per announced clock |

// Standard library imports
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

// External crate imports
use fast_image_resize::Resizer;
use hound::{SampleFormat, WavSpec, WavWriter};
use image::ExtendedColorType;
use tab_fit::{FitPlan, Staging};

// Internal module imports
use crate::config::PanelConfig;
use crate::error::{PlayerError, PlayerResult};
use crate::media::types::{AudioClock, Size};

/// Receives decoded RGB888 frames.
pub trait DisplaySink: Send {
    /// Shows one frame. Blocks until the panel has accepted it.
    fn present(&mut self, pixels: &[u8], size: Size) -> PlayerResult<()>;
}

/// Receives decoded PCM.
pub trait AudioSink: Send {
    fn write(&mut self, pcm: &[u8]) -> PlayerResult<()>;

    /// Re-opens the output at a new sample format. Called before any PCM in
    /// that format is written.
    fn reconfigure(&mut self, clock: AudioClock) -> PlayerResult<()>;
}

impl<D: DisplaySink + ?Sized> DisplaySink for Box<D> {
    fn present(&mut self, pixels: &[u8], size: Size) -> PlayerResult<()> {
        (**self).present(pixels, size)
    }
}

impl<A: AudioSink + ?Sized> AudioSink for Box<A> {
    fn write(&mut self, pcm: &[u8]) -> PlayerResult<()> {
        (**self).write(pcm)
    }

    fn reconfigure(&mut self, clock: AudioClock) -> PlayerResult<()> {
        (**self).reconfigure(clock)
    }
}

/// Display sink that drops every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn present(&mut self, _pixels: &[u8], _size: Size) -> PlayerResult<()> {
        Ok(())
    }
}

/// Writes every `every`-th presented frame to `dir` as `frame-NNNNNN.png`.
#[derive(Debug)]
pub struct SnapshotDisplay {
    dir: PathBuf,
    every: u64,
    presented: u64,
    written: u64,
}

impl SnapshotDisplay {
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> PlayerResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| PlayerError::io(format!("create {}", dir.display()), e))?;
        Ok(Self {
            dir,
            every: every.max(1),
            presented: 0,
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl DisplaySink for SnapshotDisplay {
    fn present(&mut self, pixels: &[u8], size: Size) -> PlayerResult<()> {
        let index = self.presented;
        self.presented += 1;
        if index % self.every != 0 {
            return Ok(());
        }
        let path = self.dir.join(format!("frame-{:06}.png", index));
        image::save_buffer(
            &path,
            pixels,
            size.width,
            size.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| PlayerError::sink("snapshot", e))?;
        self.written += 1;
        log::debug!("snapshot {} -> {}", index, path.display());
        Ok(())
    }
}

/// Scales, rotates and letterboxes each frame onto a fixed panel before
/// handing the panel-sized canvas to `inner`.
pub struct FitDisplay<D> {
    inner: D,
    panel: tab_fit::Size,
    allow_rotate: bool,
    resizer: Resizer,
    staging: Staging,
    canvas: Vec<u8>,
    plan: Option<FitPlan>,
}

impl<D: DisplaySink> FitDisplay<D> {
    pub fn new(inner: D, panel: PanelConfig) -> Self {
        let panel_size = tab_fit::Size::new(panel.width, panel.height);
        Self {
            inner,
            panel: panel_size,
            allow_rotate: panel.allow_rotate,
            resizer: Resizer::new(),
            staging: Staging::default(),
            canvas: vec![0u8; panel_size.area() * 3],
            plan: None,
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: DisplaySink> DisplaySink for FitDisplay<D> {
    fn present(&mut self, pixels: &[u8], size: Size) -> PlayerResult<()> {
        let input = tab_fit::Size::new(size.width, size.height);
        let plan = match self.plan {
            Some(plan) if plan.input == input => plan,
            _ => {
                let plan = tab_fit::plan_fit(input, self.panel, self.allow_rotate);
                log::debug!(
                    "fit {}x{} -> panel {}x{} (rotate: {}, scale: {:.3})",
                    input.w,
                    input.h,
                    self.panel.w,
                    self.panel.h,
                    plan.rotate,
                    plan.scale
                );
                self.plan = Some(plan);
                plan
            }
        };
        tab_fit::fit_rgb_cpu(
            &mut self.resizer,
            pixels,
            &plan,
            &mut self.canvas,
            &mut self.staging,
        )
        .map_err(|e| PlayerError::sink("fit", e))?;
        self.inner
            .present(&self.canvas, Size::new(self.panel.w, self.panel.h))
    }
}

/// Audio sink that drops PCM but tracks the configured clock.
#[derive(Debug, Default)]
pub struct NullAudioSink {
    clock: Option<AudioClock>,
    bytes: u64,
}

impl NullAudioSink {
    pub fn clock(&self) -> Option<AudioClock> {
        self.clock
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl AudioSink for NullAudioSink {
    fn write(&mut self, pcm: &[u8]) -> PlayerResult<()> {
        self.bytes += pcm.len() as u64;
        Ok(())
    }

    fn reconfigure(&mut self, clock: AudioClock) -> PlayerResult<()> {
        self.clock = Some(clock);
        Ok(())
    }
}

/// Writes PCM to WAV files.
///
/// Each `reconfigure` finalises the open file and starts `<stem>-<n>.wav`
/// next to the base path. 8-bit PCM is unsigned on input, 16-bit is signed
/// little-endian.
pub struct WavAudioSink {
    base: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    clock: Option<AudioClock>,
    files: Vec<PathBuf>,
}

impl WavAudioSink {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            writer: None,
            clock: None,
            files: Vec::new(),
        }
    }

    /// Files opened so far, in order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Finalises the open file, if any.
    pub fn finish(&mut self) -> PlayerResult<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(|e| PlayerError::sink("wav", e))?;
        }
        Ok(())
    }

    fn next_path(&self) -> PathBuf {
        let stem = self
            .base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let dir = self.base.parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("{}-{}.wav", stem, self.files.len()))
    }
}

impl AudioSink for WavAudioSink {
    fn write(&mut self, pcm: &[u8]) -> PlayerResult<()> {
        let (Some(writer), Some(clock)) = (self.writer.as_mut(), self.clock) else {
            return Err(PlayerError::sink("wav", "PCM written before a clock was set"));
        };
        match clock.bits_per_sample {
            8 => {
                for &b in pcm {
                    writer
                        .write_sample((b as i16 - 128) as i8)
                        .map_err(|e| PlayerError::sink("wav", e))?;
                }
            }
            _ => {
                for pair in pcm.chunks_exact(2) {
                    writer
                        .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                        .map_err(|e| PlayerError::sink("wav", e))?;
                }
            }
        }
        Ok(())
    }

    fn reconfigure(&mut self, clock: AudioClock) -> PlayerResult<()> {
        if !matches!(clock.bits_per_sample, 8 | 16) {
            return Err(PlayerError::sink(
                "wav",
                format!("{}-bit PCM is not supported", clock.bits_per_sample),
            ));
        }
        self.finish()?;
        let spec = WavSpec {
            channels: clock.channels as u16,
            sample_rate: clock.sample_rate,
            bits_per_sample: clock.bits_per_sample as u16,
            sample_format: SampleFormat::Int,
        };
        let path = self.next_path();
        let writer = WavWriter::create(&path, spec).map_err(|e| PlayerError::sink("wav", e))?;
        log::info!("audio -> {} ({})", path.display(), clock);
        self.files.push(path);
        self.writer = Some(writer);
        self.clock = Some(clock);
        Ok(())
    }
}

impl Drop for WavAudioSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::warn!("{}", e);
        }
    }
}
