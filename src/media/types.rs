//! Value types crossing the media engine boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FrameLimit;
use crate::error::{PlayerError, PlayerResult};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn rgb_bytes(&self) -> usize {
        self.area() * 3
    }

    pub fn fits_within(&self, limit: FrameLimit) -> bool {
        self.width <= limit.width && self.height <= limit.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Coding of a video packet as declared by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    Mjpeg,
    /// Anything else, by FourCC.
    Other(u32),
}

impl VideoCodec {
    /// Maps an AVI stream FourCC to a codec.
    pub fn from_fourcc(fourcc: [u8; 4]) -> Self {
        match &fourcc.map(|b| b.to_ascii_uppercase()) {
            b"MJPG" | b"JPEG" | b"AVRN" => VideoCodec::Mjpeg,
            _ => VideoCodec::Other(u32::from_le_bytes(fourcc)),
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoCodec::Mjpeg => write!(f, "MJPEG"),
            VideoCodec::Other(tag) => write_fourcc(f, *tag),
        }
    }
}

/// Coding of an audio packet as declared by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3,
    /// Interleaved little-endian PCM at the last announced clock.
    Pcm,
    /// Anything else, by WAVE format tag.
    Other(u32),
}

impl AudioCodec {
    /// Maps a WAVE format tag to a codec.
    pub fn from_format_tag(tag: u16) -> Self {
        match tag {
            0x0001 => AudioCodec::Pcm,
            0x0055 => AudioCodec::Mp3,
            other => AudioCodec::Other(other as u32),
        }
    }

    pub fn needs_decoding(&self) -> bool {
        !matches!(self, AudioCodec::Pcm)
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCodec::Mp3 => write!(f, "MP3"),
            AudioCodec::Pcm => write!(f, "PCM"),
            AudioCodec::Other(tag) => write!(f, "format tag {:#06x}", tag),
        }
    }
}

fn write_fourcc(f: &mut fmt::Formatter<'_>, tag: u32) -> fmt::Result {
    let bytes = tag.to_le_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        write!(f, "{}", String::from_utf8_lossy(&bytes))
    } else {
        write!(f, "{:#010x}", tag)
    }
}

/// Audio output format announced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClock {
    pub sample_rate: u32,
    pub bits_per_sample: u8,
    pub channels: u8,
}

impl AudioClock {
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize).div_ceil(8)
    }
}

impl fmt::Display for AudioClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} bit, {} ch",
            self.sample_rate, self.bits_per_sample, self.channels
        )
    }
}

/// One coded video frame, borrowed from the engine for the callback's duration.
#[derive(Debug, Clone, Copy)]
pub struct VideoPacket<'a> {
    pub codec: VideoCodec,
    pub data: &'a [u8],
    /// Dimensions declared by the container.
    pub size: Size,
}

/// One coded audio frame, borrowed from the engine for the callback's duration.
#[derive(Debug, Clone, Copy)]
pub struct AudioPacket<'a> {
    pub codec: AudioCodec,
    pub data: &'a [u8],
}

/// Reusable RGB888 decode target, allocated once for the largest frame.
#[derive(Debug)]
pub struct RgbFrame {
    data: Vec<u8>,
    size: Size,
    limit: FrameLimit,
}

impl RgbFrame {
    pub fn with_limit(limit: FrameLimit) -> Self {
        Self {
            data: vec![0u8; limit.rgb_bytes()],
            size: Size::default(),
            limit,
        }
    }

    /// Sets the frame size and returns the pixel slice to write.
    ///
    /// Fails with `DecodeFailure` when `size` exceeds the limit.
    pub fn prepare(&mut self, size: Size) -> PlayerResult<&mut [u8]> {
        if !size.fits_within(self.limit) {
            return Err(PlayerError::decode(
                "mjpeg",
                format!(
                    "frame {} exceeds maximum {}x{}",
                    size, self.limit.width, self.limit.height
                ),
            ));
        }
        self.size = size;
        Ok(&mut self.data[..size.rgb_bytes()])
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data[..self.size.rgb_bytes()]
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn limit(&self) -> FrameLimit {
        self.limit
    }
}
