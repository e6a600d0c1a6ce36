//! # Frame and Audio Decoders
//!
//! The decode traits are the boundary to the image and audio decoders. The
//! shipped implementations are software decoders:
//!
//! - [`JpegFrameDecoder`]: MJPEG frame to RGB888 via the `image` crate
//! - [`Mp3AudioDecoder`]: MP3 frame to interleaved 16-bit PCM via `symphonia`

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_MP3, CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::Packet;

use crate::error::{PlayerError, PlayerResult};
use crate::media::types::{RgbFrame, Size};

/// Converts one coded video frame to pixels.
///
/// Called only from the decode worker; implementations may keep scratch state.
pub trait FrameDecoder: Send {
    /// Decodes `coded` into `out`, which is resized to the decoded dimensions.
    fn decode(&mut self, coded: &[u8], out: &mut RgbFrame) -> PlayerResult<()>;
}

/// Converts one coded audio frame to PCM.
pub trait AudioDecoder: Send {
    /// Decodes `coded` into `scratch` and returns the number of PCM bytes written.
    fn decode(&mut self, coded: &[u8], scratch: &mut [u8]) -> PlayerResult<usize>;
}

impl<D: FrameDecoder + ?Sized> FrameDecoder for Box<D> {
    fn decode(&mut self, coded: &[u8], out: &mut RgbFrame) -> PlayerResult<()> {
        (**self).decode(coded, out)
    }
}

impl<D: AudioDecoder + ?Sized> AudioDecoder for Box<D> {
    fn decode(&mut self, coded: &[u8], scratch: &mut [u8]) -> PlayerResult<usize> {
        (**self).decode(coded, scratch)
    }
}

/// Baseline and progressive JPEG decoder producing RGB888.
#[derive(Debug, Default)]
pub struct JpegFrameDecoder {
    grey: Vec<u8>,
}

impl JpegFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameDecoder for JpegFrameDecoder {
    fn decode(&mut self, coded: &[u8], out: &mut RgbFrame) -> PlayerResult<()> {
        let decoder =
            JpegDecoder::new(Cursor::new(coded)).map_err(|e| PlayerError::decode("mjpeg", e))?;
        let (width, height) = decoder.dimensions();
        let size = Size::new(width, height);

        match decoder.color_type() {
            ColorType::Rgb8 => {
                let dst = out.prepare(size)?;
                decoder
                    .read_image(dst)
                    .map_err(|e| PlayerError::decode("mjpeg", e))?;
            }
            ColorType::L8 => {
                self.grey.resize(size.area(), 0);
                decoder
                    .read_image(&mut self.grey)
                    .map_err(|e| PlayerError::decode("mjpeg", e))?;
                let dst = out.prepare(size)?;
                for (px, &luma) in dst.chunks_exact_mut(3).zip(self.grey.iter()) {
                    px.fill(luma);
                }
            }
            other => {
                return Err(PlayerError::decode(
                    "mjpeg",
                    format!("unsupported colour type {:?}", other),
                ));
            }
        }
        Ok(())
    }
}

/// MPEG-1/2 layer III decoder emitting interleaved signed 16-bit little-endian PCM.
pub struct Mp3AudioDecoder {
    decoder: Box<dyn Decoder>,
    samples: Option<SampleBuffer<i16>>,
}

impl Mp3AudioDecoder {
    pub fn new() -> PlayerResult<Self> {
        let mut params = CodecParameters::new();
        params.for_codec(CODEC_TYPE_MP3);
        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| PlayerError::init("mp3 decoder", e))?;
        Ok(Self {
            decoder,
            samples: None,
        })
    }
}

impl AudioDecoder for Mp3AudioDecoder {
    fn decode(&mut self, coded: &[u8], scratch: &mut [u8]) -> PlayerResult<usize> {
        let packet = Packet::new_from_slice(0, 0, 0, coded);
        let decoded = self
            .decoder
            .decode(&packet)
            .map_err(|e| PlayerError::decode("mp3", e))?;

        let spec = *decoded.spec();
        let frames = decoded.capacity() as u64;
        let reuse = self
            .samples
            .as_ref()
            .is_some_and(|buf| buf.capacity() >= decoded.frames() * spec.channels.count());
        if !reuse {
            self.samples = Some(SampleBuffer::<i16>::new(frames, spec));
        }
        let Some(samples) = self.samples.as_mut() else {
            return Ok(0);
        };
        samples.copy_interleaved_ref(decoded);

        let pcm = samples.samples();
        let len = pcm.len() * 2;
        if len > scratch.len() {
            return Err(PlayerError::decode(
                "mp3",
                format!("{} PCM bytes exceed {} byte scratch", len, scratch.len()),
            ));
        }
        for (dst, sample) in scratch.chunks_exact_mut(2).zip(pcm) {
            dst.copy_from_slice(&sample.to_le_bytes());
        }
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameLimit;
    use image::codecs::jpeg::JpegEncoder;
    use image::ExtendedColorType;

    fn encode(pixels: &[u8], w: u32, h: u32, color: ExtendedColorType) -> Vec<u8> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 95)
            .encode(pixels, w, h, color)
            .unwrap();
        out
    }

    fn limit() -> FrameLimit {
        FrameLimit {
            width: 64,
            height: 64,
        }
    }

    #[test]
    fn test_decodes_rgb_jpeg() {
        let pixels: Vec<u8> = [200u8, 40, 40].repeat(16 * 8);
        let jpeg = encode(&pixels, 16, 8, ExtendedColorType::Rgb8);

        let mut out = RgbFrame::with_limit(limit());
        JpegFrameDecoder::new().decode(&jpeg, &mut out).unwrap();
        assert_eq!(out.size(), Size::new(16, 8));
        let px = &out.pixels()[..3];
        assert!((px[0] as i32 - 200).abs() < 8, "{:?}", px);
        assert!((px[1] as i32 - 40).abs() < 8, "{:?}", px);
    }

    #[test]
    fn test_expands_greyscale() {
        let pixels = vec![128u8; 8 * 8];
        let jpeg = encode(&pixels, 8, 8, ExtendedColorType::L8);

        let mut out = RgbFrame::with_limit(limit());
        JpegFrameDecoder::new().decode(&jpeg, &mut out).unwrap();
        let px = &out.pixels()[..3];
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_rejects_garbage_and_oversize() {
        let mut out = RgbFrame::with_limit(limit());
        let mut decoder = JpegFrameDecoder::new();
        assert!(decoder.decode(b"not a jpeg", &mut out).is_err());

        let big = encode(&vec![0u8; 80 * 8 * 3], 80, 8, ExtendedColorType::Rgb8);
        let err = decoder.decode(&big, &mut out).unwrap_err();
        assert_eq!(err.category(), "decode_failure");
    }

    /// Silent MPEG-1 layer III frame: 128 kbit/s, 44.1 kHz, stereo.
    fn silent_mp3_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        frame
    }

    #[test]
    fn test_mp3_decodes_silent_frame() {
        let mut decoder = Mp3AudioDecoder::new().unwrap();
        let mut scratch = vec![0xAAu8; 8192];
        let frame = silent_mp3_frame();

        // 1152 stereo samples per frame, 16-bit
        for _ in 0..3 {
            assert_eq!(decoder.decode(&frame, &mut scratch).unwrap(), 4608);
        }
        assert!(scratch[..4608].iter().all(|&b| b == 0));
        assert_eq!(scratch[4608], 0xAA);
    }

    #[test]
    fn test_mp3_pcm_larger_than_scratch_fails() {
        let mut decoder = Mp3AudioDecoder::new().unwrap();
        let mut scratch = vec![0u8; 1024];
        let err = decoder.decode(&silent_mp3_frame(), &mut scratch).unwrap_err();
        assert_eq!(err.category(), "decode_failure");
        assert!(
            err.to_string().contains("4608 PCM bytes exceed 1024 byte scratch"),
            "{}",
            err
        );
    }

    #[test]
    fn test_mp3_decoder_rejects_garbage() {
        let mut decoder = Mp3AudioDecoder::new().unwrap();
        let mut scratch = vec![0u8; 4096];
        assert!(decoder.decode(&[0u8; 16], &mut scratch).is_err());
    }
}
