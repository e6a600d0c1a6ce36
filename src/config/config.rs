//! # Configuration Module
//!
//! This module provides the configuration structure and validation for the
//! playback core. A single [`PlayerConfig`] is built once (defaults, then an
//! optional JSON file, then CLI flags) and passed explicitly to every component
//! at construction.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `pool_capacity` | `usize` | 4 | Coded video buffers in the frame pool |
//! | `coded_buffer_size` | `usize` | 1 MiB | Bytes per pool buffer |
//! | `channel_capacity` | `usize` | 4 | Slots in the producer-to-decoder channel |
//! | `max_frame` | `FrameLimit` | 1280x720 | Largest decoded frame |
//! | `pcm_scratch_size` | `usize` | 32 KiB | Audio decoder output scratch |
//! | `long_press_ticks` | `u16` | 15 | Touch samples before a long press |
//! | `pause_poll_ms` | `u64` | 10 | Re-present interval while paused |
//! | `selection_poll_ms` | `u64` | 100 | Coordinator poll delay |
//! | `media_extensions` | `Vec<String>` | avi, mjpeg, mjpg | Playable file extensions |
//! | `panel` | `Option<PanelConfig>` | none | Fit frames to this panel |
//!
//! ## Examples
//!
//! ```rust
//! use tabplay::config::PlayerConfig;
//!
//! let config = PlayerConfig::default();
//! assert!(config.validate().is_ok());
//!
//! let config: PlayerConfig = serde_json::from_str(r#"{ "pool_capacity": 8 }"#).unwrap();
//! assert_eq!(config.pool_capacity, 8);
//! assert_eq!(config.channel_capacity, 4);
//! assert!(config.validate().is_err());
//! ```

// Standard library imports
use std::path::Path;
use std::time::Duration;

// External crate imports
use serde::{Deserialize, Serialize};

// Internal module imports
use crate::error::{PlayerError, PlayerResult};

/// Largest decoded frame the decode worker accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLimit {
    pub width: u32,
    pub height: u32,
}

impl FrameLimit {
    /// Bytes needed for an RGB888 frame of this size.
    pub fn rgb_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Physical display panel the frames are fitted onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub width: u32,
    pub height: u32,
    /// Rotate frames by 90 degrees when their orientation differs from the panel.
    #[serde(default = "default_true")]
    pub allow_rotate: bool,
}

fn default_true() -> bool {
    true
}

/// Configuration structure for the playback core.
///
/// Every field has a default, so partial JSON files are valid.
///
/// # Examples
///
/// ```rust
/// use tabplay::config::{PanelConfig, PlayerConfig};
///
/// let config = PlayerConfig {
///     pool_capacity: 2,
///     channel_capacity: 2,
///     panel: Some(PanelConfig { width: 800, height: 480, allow_rotate: true }),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Number of coded-frame buffers. Fixed for the pool's lifetime.
    pub pool_capacity: usize,

    /// Size of each coded-frame buffer in bytes.
    ///
    /// A coded frame larger than this is dropped before it reaches the decoder.
    pub coded_buffer_size: usize,

    /// Capacity of the bounded channel feeding the decode worker.
    ///
    /// Must be at least `pool_capacity`. Every queued frame holds a pool
    /// buffer, so the channel can then never be full when a buffer was free.
    pub channel_capacity: usize,

    /// Largest decoded frame; sizes the reusable decode output buffer.
    pub max_frame: FrameLimit,

    /// Output scratch for the audio decoder, in bytes.
    pub pcm_scratch_size: usize,

    /// Stationary touch samples before a press becomes a long press.
    pub long_press_ticks: u16,

    /// How often the paused decode worker re-presents its frame.
    pub pause_poll_ms: u64,

    /// How long the coordinator waits between empty selection polls.
    pub selection_poll_ms: u64,

    /// File extensions, without dot, that the media library lists.
    pub media_extensions: Vec<String>,

    /// Fit every presented frame to this panel.
    pub panel: Option<PanelConfig>,
}

impl Default for PlayerConfig {
    /// Creates the reference sizing: four 1 MiB coded buffers, a four-slot
    /// channel and 720p decode output.
    fn default() -> Self {
        Self {
            pool_capacity: 4,
            coded_buffer_size: 1024 * 1024,
            channel_capacity: 4,
            max_frame: FrameLimit {
                width: 1280,
                height: 720,
            },
            pcm_scratch_size: 32 * 1024,
            long_press_ticks: tab_touch::LONG_PRESS_TICKS,
            pause_poll_ms: 10,
            selection_poll_ms: 100,
            media_extensions: vec!["avi".into(), "mjpeg".into(), "mjpg".into()],
            panel: None,
        }
    }
}

impl PlayerConfig {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    ///
    /// Time complexity: O(file size).
    pub fn from_file(path: impl AsRef<Path>) -> PlayerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlayerError::io(format!("read config {}", path.display()), e))?;
        let config: PlayerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    ///
    /// Time complexity: O(1) - constant-time range checks on numeric fields.
    pub fn validate(&self) -> PlayerResult<()> {
        if self.pool_capacity == 0 {
            return Err(PlayerError::config("pool_capacity", "must be greater than 0"));
        }
        if self.coded_buffer_size == 0 {
            return Err(PlayerError::config(
                "coded_buffer_size",
                "must be greater than 0",
            ));
        }
        if self.channel_capacity == 0 {
            return Err(PlayerError::config(
                "channel_capacity",
                "needs at least one slot",
            ));
        }
        if self.channel_capacity < self.pool_capacity {
            return Err(PlayerError::config(
                "channel_capacity",
                "must be at least pool_capacity",
            ));
        }
        if self.max_frame.width == 0 || self.max_frame.height == 0 {
            return Err(PlayerError::config("max_frame", "dimensions must be non-zero"));
        }
        if self.pcm_scratch_size == 0 {
            return Err(PlayerError::config("pcm_scratch_size", "must be greater than 0"));
        }
        if self.pause_poll_ms == 0 {
            return Err(PlayerError::config("pause_poll_ms", "must be greater than 0"));
        }
        if let Some(panel) = self.panel {
            if panel.width == 0 || panel.height == 0 {
                return Err(PlayerError::config("panel", "dimensions must be non-zero"));
            }
        }
        Ok(())
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    pub fn selection_poll(&self) -> Duration {
        Duration::from_millis(self.selection_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.pool_capacity, 4);
        assert_eq!(config.channel_capacity, 4);
        assert_eq!(config.long_press_ticks, 15);
        assert_eq!(config.max_frame.rgb_bytes(), 1280 * 720 * 3);
        assert!(config.panel.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = PlayerConfig::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        config.pool_capacity = 0;
        assert!(config.validate().is_err());
        config.pool_capacity = 4;

        config.channel_capacity = 0;
        assert!(config.validate().is_err());
        config.channel_capacity = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("channel_capacity"), "{}", err);
        config.channel_capacity = 8;
        assert!(config.validate().is_ok());
        config.channel_capacity = 4;

        config.panel = Some(PanelConfig {
            width: 0,
            height: 480,
            allow_rotate: true,
        });
        assert!(config.validate().is_err());
        config.panel = None;

        // Valid again
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{ "panel": { "width": 480, "height": 800 } }"#).unwrap();
        let panel = config.panel.unwrap();
        assert!(panel.allow_rotate);
        assert_eq!(config.pool_capacity, 4);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "pool_capacity": 0 }}"#).unwrap();
        let err = PlayerConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.category(), "config");
    }
}
