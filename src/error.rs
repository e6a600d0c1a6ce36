//! # Player Error Handling
//!
//! Error taxonomy for the playback core, with severity and recovery
//! classification.
//!
//! ## Architecture
//!
//! - **Error Type**: [`PlayerError`], one variant per failure class
//! - **Error Traits**: [`HasSeverity`] and [`Recoverable`] classify each variant
//! - **Classification**: the [`classify`] module answers "does this stop playback?"
//!
//! ## Error Classes
//!
//! | Variant | Raised by | Handling |
//! |---------|-----------|----------|
//! | `UnsupportedFormat` | video producer | logged, frame dropped |
//! | `PoolExhausted` | video producer | logged, frame dropped (backpressure) |
//! | `FrameTooLarge` | video producer | logged, frame dropped |
//! | `DecodeFailure` | decode worker, audio pipeline | logged, frame skipped |
//! | `EngineIo` | `play()` | surfaced, coordinator moves on |
//! | `Sink` | display/audio sinks | logged, frame skipped |
//! | `Init` | pool, decoder, threads | startup aborts |
//! | `Config` | configuration | startup aborts |
//! | `Io` | file access | surfaced |
//!
//! No operation retries. Dropping frames is the degradation strategy under load.
//!
//! ## Usage
//!
//! ```rust
//! use tabplay::error::{classify, PlayerError, Recoverable, RecoveryStrategy};
//!
//! let error = PlayerError::PoolExhausted;
//! assert!(classify::is_frame_local(&error));
//! assert_eq!(error.recovery_strategy(), RecoveryStrategy::DropFrame);
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Debug-level errors that don't affect operation
    Debug,
    /// Informational errors
    Info,
    /// Expected degradation, such as a dropped frame
    Warning,
    /// A frame or request failed; playback continues
    Error,
    /// Playback of the current stream cannot proceed
    Critical,
    /// The player cannot start
    Fatal,
}

/// What the caller does after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Discard the incoming frame before it reaches the decoder.
    DropFrame,
    /// Discard a frame that was already in the decode path.
    SkipFrame,
    /// Abandon the current selection and wait for the next one.
    NextSelection,
    /// Reopen the output device and continue.
    ReopenSink,
    /// Stop the program.
    Abort,
}

/// Base error type for the playback core
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The coded frame format is not one this pipeline handles.
    #[error("unsupported {kind} format: {format}")]
    UnsupportedFormat { kind: &'static str, format: String },

    /// No free frame buffer; the producer drops the frame.
    #[error("frame pool exhausted")]
    PoolExhausted,

    /// The coded payload does not fit in a pool buffer.
    #[error("coded frame of {len} bytes exceeds buffer capacity {capacity}")]
    FrameTooLarge { len: usize, capacity: usize },

    /// The image or audio decoder rejected a frame.
    #[error("{codec} decode failed: {reason}")]
    DecodeFailure { codec: &'static str, reason: String },

    /// The media engine could not open or play a file.
    #[error("engine cannot play {}: {reason}", path.display())]
    EngineIo { path: PathBuf, reason: String },

    /// A display or audio sink refused data.
    #[error("{sink} sink error: {reason}")]
    Sink { sink: &'static str, reason: String },

    /// A component failed to start.
    #[error("failed to initialise {component}: {reason}")]
    Init { component: &'static str, reason: String },

    /// A configuration value is out of range.
    #[error("invalid configuration `{field}`: {reason}")]
    Config { field: &'static str, reason: String },

    /// I/O errors
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using our custom error type
pub type PlayerResult<T> = Result<T, PlayerError>;

impl PlayerError {
    pub fn unsupported_video(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            kind: "video",
            format: format.into(),
        }
    }

    pub fn unsupported_audio(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            kind: "audio",
            format: format.into(),
        }
    }

    pub fn decode(codec: &'static str, reason: impl ToString) -> Self {
        Self::DecodeFailure {
            codec,
            reason: reason.to_string(),
        }
    }

    pub fn engine_io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::EngineIo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn sink(sink: &'static str, reason: impl ToString) -> Self {
        Self::Sink {
            sink,
            reason: reason.to_string(),
        }
    }

    pub fn init(component: &'static str, reason: impl ToString) -> Self {
        Self::Init {
            component,
            reason: reason.to_string(),
        }
    }

    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            field,
            reason: reason.into(),
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Short machine-friendly name of the error class.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::PoolExhausted => "pool_exhausted",
            Self::FrameTooLarge { .. } => "frame_too_large",
            Self::DecodeFailure { .. } => "decode_failure",
            Self::EngineIo { .. } => "engine_io",
            Self::Sink { .. } => "sink",
            Self::Init { .. } => "init",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
        }
    }

    /// Writes the error to the log at the level matching its severity.
    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Debug => log::debug!("{}", self),
            ErrorSeverity::Info => log::info!("{}", self),
            ErrorSeverity::Warning => log::warn!("{}", self),
            ErrorSeverity::Error | ErrorSeverity::Critical | ErrorSeverity::Fatal => {
                log::error!("{}", self)
            }
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for PlayerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PoolExhausted => ErrorSeverity::Warning,
            Self::UnsupportedFormat { .. }
            | Self::FrameTooLarge { .. }
            | Self::DecodeFailure { .. }
            | Self::Sink { .. } => ErrorSeverity::Error,
            Self::EngineIo { .. } | Self::Io { .. } => ErrorSeverity::Critical,
            Self::Init { .. } | Self::Config { .. } => ErrorSeverity::Fatal,
        }
    }
}

/// Trait for errors that can be recovered from
pub trait Recoverable {
    /// Check if this error can be recovered from
    fn is_recoverable(&self) -> bool {
        self.recovery_strategy() != RecoveryStrategy::Abort
    }

    /// The single strategy the player applies for this error
    fn recovery_strategy(&self) -> RecoveryStrategy;
}

impl Recoverable for PlayerError {
    fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            Self::UnsupportedFormat { .. } | Self::PoolExhausted | Self::FrameTooLarge { .. } => {
                RecoveryStrategy::DropFrame
            }
            Self::DecodeFailure { .. } => RecoveryStrategy::SkipFrame,
            Self::Sink { .. } => RecoveryStrategy::ReopenSink,
            Self::EngineIo { .. } | Self::Io { .. } => RecoveryStrategy::NextSelection,
            Self::Init { .. } | Self::Config { .. } => RecoveryStrategy::Abort,
        }
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Errors that only cost a single frame
    pub fn is_frame_local(error: &PlayerError) -> bool {
        matches!(
            error.recovery_strategy(),
            RecoveryStrategy::DropFrame | RecoveryStrategy::SkipFrame
        )
    }

    /// Check if an error is fatal (cannot be recovered from)
    pub fn is_fatal(error: &PlayerError) -> bool {
        error.severity() == ErrorSeverity::Fatal
    }

    /// Get error priority (higher numbers = higher priority)
    pub fn priority(error: &PlayerError) -> u8 {
        match error.severity() {
            ErrorSeverity::Debug => 0,
            ErrorSeverity::Info => 1,
            ErrorSeverity::Warning => 2,
            ErrorSeverity::Error => 3,
            ErrorSeverity::Critical => 4,
            ErrorSeverity::Fatal => 5,
        }
    }
}

impl From<std::io::Error> for PlayerError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for PlayerError {
    fn from(error: serde_json::Error) -> Self {
        Self::config("json", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = PlayerError::config("pool_capacity", "must be greater than 0");
        assert_eq!(error.category(), "config");
        assert!(!error.is_recoverable());
        assert_eq!(
            error.to_string(),
            "invalid configuration `pool_capacity`: must be greater than 0"
        );
    }

    #[test]
    fn test_frame_errors_are_not_fatal() {
        for error in [
            PlayerError::unsupported_video("fourcc 0x34363248"),
            PlayerError::PoolExhausted,
            PlayerError::FrameTooLarge {
                len: 10,
                capacity: 4,
            },
            PlayerError::decode("mjpeg", "bad huffman table"),
        ] {
            assert!(classify::is_frame_local(&error), "{}", error);
            assert!(!classify::is_fatal(&error));
            assert!(error.is_recoverable());
        }
    }

    #[test]
    fn test_engine_io_moves_to_next_selection() {
        let error = PlayerError::engine_io("/sd/movie.avi", "no such file");
        assert_eq!(error.recovery_strategy(), RecoveryStrategy::NextSelection);
        assert!(error.to_string().contains("/sd/movie.avi"));
    }

    #[test]
    fn test_error_classification() {
        let init = PlayerError::init("frame pool", "capacity is zero");
        assert!(classify::is_fatal(&init));
        assert_eq!(classify::priority(&init), 5);
        assert_eq!(classify::priority(&PlayerError::PoolExhausted), 2);
    }

    #[test]
    fn test_io_keeps_source() {
        use std::error::Error as _;
        let error = PlayerError::io(
            "open",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(error.source().is_some());
    }
}
