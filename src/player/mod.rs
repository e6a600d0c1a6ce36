//! # Player Module
//!
//! Playback state machine and the coordinator that feeds it selections.

pub mod controller;
pub mod coordinator;

pub use controller::{PlaybackController, PlaybackState, PlaybackStatus};
pub use coordinator::{
    ChannelSelections, Coordinator, CoordinatorReport, QueuedSelections, Selection,
    SelectionSource,
};
