//! # Configuration Module
//!
//! This module provides the player configuration passed to every component.

pub mod config;

pub use config::{FrameLimit, PanelConfig, PlayerConfig};
