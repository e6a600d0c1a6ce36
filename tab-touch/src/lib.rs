// SPDX-License-Identifier: MIT
//! # tab-touch: Gesture Recognition for Single-Pointer Touch Panels
//!
//! This crate turns raw, periodically sampled touch coordinates into discrete UI
//! gestures (tap, long press, long tap, drag, drag end).
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌────────────────────┐    ┌──────────┐
//! │ Touch panel  │───▶│  TouchSource     │───▶│ GestureRecognizer  │───▶│ Listener │
//! │ (interrupt)  │    │  (blocking read) │    │ (state machine)    │    │ (one)    │
//! └──────────────┘    └──────────────────┘    └────────────────────┘    └──────────┘
//!                          touch-poller thread, events delivered synchronously
//! ```
//!
//! ## Key Components
//!
//! - [`gesture`]: the pure state machine (`GestureRecognizer`) and its types
//! - [`dispatch`]: `TouchDispatcher`, the recognizer plus its single listener slot
//! - [`poller`]: the `TouchSource` trait, channel/scripted sources, and the poller thread
//!
//! ## Usage Example
//!
//! ```rust
//! use tab_touch::{GestureEvent, GestureRecognizer, Point};
//!
//! let mut recognizer = GestureRecognizer::new();
//! let p = Point::new(10, 20);
//! assert_eq!(recognizer.feed(&[p]), None);
//! assert_eq!(recognizer.feed(&[]), Some(GestureEvent::Tap(p)));
//! ```

pub mod dispatch;
pub mod gesture;
pub mod poller;

pub use dispatch::TouchDispatcher;
pub use gesture::{GestureEvent, GestureRecognizer, Point, TouchState, LONG_PRESS_TICKS};
pub use poller::{spawn_poller, ChannelTouchSource, ScriptedTouchSource, TouchError, TouchSource};
