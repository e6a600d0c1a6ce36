// SPDX-License-Identifier: MIT
//! # Gesture State Machine
//!
//! Only the first reported contact drives the machine; further contacts of a
//! multi-touch sample are ignored. One call to [`GestureRecognizer::feed`] is one
//! sampling tick.
//!
//! | State | Input | Next state | Event |
//! |-------|-------|------------|-------|
//! | Idle | point | Down(p, 0) | - |
//! | Down(p, d) | same, d < T | Down(p, d+1) | - |
//! | Down(p, d) | same, d >= T | LongDown(p, d+1) | LongPress(p) |
//! | Down(p, _) | other q | Moving(q) | Drag(p -> q) |
//! | Down(p, _) | none | Idle | Tap(p) |
//! | LongDown(p, d) | same | LongDown(p, d+1) | - |
//! | LongDown(p, _) | other q | Moving(q) | Drag(p -> q) |
//! | LongDown(p, _) | none | Idle | LongTap(p) |
//! | Moving(p) | same | Moving(p) | - |
//! | Moving(p) | other q | Moving(q) | Drag(p -> q) |
//! | Moving(p) | none | Idle | DragEnd(p) |
//!
//! `T` is [`LONG_PRESS_TICKS`] unless overridden.

use std::fmt;

/// Default number of stationary ticks before a press becomes a long press.
pub const LONG_PRESS_TICKS: u16 = 15;

/// A contact position in panel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Tracking state of the single logical pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchState {
    Idle,
    /// Contact held still; `duration` counts stationary ticks.
    Down { point: Point, duration: u16 },
    /// Contact held past the long-press threshold.
    LongDown { point: Point, duration: u16 },
    /// Contact has moved at least once since it went down.
    Moving { point: Point },
}

/// Discrete gesture emitted on a state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureEvent {
    Tap(Point),
    LongPress(Point),
    LongTap(Point),
    Drag { from: Point, to: Point },
    DragEnd(Point),
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureEvent::Tap(p) => write!(f, "tap {}", p),
            GestureEvent::LongPress(p) => write!(f, "long press {}", p),
            GestureEvent::LongTap(p) => write!(f, "long tap {}", p),
            GestureEvent::Drag { from, to } => write!(f, "drag {} -> {}", from, to),
            GestureEvent::DragEnd(p) => write!(f, "drag end {}", p),
        }
    }
}

/// Classifies per-tick contact samples into gestures.
///
/// The recognizer is owned by exactly one polling loop and is never shared,
/// so it carries no synchronization.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    state: TouchState,
    long_press_ticks: u16,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::with_long_press_ticks(LONG_PRESS_TICKS)
    }

    /// Creates a recognizer with a custom long-press threshold.
    pub fn with_long_press_ticks(long_press_ticks: u16) -> Self {
        Self {
            state: TouchState::Idle,
            long_press_ticks,
        }
    }

    pub fn state(&self) -> TouchState {
        self.state
    }

    pub fn long_press_ticks(&self) -> u16 {
        self.long_press_ticks
    }

    /// Advances the machine by one tick.
    ///
    /// `contacts` is the full multi-touch sample; only `contacts[0]` matters.
    /// Returns the gesture emitted by this transition, if any.
    pub fn feed(&mut self, contacts: &[Point]) -> Option<GestureEvent> {
        let first = contacts.first().copied();
        let (next, event) = match (self.state, first) {
            (TouchState::Idle, Some(p)) => (TouchState::Down { point: p, duration: 0 }, None),
            (TouchState::Idle, None) => (TouchState::Idle, None),

            (TouchState::Down { point, duration }, Some(p)) if p == point => {
                if duration < self.long_press_ticks {
                    (
                        TouchState::Down {
                            point,
                            duration: duration.saturating_add(1),
                        },
                        None,
                    )
                } else {
                    (
                        TouchState::LongDown {
                            point,
                            duration: duration.saturating_add(1),
                        },
                        Some(GestureEvent::LongPress(point)),
                    )
                }
            }
            (TouchState::Down { point, .. }, Some(p)) => (
                TouchState::Moving { point: p },
                Some(GestureEvent::Drag { from: point, to: p }),
            ),
            (TouchState::Down { point, .. }, None) => {
                (TouchState::Idle, Some(GestureEvent::Tap(point)))
            }

            (TouchState::LongDown { point, duration }, Some(p)) if p == point => (
                TouchState::LongDown {
                    point,
                    duration: duration.saturating_add(1),
                },
                None,
            ),
            (TouchState::LongDown { point, .. }, Some(p)) => (
                TouchState::Moving { point: p },
                Some(GestureEvent::Drag { from: point, to: p }),
            ),
            (TouchState::LongDown { point, .. }, None) => {
                (TouchState::Idle, Some(GestureEvent::LongTap(point)))
            }

            (TouchState::Moving { point }, Some(p)) if p == point => {
                (TouchState::Moving { point }, None)
            }
            (TouchState::Moving { point }, Some(p)) => (
                TouchState::Moving { point: p },
                Some(GestureEvent::Drag { from: point, to: p }),
            ),
            (TouchState::Moving { point }, None) => {
                (TouchState::Idle, Some(GestureEvent::DragEnd(point)))
            }
        };
        self.state = next;
        event
    }

    /// Drops any in-progress contact without emitting an event.
    pub fn reset(&mut self) {
        self.state = TouchState::Idle;
    }
}
