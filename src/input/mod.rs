//! # Gesture Controls
//!
//! Maps touch gestures to playback actions:
//!
//! | Gesture    | Action                         |
//! |------------|--------------------------------|
//! | tap        | toggle pause / resume          |
//! | long tap   | stop the current stream        |
//! | long press | none (reported while held)     |
//! | drag       | none                           |

use std::sync::Arc;

use tab_touch::GestureEvent;

use crate::engine::MediaEngine;
use crate::player::{PlaybackController, PlaybackState};

/// What a gesture did to playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Paused,
    Resumed,
    Stopped,
    Ignored,
}

pub struct GestureControls<E> {
    controller: Arc<PlaybackController<E>>,
}

impl<E: MediaEngine> GestureControls<E> {
    pub fn new(controller: Arc<PlaybackController<E>>) -> Self {
        Self { controller }
    }

    pub fn handle(&self, event: GestureEvent) -> ControlAction {
        match event {
            GestureEvent::Tap(_) => match self.controller.state() {
                PlaybackState::Playing if self.controller.pause() => ControlAction::Paused,
                PlaybackState::Paused if self.controller.resume() => ControlAction::Resumed,
                _ => ControlAction::Ignored,
            },
            GestureEvent::LongTap(_) => {
                if self.controller.state() == PlaybackState::Stopped {
                    return ControlAction::Ignored;
                }
                match self.controller.stop() {
                    Ok(()) => ControlAction::Stopped,
                    Err(e) => {
                        e.log();
                        ControlAction::Ignored
                    }
                }
            }
            GestureEvent::LongPress(point) => {
                log::debug!("long press held at {}", point);
                ControlAction::Ignored
            }
            GestureEvent::Drag { .. } | GestureEvent::DragEnd(_) => ControlAction::Ignored,
        }
    }
}

impl<E: MediaEngine + 'static> GestureControls<E> {
    /// Closure for [`tab_touch::TouchDispatcher::set_listener`].
    pub fn into_listener(self) -> impl FnMut(GestureEvent) + Send + 'static {
        move |event| {
            let action = self.handle(event);
            if action != ControlAction::Ignored {
                log::info!("{} -> {:?}", event, action);
            }
        }
    }
}
