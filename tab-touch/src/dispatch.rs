// SPDX-License-Identifier: MIT
//! Gesture recognizer bound to a single event listener.

use crate::gesture::{GestureEvent, GestureRecognizer, Point};

type Listener = Box<dyn FnMut(GestureEvent) + Send>;

/// Owns the recognizer and at most one gesture listener.
///
/// Registering a new listener replaces the previous one. Events are delivered
/// synchronously on whichever thread calls [`TouchDispatcher::dispatch`].
pub struct TouchDispatcher {
    recognizer: GestureRecognizer,
    listener: Option<Listener>,
}

impl Default for TouchDispatcher {
    fn default() -> Self {
        Self::new(GestureRecognizer::new())
    }
}

impl TouchDispatcher {
    pub fn new(recognizer: GestureRecognizer) -> Self {
        Self {
            recognizer,
            listener: None,
        }
    }

    /// Replaces the registered listener.
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(GestureEvent) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Feeds one sample and forwards any resulting gesture.
    ///
    /// The event is returned as well, whether or not a listener consumed it.
    pub fn dispatch(&mut self, contacts: &[Point]) -> Option<GestureEvent> {
        let event = self.recognizer.feed(contacts)?;
        log::debug!("gesture: {}", event);
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
        Some(event)
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_listener_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut dispatcher = TouchDispatcher::default();
        dispatcher.set_listener(move |e| sink.lock().unwrap().push(e));

        let p = Point::new(2, 3);
        dispatcher.dispatch(&[p]);
        dispatcher.dispatch(&[]);

        assert_eq!(*seen.lock().unwrap(), vec![GestureEvent::Tap(p)]);
    }

    #[test]
    fn test_second_listener_replaces_first() {
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));
        let mut dispatcher = TouchDispatcher::default();

        let f = Arc::clone(&first);
        dispatcher.set_listener(move |_| *f.lock().unwrap() += 1);
        let s = Arc::clone(&second);
        dispatcher.set_listener(move |_| *s.lock().unwrap() += 1);

        let p = Point::new(0, 0);
        dispatcher.dispatch(&[p]);
        dispatcher.dispatch(&[]);

        assert_eq!(*first.lock().unwrap(), 0);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn test_dispatch_without_listener_still_reports() {
        let mut dispatcher = TouchDispatcher::default();
        let p = Point::new(4, 4);
        assert!(!dispatcher.has_listener());
        assert_eq!(dispatcher.dispatch(&[p]), None);
        assert_eq!(dispatcher.dispatch(&[]), Some(GestureEvent::Tap(p)));
    }
}
