//! # Completion Signal
//!
//! A binary one-shot signal: one context gives, another blocks until it is
//! given. At most one release is pending at a time, so a duplicate `give` before
//! the matching `take` has no extra effect.
//!
//! The coordinator blocks on it between playback sessions; the end-of-stream
//! path gives it.
//!
//! ```rust
//! use std::time::Duration;
//! use tabplay::core::signal::CompletionSignal;
//!
//! let signal = CompletionSignal::new();
//! assert!(signal.give());
//! assert!(!signal.give()); // already pending
//! assert!(signal.take_timeout(Duration::from_millis(10)));
//! assert!(!signal.try_take());
//! ```

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};

/// Cloneable handle to a binary completion signal.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Releases the signal. Returns `false` if a release was already pending.
    pub fn give(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }

    /// Blocks until the signal is released, then consumes the release.
    pub fn take(&self) {
        // Both ends live in `self`, so the channel cannot disconnect here.
        let _ = self.rx.recv();
    }

    /// Like [`take`](Self::take) but gives up after `timeout`.
    pub fn take_timeout(&self, timeout: Duration) -> bool {
        self.rx.recv_timeout(timeout).is_ok()
    }

    /// Consumes a pending release without blocking.
    pub fn try_take(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Discards a pending release, if any.
    pub fn reset(&self) {
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_give_saturates() {
        let signal = CompletionSignal::new();
        assert!(signal.give());
        assert!(!signal.give());
        assert!(signal.try_take());
        assert!(!signal.try_take());
    }

    #[test]
    fn test_take_blocks_until_given() {
        let signal = CompletionSignal::new();
        let giver = signal.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            giver.give();
        });
        signal.take();
        handle.join().unwrap();
        assert!(!signal.is_pending());
    }

    #[test]
    fn test_reset_discards_pending() {
        let signal = CompletionSignal::new();
        signal.give();
        signal.reset();
        assert!(!signal.take_timeout(Duration::from_millis(10)));
    }
}
